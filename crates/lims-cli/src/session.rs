use clap::Args;

/// Arguments shared by every script that talks to the LIMS
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionArgs {
    /// Turn on debugging output from the LIMS client libraries
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// LIMS server to register with (overrides the configured server)
    #[arg(long)]
    pub server: Option<String>,

    /// Credentials file (overrides the configured path)
    #[arg(long = "auth-file", value_name = "FILE")]
    pub auth_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        session: SessionArgs,
    }

    #[test]
    fn test_debug_flag() {
        let cli = Cli::try_parse_from(["script", "-d"]).unwrap();
        assert!(cli.session.debug);

        let cli = Cli::try_parse_from(["script", "--debug", "--server", "lims"]).unwrap();
        assert!(cli.session.debug);
        assert_eq!(cli.session.server.as_deref(), Some("lims"));

        let cli = Cli::try_parse_from(["script"]).unwrap();
        assert_eq!(cli.session, SessionArgs::default());
    }
}
