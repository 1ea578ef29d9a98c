use lims_cli::{Script, Severity};
use lims_rs::cli::{run_cli, Cli};
use lims_rs::display::print_error;

fn main() {
    let mut script = match Script::from_env("Query and update a LIMS through its REST API") {
        Ok(script) => script,
        Err(e) => {
            print_error(&format!("Error: {}", e));
            std::process::exit(2);
        }
    };

    let cli: Cli = script.parse_args();

    match run_cli(&script, &cli) {
        Ok(()) => script.exit(
            &format!("lims {} completed", cli.command.name()),
            Severity::Debug,
            0,
            cli.email,
        ),
        Err(e) => {
            print_error(&format!("Error: {:#}", e));
            script.exit(&format!("{:#}", e), Severity::Critical, 2, cli.email)
        }
    }
}
