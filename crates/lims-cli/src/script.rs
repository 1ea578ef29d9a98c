use crate::config::Config;
use crate::epp::{EppArgs, ProcessErrorFlagger};
use crate::logging::{init_logging, Logging};
use crate::session::SessionArgs;
use crate::severity::Severity;
use crate::Result;
use chrono::Local;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use lims_api::{ApiError, LimsClient};
use lims_utils::{host_name, run_command, MailMessage, Mailer, SendmailMailer};
use log::{error, info, warn};
use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Capabilities an argument type opts into.
///
/// Implement `session` for scripts that talk to the LIMS and `epp` for
/// scripts launched by a process step.
pub trait ScriptArgs {
    fn session(&self) -> Option<&SessionArgs> {
        None
    }

    fn epp(&self) -> Option<&EppArgs> {
        None
    }
}

/// What a script is exiting with, as seen by exit hooks
#[derive(Debug, Clone, Copy)]
pub struct ExitContext<'a> {
    pub message: &'a str,
    pub severity: Severity,
    pub code: i32,
    pub client: Option<&'a LimsClient>,
}

impl ExitContext<'_> {
    pub fn is_failure(&self) -> bool {
        self.code != 0 || self.severity.is_failure()
    }
}

/// Trait for work that must happen on every controlled exit.
///
/// Hooks run after the exit message is logged and mailed. They must not
/// fail the exit themselves; problems are logged.
pub trait ExitHook {
    fn on_exit(&self, context: &ExitContext<'_>);
}

/// Options for `Script::shell_execute`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Split the command line into words instead of running it through `sh -c`
    pub split: bool,
    /// Exit with code 3 when the command writes to stderr
    pub stderr_exit: bool,
    /// Mail the exit message if the command causes an exit
    pub email: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            split: true,
            stderr_exit: true,
            email: false,
        }
    }
}

/// A command-line script with logging, mail notification and a controlled
/// exit path
pub struct Script {
    description: String,
    name: String,
    command_line: String,
    config: Config,
    mailer: Box<dyn Mailer>,
    exit_hooks: Vec<Box<dyn ExitHook>>,
    client: Option<LimsClient>,
    logging: Option<Logging>,
}

impl Script {
    /// Create a script with default configuration and no logging installed
    pub fn new(description: impl Into<String>) -> Self {
        let argv: Vec<String> = std::env::args().collect();
        let name = argv
            .first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());

        Self {
            description: description.into(),
            name,
            command_line: argv.join(" "),
            config: Config::default(),
            mailer: Box::new(SendmailMailer::default()),
            exit_hooks: Vec::new(),
            client: None,
            logging: None,
        }
    }

    /// Load the user configuration and install logging
    pub fn from_env(description: impl Into<String>) -> Result<Self> {
        let config = Config::load()?;
        let logging = init_logging(config.log.file.as_deref())?;
        let mut script = Self::new(description).with_config(config);
        script.logging = Some(logging);
        Ok(script)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_mailer(mut self, mailer: impl Mailer + 'static) -> Self {
        self.mailer = Box::new(mailer);
        self
    }

    pub fn with_exit_hook(mut self, hook: impl ExitHook + 'static) -> Self {
        self.exit_hooks.push(Box::new(hook));
        self
    }

    pub fn with_client(mut self, client: LimsClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.config.log.file.as_deref()
    }

    pub fn client(&self) -> Option<&LimsClient> {
        self.client.as_ref()
    }

    /// The registered client, or `NotRegistered`
    pub fn require_client(&self) -> Result<&LimsClient> {
        self.client
            .as_ref()
            .ok_or_else(|| ApiError::NotRegistered.into())
    }

    /// Register with `server` and keep the client for later requests
    pub fn register(&mut self, server: &str, auth_file: &str) -> Result<&LimsClient> {
        let client = LimsClient::register(server, auth_file)?;
        Ok(&*self.client.insert(client))
    }

    /// Parse the process arguments, exiting with code 2 on help or usage
    /// errors
    pub fn parse_args<A>(&mut self) -> A
    where
        A: Parser + ScriptArgs,
    {
        self.parse_args_from(std::env::args_os())
    }

    pub fn parse_args_from<A, I, T>(&mut self, args: I) -> A
    where
        A: Parser + ScriptArgs,
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = match self.try_parse_args_from::<A, _, _>(args) {
            Ok(args) => args,
            Err(e) => {
                let severity = if is_informational(e.kind()) {
                    Severity::Info
                } else {
                    Severity::Error
                };
                self.exit(e.to_string().trim_end(), severity, 2, false)
            }
        };

        if let Err(e) = self.configure(&args) {
            self.exit(&e.to_string(), Severity::Critical, 2, false)
        }
        args
    }

    /// Parse without exiting; the script description fills in `about` when
    /// the argument type has none
    pub fn try_parse_args_from<A, I, T>(&self, args: I) -> std::result::Result<A, clap::Error>
    where
        A: Parser,
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = <A as CommandFactory>::command();
        if command.get_about().is_none() && !self.description.is_empty() {
            command = command.about(self.description.clone());
        }
        let matches = command.try_get_matches_from(args)?;
        <A as FromArgMatches>::from_arg_matches(&matches)
    }

    /// Apply the capabilities exposed by parsed arguments.
    ///
    /// `--debug` raises library logging, an EPP process URI installs the
    /// error flagging hook, and a configured server (or the process URI's
    /// host) is registered.
    pub fn configure<A: ScriptArgs>(&mut self, args: &A) -> Result<()> {
        let session = args.session();
        let epp = args.epp();

        if session.is_some_and(|s| s.debug) {
            self.enable_library_debug()?;
        }

        if let Some(epp) = epp {
            self.exit_hooks.push(Box::new(ProcessErrorFlagger::new(
                epp.process_uri.clone(),
                self.command_line.clone(),
            )));
        }

        if self.client.is_some() || (session.is_none() && epp.is_none()) {
            return Ok(());
        }

        let server = match session.and_then(|s| s.server.clone()) {
            Some(server) => Some(server),
            None => match (self.config.server(), epp) {
                (Some(server), _) => Some(server.to_string()),
                (None, Some(epp)) => Some(epp.server()?),
                (None, None) => None,
            },
        };

        if let Some(server) = server {
            let auth_file = session
                .and_then(|s| s.auth_file.clone())
                .unwrap_or_else(|| self.config.auth_file().to_string());
            self.register(&server, &auth_file)?;
        }
        Ok(())
    }

    /// Run a command and return its stdout.
    ///
    /// Exits with code 2 when the command cannot be started and with code 3
    /// when it writes to stderr, unless `stderr_exit` is off.
    pub fn shell_execute(&self, command: &str, options: ShellOptions) -> Vec<u8> {
        info!("{}", command);
        let output = match run_command(command, options.split) {
            Ok(output) => output,
            Err(e) => self.exit(&e.to_string(), Severity::Critical, 2, options.email),
        };

        if output.has_stderr() {
            let stderr = output.stderr_text();
            if options.stderr_exit {
                self.exit(&stderr, Severity::Critical, 3, options.email);
            }
            warn!("{}", stderr);
        }
        output.stdout
    }

    /// Mail the configured recipients; skipped with a warning when either
    /// sender or recipients are missing
    pub fn email(&self, subject: &str, body: &str) -> Result<()> {
        let from = self.config.mail.from.as_deref().filter(|f| !f.is_empty());
        let Some(from) = from else {
            warn!("No email sender specified. Mail not sent.");
            return Ok(());
        };
        if self.config.mail.to.is_empty() {
            warn!("No email recipients specified. Mail not sent.");
            return Ok(());
        }

        let message = MailMessage {
            from: from.to_string(),
            to: self.config.mail.to.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        self.mailer.send(&message)?;
        Ok(())
    }

    /// Returns whether library logging was raised
    fn enable_library_debug(&self) -> Result<bool> {
        match &self.logging {
            Some(logging) => {
                logging.set_library_debug()?;
                Ok(true)
            }
            None => {
                warn!("--debug ignored: logging was not initialised by this script");
                Ok(false)
            }
        }
    }

    /// Everything `exit` does short of terminating the process
    pub fn prepare_exit(&self, message: &str, severity: Severity, code: i32, email: bool) {
        severity.log(message);

        if email {
            let status = if code == 0 { "SUCCESS" } else { "FAILURE" };
            let subject = format!("{} {} {}", host_name(), self.name, status);
            let mut body = format!(
                "{}\n{}\n",
                message,
                Local::now().format("%Y.%m.%d:%H:%M:%S")
            );
            if let Some(path) = self.log_file() {
                body.push_str(&format!("\nlog at {}\n", absolute(path).display()));
            }
            if let Err(e) = self.email(&subject, &body) {
                error!("Failed to send exit notification: {}", e);
            }
        }

        let context = ExitContext {
            message,
            severity,
            code,
            client: self.client.as_ref(),
        };
        for hook in &self.exit_hooks {
            hook.on_exit(&context);
        }
    }

    /// Log, optionally mail, run exit hooks and terminate with `code`
    pub fn exit(&self, message: &str, severity: Severity, code: i32, email: bool) -> ! {
        self.prepare_exit(message, severity, code, email);
        std::process::exit(code)
    }

    /// Unwrap `result`, turning an error into a critical exit with code 2
    pub fn exit_on_error<T, E: Display>(&self, result: std::result::Result<T, E>, email: bool) -> T {
        match result {
            Ok(value) => value,
            Err(e) => self.exit(&e.to_string(), Severity::Critical, 2, email),
        }
    }
}

fn is_informational(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
