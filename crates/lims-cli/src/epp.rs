use crate::script::{ExitContext, ExitHook};
use crate::{CliError, Result};
use chrono::Local;
use clap::Args;
use lims_api::LimsClient;
use lims_core::Element;
use lims_utils::host_name;
use log::{debug, error, info, warn};
use url::Url;

/// Flag type the LIMS shows as "External Program Error"
const ERROR_FLAG_PATH: &str = r#"artifact-flag[@typeID="-1"]"#;

/// Positional argument of a script launched by a process step
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EppArgs {
    /// URI of the process invoking this script
    #[arg(value_name = "PROCESS_URI")]
    pub process_uri: String,
}

impl EppArgs {
    /// Host part of the process URI, used when no server is configured
    pub fn server(&self) -> Result<String> {
        let url = Url::parse(&self.process_uri)
            .map_err(|e| CliError::InvalidProcessUri(format!("{}: {}", self.process_uri, e)))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| CliError::InvalidProcessUri(self.process_uri.clone()))
    }
}

/// Exit hook that raises an error flag on every output of the invoking
/// process when a script fails
#[derive(Debug, Clone)]
pub struct ProcessErrorFlagger {
    process_uri: String,
    command_line: String,
}

impl ProcessErrorFlagger {
    pub fn new(process_uri: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            process_uri: process_uri.into(),
            command_line: command_line.into(),
        }
    }

    /// Flag the process outputs with `message` and return the updated URIs
    pub fn flag_outputs(&self, client: &LimsClient, message: &str) -> Result<Vec<String>> {
        let now = Local::now();
        let password = &client.session().credentials().password;
        let note = format!(
            "Oops...\r\n{} -- {}\n{}\n{}",
            host_name(),
            now.format("%Y-%m-%d:%H:%M:%S"),
            redact(&self.command_line, password),
            message
        );
        let date = now.format("%Y-%m-%d").to_string();
        let service = service_uri(&self.process_uri);

        let process = client.get(&self.process_uri)?;
        let mut output_uris: Vec<&str> = Vec::new();
        for output in process.find_all(".//output")? {
            if let Some(uri) = output.get("uri") {
                if !output_uris.contains(&uri) {
                    output_uris.push(uri);
                }
            }
        }
        if output_uris.is_empty() {
            debug!("Process {} has no outputs to flag", self.process_uri);
            return Ok(Vec::new());
        }

        let mut outputs = client.batch_retrieve(&output_uris)?;
        for output in &mut outputs {
            flag_artifact(output, service, &date, &note)?;
        }
        Ok(client.batch_update(&outputs)?)
    }
}

impl ExitHook for ProcessErrorFlagger {
    fn on_exit(&self, context: &ExitContext<'_>) {
        if !context.is_failure() {
            return;
        }
        let Some(client) = context.client else {
            warn!(
                "No LIMS session registered; outputs of {} were not flagged",
                self.process_uri
            );
            return;
        };
        match self.flag_outputs(client, context.message) {
            Ok(updated) => info!("Flagged {} outputs of {}", updated.len(), self.process_uri),
            Err(e) => error!("Failed to flag outputs of {}: {}", self.process_uri, e),
        }
    }
}

/// Add the error flag to an artifact, or extend the note of an existing one
pub fn flag_artifact(
    artifact: &mut Element,
    service_uri: &str,
    date: &str,
    note: &str,
) -> Result<()> {
    match artifact.find_mut(ERROR_FLAG_PATH)? {
        Some(flag) => {
            match flag.child_mut("note") {
                Some(existing) => {
                    let text = format!("{}\r\n{}", existing.text().unwrap_or_default(), note);
                    existing.set_text(Some(text));
                }
                None => {
                    flag.sub_element("note", Some(note), &[]);
                }
            }
            match flag.child_mut("last-modified-date") {
                Some(modified) => modified.set_text(Some(date.to_string())),
                None => {
                    flag.sub_element("last-modified-date", Some(date), &[]);
                }
            }
        }
        None => {
            let creator = format!("{}/researchers/1", service_uri);
            let flag = artifact.sub_element(
                "artifact-flag",
                None,
                &[("name", "External Program Error"), ("typeID", "-1")],
            );
            flag.sub_element("creator", None, &[("uri", creator.as_str())]);
            flag.sub_element("last-modified-date", Some(date), &[]);
            flag.sub_element("note", Some(note), &[]);
        }
    }
    Ok(())
}

/// API root of a process URI: everything before `/processes/<id>`
fn service_uri(process_uri: &str) -> &str {
    process_uri
        .rsplitn(3, '/')
        .last()
        .unwrap_or(process_uri)
}

fn redact(command_line: &str, password: &str) -> String {
    if password.is_empty() {
        command_line.to_string()
    } else {
        command_line.replace(password, "****")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        epp: EppArgs,
    }

    #[test]
    fn test_process_uri_is_required() {
        assert!(Cli::try_parse_from(["script"]).is_err());
        let cli =
            Cli::try_parse_from(["script", "http://lims:8080/api/v2/processes/24-1"]).unwrap();
        assert_eq!(cli.epp.server().unwrap(), "lims");
    }

    #[test]
    fn test_service_uri() {
        assert_eq!(
            service_uri("http://lims:8080/api/v2/processes/24-1"),
            "http://lims:8080/api/v2"
        );
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("run.sh --password hunter2 uri", "hunter2"),
            "run.sh --password **** uri"
        );
        assert_eq!(redact("run.sh uri", ""), "run.sh uri");
    }

    #[test]
    fn test_new_flag() {
        let mut artifact = Element::new("art:artifact").attr("limsid", "A1");
        flag_artifact(&mut artifact, "http://lims:8080/api/v2", "2024-03-01", "Oops...\r\nboom")
            .unwrap();

        let flag = artifact.find(ERROR_FLAG_PATH).unwrap().unwrap();
        assert_eq!(flag.get("name"), Some("External Program Error"));
        assert_eq!(
            flag.child("creator").and_then(|c| c.get("uri")),
            Some("http://lims:8080/api/v2/researchers/1")
        );
        assert_eq!(
            flag.child("last-modified-date").and_then(|d| d.text()),
            Some("2024-03-01")
        );
        assert_eq!(flag.child("note").and_then(|n| n.text()), Some("Oops...\r\nboom"));
    }

    #[test]
    fn test_existing_flag_is_extended() {
        let mut artifact = Element::new("art:artifact");
        flag_artifact(&mut artifact, "http://lims/api/v2", "2024-03-01", "first").unwrap();
        flag_artifact(&mut artifact, "http://lims/api/v2", "2024-03-02", "second").unwrap();

        let flags = artifact.find_all("artifact-flag").unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(
            flags[0].child("note").and_then(|n| n.text()),
            Some("first\r\nsecond")
        );
        assert_eq!(
            flags[0].child("last-modified-date").and_then(|d| d.text()),
            Some("2024-03-02")
        );
    }

    #[test]
    fn test_other_flag_types_are_left_alone() {
        let mut artifact = Element::new("art:artifact");
        artifact.sub_element("artifact-flag", None, &[("typeID", "7")]);
        flag_artifact(&mut artifact, "http://lims/api/v2", "2024-03-01", "note").unwrap();
        assert_eq!(artifact.find_all("artifact-flag").unwrap().len(), 2);
    }
}
