use anyhow::{Context, Result};
use clap::Args;
use lims_api::LimsClient;
use lims_core::Element;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct PutArgs {
    /// XML file holding the resource; it is sent to its own uri attribute
    pub file: PathBuf,
}

pub fn handle_put(client: &LimsClient, args: &PutArgs) -> Result<Element> {
    let resource = read_resource(&args.file)?;
    Ok(client.update(&resource)?)
}

/// Parse an XML resource from disk
pub fn read_resource(path: &Path) -> Result<Element> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Element::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use lims_api::Method;

    #[test]
    fn test_put_uses_resource_uri() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sample.xml");
        fs::write(
            &file,
            r#"<smp:sample xmlns:smp="http://genologics.com/ri/sample" uri="http://lims:8080/api/v2/samples/S1"><name>renamed</name></smp:sample>"#,
        )
        .unwrap();

        let (client, transport) = testing::client("<ok/>");
        handle_put(&client, &PutArgs { file }).unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, "http://lims:8080/api/v2/samples/S1");
    }

    #[test]
    fn test_missing_file_has_context() {
        let (client, _) = testing::client("<ok/>");
        let err = handle_put(
            &client,
            &PutArgs {
                file: PathBuf::from("/nonexistent/sample.xml"),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sample.xml"));
    }
}
