use super::put::read_resource;
use anyhow::Result;
use clap::Args;
use lims_api::LimsClient;
use lims_core::Element;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PostArgs {
    /// XML file holding the new resource
    pub file: PathBuf,

    /// Target collection; derived from the resource namespace when omitted
    #[arg(long)]
    pub collection: Option<String>,
}

pub fn handle_post(client: &LimsClient, args: &PostArgs) -> Result<Element> {
    let resource = read_resource(&args.file)?;
    Ok(client.add_new(&resource, args.collection.as_deref())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use std::fs;

    #[test]
    fn test_post_infers_collection() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("project.xml");
        fs::write(
            &file,
            r#"<prj:project xmlns:prj="http://genologics.com/ri/project"><name>P</name></prj:project>"#,
        )
        .unwrap();

        let (client, transport) = testing::client(r#"<prj:project xmlns:prj="http://genologics.com/ri/project" limsid="P1"/>"#);
        let created = handle_post(
            &client,
            &PostArgs {
                file,
                collection: None,
            },
        )
        .unwrap();
        assert_eq!(created.get("limsid"), Some("P1"));
        assert_eq!(
            transport.requests.lock().unwrap()[0].url,
            "http://lims:8080/api/v2/projects"
        );
    }
}
