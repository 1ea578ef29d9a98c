use anyhow::Result;
use clap::Args;
use lims_api::LimsClient;
use lims_core::Element;
use log::debug;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Resource URI, absolute or relative to the API root (e.g. /samples/S1)
    pub uri: String,
}

pub fn handle_get(client: &LimsClient, args: &GetArgs) -> Result<Element> {
    debug!("Fetching {}", args.uri);
    Ok(client.get(&args.uri)?)
}
