use lims_api::LimsClient;

/// One-line summary of the registered endpoint
pub fn handle_version(client: &LimsClient) -> String {
    match client.api_version() {
        Some(version) => format!("{} (API {})", client.base_uri(), version),
        None => format!("{} (API version unknown)", client.base_uri()),
    }
}
