use sysinfo::System;

/// Name of the machine the script runs on, `localhost` when unknown
pub fn host_name() -> String {
    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
