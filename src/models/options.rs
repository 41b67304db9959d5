//! Static per-session tunnel options.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Options the host hands to the tunnel process when it starts a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TunnelOptions {
    /// Statically configured device address, e.g. `10.126.126.1/24`.
    #[serde(default)]
    pub ipv4: Option<String>,
    /// Device IPv6 address with prefix, e.g. `fd00::1/64`.
    #[serde(default)]
    pub ipv6: Option<String>,
    /// Manual route list. When non-empty it replaces discovered routes.
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default = "default_true")]
    pub enable_encryption: bool,
    #[serde(default)]
    pub enable_magic_dns: bool,
    /// DNS override servers; capture all DNS traffic when set.
    #[serde(default)]
    pub dns_servers: Vec<String>,
    /// Log file served by the "export logs" host command.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for TunnelOptions {
    fn default() -> Self {
        TunnelOptions {
            ipv4: None,
            ipv6: None,
            routes: vec![],
            mtu: None,
            enable_encryption: default_true(),
            enable_magic_dns: false,
            dns_servers: vec![],
            log_file: None,
        }
    }
}

impl TunnelOptions {
    /// Read options from a JSON file.
    ///
    /// # Returns
    /// * `Ok(TunnelOptions)` - the parsed options
    /// * `Err` - if the file is missing or not valid options JSON
    pub fn load(path: impl AsRef<Path>) -> Result<TunnelOptions, Box<dyn Error>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(format!("Options file does not exist: {}", path.display()).into());
        }
        log::info!("Reading options file: {}", path.display());
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading options file {}: {e}", path.display()))?;
        TunnelOptions::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<TunnelOptions, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let options: TunnelOptions = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing options JSON: path={} error={}", e.path(), e))?;
        Ok(options)
    }
}
