//! Running info reported by the mesh routing engine.
//!
//! Only the fields the settings builder needs are modelled; everything else in
//! the record is ignored. Missing fields default to empty.

use super::Ipv4Cidr;
use serde::{Deserialize, Serialize};

/// Live facts about the mesh: our own address and what peers proxy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RunningInfo {
    #[serde(default)]
    pub my_node_info: Option<MyNodeInfo>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MyNodeInfo {
    #[serde(default)]
    pub virtual_ipv4: Option<VirtualIpv4>,
}

/// Address assigned to this node, as the engine reports it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VirtualIpv4 {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub network_length: u32,
}

/// One peer route entry.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Route {
    #[serde(default)]
    pub proxy_cidrs: Vec<String>,
}

impl RunningInfo {
    /// Decode the engine's JSON record.
    ///
    /// # Returns
    /// * `Ok(RunningInfo)` - the decoded facts
    /// * `Err(String)` - the JSON path that failed and why
    pub fn from_json(json: &str) -> Result<RunningInfo, String> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing running info: path={} error={}", e.path(), e))
    }

    /// Like [`RunningInfo::from_json`] but never fails; bad input yields empty facts.
    pub fn from_json_lossy(json: &str) -> RunningInfo {
        RunningInfo::from_json(json).unwrap_or_else(|e| {
            log::warn!("{e}; continuing with empty facts");
            RunningInfo::default()
        })
    }

    /// Address block assigned to this node at runtime, if it parses.
    pub fn virtual_ipv4(&self) -> Option<Ipv4Cidr> {
        let v4 = self.my_node_info.as_ref()?.virtual_ipv4.as_ref()?;
        if v4.address.is_empty() {
            return None;
        }
        let mask = match u8::try_from(v4.network_length) {
            Ok(mask) => mask,
            Err(_) => {
                log::warn!(
                    "Ignoring virtual_ipv4 {} with network_length {}",
                    v4.address,
                    v4.network_length
                );
                return None;
            }
        };
        let text = format!("{}/{}", v4.address, mask);
        match Ipv4Cidr::new(&text) {
            Ok(cidr) => Some(cidr),
            Err(e) => {
                log::warn!("Ignoring virtual_ipv4: {e}");
                None
            }
        }
    }

    /// Every proxy CIDR advertised by any peer, unparsed.
    pub fn proxy_cidrs(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .flat_map(|r| r.proxy_cidrs.iter().map(String::as_str))
    }
}
