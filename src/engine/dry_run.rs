//! File-backed collaborators for running the pipeline without privileges.
//!
//! [`FileRoutingEngine`] serves running info from a JSON file on disk and
//! [`DryRunTunnel`] logs settings instead of installing them.

use super::collaborator::{PacketTunnel, RoutingEngine};
use crate::models::DesiredSettings;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

/// Routing engine stand-in that reads running info from a file.
pub struct FileRoutingEngine {
    path: PathBuf,
    bound_fd: Mutex<Option<i32>>,
}

impl FileRoutingEngine {
    pub fn new(path: impl Into<PathBuf>) -> FileRoutingEngine {
        FileRoutingEngine {
            path: path.into(),
            bound_fd: Mutex::new(None),
        }
    }

    /// Modification time of the facts file, used to detect changes.
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    pub fn bound_fd(&self) -> Option<i32> {
        self.bound_fd.lock().ok().and_then(|fd| *fd)
    }
}

impl RoutingEngine for FileRoutingEngine {
    fn running_info(&self) -> Result<String, String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| format!("Error reading facts file {}: {e}", self.path.display()))
    }

    fn set_tun_fd(&self, fd: i32) -> Result<(), String> {
        let mut bound = self
            .bound_fd
            .lock()
            .map_err(|_| "tun fd lock poisoned".to_string())?;
        log::info!("Engine bound to tun fd {fd} (was {:?})", *bound);
        *bound = Some(fd);
        Ok(())
    }
}

/// Tunnel stand-in that records the settings instead of installing them.
pub struct DryRunTunnel {
    fd: i32,
    last: Mutex<Option<DesiredSettings>>,
}

impl DryRunTunnel {
    pub fn new(fd: i32) -> DryRunTunnel {
        DryRunTunnel {
            fd,
            last: Mutex::new(None),
        }
    }

    pub fn last_settings(&self) -> Option<DesiredSettings> {
        self.last.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl PacketTunnel for DryRunTunnel {
    async fn apply_settings(&self, settings: &DesiredSettings) -> Result<(), String> {
        let json = serde_json::to_string(settings).map_err(|e| e.to_string())?;
        log::info!("[dry-run] would apply {json}");
        let mut last = self
            .last
            .lock()
            .map_err(|_| "settings lock poisoned".to_string())?;
        *last = Some(settings.clone());
        Ok(())
    }

    fn tun_fd(&self) -> Option<i32> {
        Some(self.fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ipv4Settings, RunningInfo, TunnelOptions};
    use crate::processing::build_settings;
    use std::net::Ipv4Addr;

    #[test]
    fn test_file_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        let engine = FileRoutingEngine::new(&path);
        assert!(engine.running_info().is_err());
        assert!(engine.modified().is_none());

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(engine.running_info().unwrap(), "{}");
        assert!(engine.modified().is_some());

        engine.set_tun_fd(9).unwrap();
        assert_eq!(engine.bound_fd(), Some(9));
    }

    #[tokio::test]
    async fn test_dry_run_tunnel_records() {
        let tunnel = DryRunTunnel::new(4);
        let settings = DesiredSettings {
            ipv4: Ipv4Settings {
                address: Ipv4Addr::new(10, 0, 0, 2),
                subnet_mask: "255.255.255.0".into(),
                included_routes: vec![],
            },
            ipv6: None,
            dns: None,
            mtu: 1380,
        };
        tunnel.apply_settings(&settings).await.unwrap();
        assert_eq!(tunnel.last_settings(), Some(settings));
        assert_eq!(tunnel.tun_fd(), Some(4));
    }

    #[tokio::test]
    async fn test_file_engine_feeds_builder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        std::fs::write(
            &path,
            r#"{"my_node_info":{"virtual_ipv4":{"address":"10.9.0.3","network_length":16}}}"#,
        )
        .unwrap();
        let engine = FileRoutingEngine::new(&path);
        let facts = RunningInfo::from_json(&engine.running_info().unwrap()).unwrap();
        let settings = build_settings(&facts, &TunnelOptions::default()).unwrap();
        assert_eq!(settings.ipv4.subnet_mask, "255.255.0.0");
    }
}
