//! Seams to the components this crate drives but does not implement.

use crate::models::DesiredSettings;
use async_trait::async_trait;

/// The mesh routing engine.
///
/// Calls are cheap FFI-style calls that may come back on any thread.
pub trait RoutingEngine: Send + Sync {
    /// Current running info as the engine's JSON record.
    fn running_info(&self) -> Result<String, String>;

    /// Hand the engine a (new) tunnel file descriptor.
    fn set_tun_fd(&self, fd: i32) -> Result<(), String>;
}

/// The operating system side of the tunnel.
#[async_trait]
pub trait PacketTunnel: Send + Sync {
    /// Install a complete interface configuration.
    async fn apply_settings(&self, settings: &DesiredSettings) -> Result<(), String>;

    /// Descriptor of the tunnel interface, once one exists.
    fn tun_fd(&self) -> Option<i32>;
}

/// Where apply failures go so the host process can show them.
pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, message: &str);
}
