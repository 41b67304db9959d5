// cargo watch -x 'fmt' -x 'test'

//! Network-settings reconciliation for a mesh-VPN tunnel.
//!
//! Facts from the routing engine plus static [`models::TunnelOptions`] are turned
//! into a [`models::DesiredSettings`] value by [`processing`], and the
//! [`engine::Reconciler`] applies it to the OS tunnel at most once at a time.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;

pub use engine::{CommandHandler, Reconciler, SharedFileNotifier};
pub use error::ReconcileError;
pub use models::{DesiredSettings, RunningInfo, TunnelOptions};
pub use processing::{build_settings, snapshot, SettingsSnapshot};

/// Compute settings straight from a running-info JSON document.
///
/// Malformed facts are treated as empty, the same way a live cycle does.
pub fn compute_settings(
    facts_json: &str,
    options: &TunnelOptions,
) -> Result<DesiredSettings, ReconcileError> {
    let facts = RunningInfo::from_json_lossy(facts_json);
    build_settings(&facts, options)
}
