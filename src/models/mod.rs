//! Domain models for tunnel network settings.
//!
//! This module contains the value types used throughout the crate:
//! - [`Ipv4Cidr`] - IPv4 address with CIDR notation support
//! - [`RunningInfo`] - facts reported by the mesh routing engine
//! - [`TunnelOptions`] - static per-session options
//! - [`DesiredSettings`] - the interface configuration to install

mod facts;
mod ipv4;
mod options;
mod settings;

// Re-export public types
pub use facts::{MyNodeInfo, Route, RunningInfo, VirtualIpv4};
pub use ipv4::{contains, get_cidr_mask, prefix_to_mask, Ipv4Cidr, MAX_LENGTH};
pub use options::TunnelOptions;
pub use settings::{DesiredSettings, DnsSettings, Ipv4Settings, Ipv6Settings};
