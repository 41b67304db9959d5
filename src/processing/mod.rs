//! Settings reconciliation logic.
//!
//! This module contains the pure computations of a reconciliation pass:
//! - [`dedup`] - route candidate collection and de-duplication
//! - [`overlap`] - pruning routes covered by broader routes
//! - [`builder`] - building the desired settings
//! - [`snapshot`] - comparable snapshots and the rebind decision

mod builder;
mod dedup;
mod overlap;
mod snapshot;

// Re-export public functions
pub use builder::{build_settings, dns_settings, mtu};
pub use dedup::{aggregate_routes, de_duplicate_routes, route_candidates};
pub use overlap::{is_minimal, prune_overlapping};
pub use snapshot::{
    equivalent, needs_interface_rebind, snapshot, AddressEntry, DnsSnapshot, Ipv6Entry,
    RouteEntry, SettingsSnapshot,
};
