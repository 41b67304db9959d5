//! Comparable snapshots of installed settings.
//!
//! Every collection is held as a sorted set so the order settings were built in
//! never affects equality.

use crate::models::DesiredSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// IPv4 interface address with its dotted-quad mask.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressEntry {
    pub address: String,
    pub subnet_mask: String,
}

/// IPv4 route entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteEntry {
    pub destination: String,
    pub subnet_mask: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv6Entry {
    pub address: String,
    pub prefix: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsSnapshot {
    pub servers: BTreeSet<String>,
    pub search_domains: BTreeSet<String>,
    pub match_domains: BTreeSet<String>,
}

/// Projection of the configuration handed to the operating system.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsSnapshot {
    pub ipv4_addresses: BTreeSet<AddressEntry>,
    pub ipv4_routes: BTreeSet<RouteEntry>,
    pub ipv6_addresses: BTreeSet<Ipv6Entry>,
    pub dns: Option<DnsSnapshot>,
    pub mtu: Option<u32>,
}

impl SettingsSnapshot {
    /// True when the snapshot assigns any interface address.
    pub fn has_address(&self) -> bool {
        !self.ipv4_addresses.is_empty() || !self.ipv6_addresses.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Project settings into their comparable form.
pub fn snapshot(settings: &DesiredSettings) -> SettingsSnapshot {
    let ipv4_addresses = BTreeSet::from([AddressEntry {
        address: settings.ipv4.address.to_string(),
        subnet_mask: settings.ipv4.subnet_mask.clone(),
    }]);

    let ipv4_routes = settings
        .ipv4
        .included_routes
        .iter()
        .map(|r| RouteEntry {
            destination: r.lo().to_string(),
            subnet_mask: r.netmask().to_string(),
        })
        .collect();

    let ipv6_addresses = settings
        .ipv6
        .iter()
        .map(|v6| Ipv6Entry {
            address: v6.address.to_string(),
            prefix: v6.prefix,
        })
        .collect();

    let dns = settings.dns.as_ref().map(|dns| DnsSnapshot {
        servers: dns.servers.iter().cloned().collect(),
        search_domains: dns.search_domains.iter().cloned().collect(),
        match_domains: dns.match_domains.iter().cloned().collect(),
    });

    SettingsSnapshot {
        ipv4_addresses,
        ipv4_routes,
        ipv6_addresses,
        dns,
        mtu: Some(settings.mtu),
    }
}

/// Structural equality over every field.
pub fn equivalent(a: &SettingsSnapshot, b: &SettingsSnapshot) -> bool {
    a == b
}

/// Whether moving from `old` to `new` requires re-binding the packet handle.
///
/// Only address changes count. Routes, DNS and MTU can be updated on a live
/// interface.
pub fn needs_interface_rebind(old: Option<&SettingsSnapshot>, new: &SettingsSnapshot) -> bool {
    match old {
        None => new.has_address(),
        Some(old) => {
            old.ipv4_addresses != new.ipv4_addresses || old.ipv6_addresses != new.ipv6_addresses
        }
    }
}
