//! Desired settings construction.
//!
//! Combines the live facts with the static options into one
//! [`DesiredSettings`] value, or reports that no address is known yet.

use crate::config;
use crate::error::ReconcileError;
use crate::models::{
    prefix_to_mask, DesiredSettings, DnsSettings, Ipv4Cidr, Ipv4Settings, Ipv6Settings,
    RunningInfo, TunnelOptions,
};

use super::dedup::aggregate_routes;

/// Build the settings the tunnel interface should carry right now.
///
/// # Returns
/// * `Ok(DesiredSettings)` - a complete configuration
/// * `Err(NotReady)` - neither facts nor options provide a tunnel address
/// * `Err(MalformedCidr)` - the resolved prefix length cannot form a mask
pub fn build_settings(
    facts: &RunningInfo,
    options: &TunnelOptions,
) -> Result<DesiredSettings, ReconcileError> {
    let address = resolve_address(facts, options).ok_or(ReconcileError::NotReady)?;
    let subnet_mask = prefix_to_mask(address.mask)?;

    let included_routes = aggregate_routes(facts, options);
    if included_routes.is_empty() {
        log::info!("No routes to include for tunnel address {address}");
    }

    let ipv6 = options.ipv6.as_deref().and_then(|text| {
        let parsed = Ipv6Settings::parse(text);
        if parsed.is_none() {
            log::warn!("Ignoring malformed IPv6 option '{text}'");
        }
        parsed
    });

    Ok(DesiredSettings {
        ipv4: Ipv4Settings {
            address: address.addr,
            subnet_mask,
            included_routes,
        },
        ipv6,
        dns: dns_settings(options),
        mtu: mtu(options),
    })
}

/// Tunnel address: the engine's live assignment, else the static option.
fn resolve_address(facts: &RunningInfo, options: &TunnelOptions) -> Option<Ipv4Cidr> {
    if let Some(live) = facts.virtual_ipv4() {
        return Some(live);
    }
    let text = options.ipv4.as_deref()?;
    match Ipv4Cidr::new(text) {
        Ok(cidr) => Some(cidr),
        Err(e) => {
            log::warn!("Ignoring static ipv4 option: {e}");
            None
        }
    }
}

/// DNS policy: explicit override, else magic DNS, else leave system DNS alone.
pub fn dns_settings(options: &TunnelOptions) -> Option<DnsSettings> {
    let servers: Vec<String> = options
        .dns_servers
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if !servers.is_empty() {
        return Some(DnsSettings {
            servers,
            search_domains: vec![],
            match_domains: vec![String::new()],
        });
    }

    if options.enable_magic_dns {
        return Some(DnsSettings {
            servers: vec![config::MAGIC_DNS_ADDR.to_string()],
            search_domains: vec![config::MAGIC_DNS_ZONE.to_string()],
            match_domains: vec![config::MAGIC_DNS_ZONE.to_string()],
        });
    }

    None
}

/// Explicit MTU, else the encryption-dependent default.
pub fn mtu(options: &TunnelOptions) -> u32 {
    match (options.mtu, options.enable_encryption) {
        (Some(mtu), _) => mtu,
        (None, true) => config::MTU_ENCRYPTED,
        (None, false) => config::MTU_PLAIN,
    }
}
