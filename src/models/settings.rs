//! The complete interface configuration handed to the operating system.

use super::Ipv4Cidr;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Desired tunnel interface settings for one reconciliation pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DesiredSettings {
    pub ipv4: Ipv4Settings,
    pub ipv6: Option<Ipv6Settings>,
    pub dns: Option<DnsSettings>,
    pub mtu: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ipv4Settings {
    /// Tunnel host address.
    pub address: Ipv4Addr,
    /// Dotted-quad mask for `address`.
    pub subnet_mask: String,
    /// Routes sent through the tunnel, canonical and pruned.
    pub included_routes: Vec<Ipv4Cidr>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ipv6Settings {
    pub address: Ipv6Addr,
    pub prefix: u8,
}

impl Ipv6Settings {
    /// Parse `addr/prefix`. Anything else yields `None`.
    pub fn parse(text: &str) -> Option<Ipv6Settings> {
        let (addr, prefix) = text.trim().split_once('/')?;
        let address = addr.parse::<Ipv6Addr>().ok()?;
        let prefix = prefix.parse::<u8>().ok().filter(|p| *p <= 128)?;
        Some(Ipv6Settings { address, prefix })
    }
}

/// DNS block. An empty-string match domain captures every query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DnsSettings {
    pub servers: Vec<String>,
    pub search_domains: Vec<String>,
    pub match_domains: Vec<String>,
}

impl DnsSettings {
    pub fn captures_all(&self) -> bool {
        self.match_domains.iter().any(|d| d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_parse() {
        let v6 = Ipv6Settings::parse("fd00::1/64").unwrap();
        assert_eq!(v6.address, "fd00::1".parse::<Ipv6Addr>().unwrap());
        assert_eq!(v6.prefix, 64);

        assert_eq!(Ipv6Settings::parse("fd00::1"), None);
        assert_eq!(Ipv6Settings::parse("fd00::1/129"), None);
        assert_eq!(Ipv6Settings::parse("10.0.0.1/24"), None);
        assert_eq!(Ipv6Settings::parse(""), None);
    }

    #[test]
    fn test_captures_all() {
        let dns = DnsSettings {
            servers: vec!["1.1.1.1".into()],
            search_domains: vec![],
            match_domains: vec!["".into()],
        };
        assert!(dns.captures_all());
    }
}
