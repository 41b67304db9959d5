//! Route candidate collection and de-duplication.
//!
//! Gathers candidate subnets from the configured sources, canonicalizes them and
//! drops exact duplicates. Overlap pruning lives in [`super::overlap`].

use crate::config;
use crate::models::{Ipv4Cidr, RunningInfo, TunnelOptions};

use super::overlap::prune_overlapping;

/// Collect raw route candidates in source priority order.
///
/// A non-empty manual route list wins outright. Otherwise the union of peer
/// proxy CIDRs, our own address block (runtime assignment preferred over the
/// static option) and, with magic DNS on, the resolver `/32`.
pub fn route_candidates(facts: &RunningInfo, options: &TunnelOptions) -> Vec<String> {
    if !options.routes.is_empty() {
        log::debug!(
            "Using {} manual route(s), discovered routes ignored",
            options.routes.len()
        );
        return options.routes.clone();
    }

    let mut candidates: Vec<String> = facts.proxy_cidrs().map(str::to_string).collect();

    match (facts.virtual_ipv4(), options.ipv4.as_deref()) {
        (Some(dynamic), _) => candidates.push(dynamic.to_string()),
        (None, Some(static_ipv4)) => candidates.push(static_ipv4.to_string()),
        (None, None) => {}
    }

    if options.enable_magic_dns {
        candidates.push(format!("{}/32", config::MAGIC_DNS_ADDR));
    }

    candidates
}

/// Parse, canonicalize and de-duplicate candidate subnets.
///
/// Unparsable entries are logged and skipped.
///
/// # Returns
/// Unique canonical subnets, sorted by address then prefix length.
pub fn de_duplicate_routes<S: AsRef<str>>(candidates: &[S]) -> Vec<Ipv4Cidr> {
    let mut routes: Vec<Ipv4Cidr> = candidates
        .iter()
        .filter_map(|c| match Ipv4Cidr::new(c.as_ref()) {
            Ok(cidr) => Some(cidr.canonicalize()),
            Err(e) => {
                log::warn!("Skipping route candidate '{}': {e}", c.as_ref());
                None
            }
        })
        .collect();

    // Dedup - must be sorted first
    routes.sort();
    routes.dedup();

    routes
}

/// Build the minimal route set for the current facts and options.
pub fn aggregate_routes(facts: &RunningInfo, options: &TunnelOptions) -> Vec<Ipv4Cidr> {
    let candidates = route_candidates(facts, options);
    let routes = de_duplicate_routes(&candidates);
    let pruned = prune_overlapping(routes);
    log::debug!(
        "Aggregated {} candidate(s) into {} route(s)",
        candidates.len(),
        pruned.len()
    );
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidrs(list: &[&str]) -> Vec<Ipv4Cidr> {
        list.iter().map(|s| Ipv4Cidr::new(s).unwrap()).collect()
    }

    fn facts(json: &str) -> RunningInfo {
        RunningInfo::from_json(json).unwrap()
    }

    #[test]
    fn test_de_duplicate_routes() {
        let result = de_duplicate_routes(&[
            "10.1.0.0/16",
            "10.1.2.3/16",
            "bogus",
            "192.168.1.7/24",
            "10.1.0.0/16",
        ]);
        assert_eq!(result, cidrs(&["10.1.0.0/16", "192.168.1.0/24"]));
    }

    #[test]
    fn test_de_duplicate_routes_order_independent() {
        let a = de_duplicate_routes(&["10.0.0.0/8", "172.16.0.0/12", "10.0.0.0/8"]);
        let b = de_duplicate_routes(&["172.16.0.0/12", "10.0.0.0/8", "10.0.0.0/8"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_de_duplicate_routes_empty() {
        let empty: [&str; 0] = [];
        assert!(de_duplicate_routes(&empty).is_empty());
        assert!(de_duplicate_routes(&["nope", "1.2.3.4/99"]).is_empty());
    }

    #[test]
    fn test_manual_routes_win() {
        let options = TunnelOptions {
            routes: vec!["192.168.0.0/16".into()],
            enable_magic_dns: true,
            ipv4: Some("10.0.0.1/24".into()),
            ..Default::default()
        };
        let info = facts(r#"{"routes": [{"proxy_cidrs": ["10.1.0.0/16"]}]}"#);
        assert_eq!(route_candidates(&info, &options), vec!["192.168.0.0/16"]);
    }

    #[test]
    fn test_dynamic_address_preferred() {
        let options = TunnelOptions {
            ipv4: Some("10.0.0.1/24".into()),
            ..Default::default()
        };
        let info = facts(
            r#"{"my_node_info": {"virtual_ipv4": {"address": "10.126.126.5", "network_length": 24}}}"#,
        );
        assert_eq!(route_candidates(&info, &options), vec!["10.126.126.5/24"]);

        let no_dynamic = RunningInfo::default();
        assert_eq!(route_candidates(&no_dynamic, &options), vec!["10.0.0.1/24"]);
    }

    #[test]
    fn test_magic_dns_route() {
        let options = TunnelOptions {
            enable_magic_dns: true,
            ..Default::default()
        };
        let routes = aggregate_routes(&RunningInfo::default(), &options);
        assert_eq!(routes, cidrs(&["100.100.100.101/32"]));
    }

    #[test]
    fn test_aggregate_routes() {
        let info = facts(
            r#"{
                "my_node_info": {"virtual_ipv4": {"address": "10.126.126.5", "network_length": 24}},
                "routes": [
                    {"proxy_cidrs": ["10.126.126.0/24", "10.126.0.0/16"]},
                    {"proxy_cidrs": ["192.168.1.0/24", "not-a-cidr"]}
                ]
            }"#,
        );
        let routes = aggregate_routes(&info, &TunnelOptions::default());
        assert_eq!(routes, cidrs(&["10.126.0.0/16", "192.168.1.0/24"]));
    }

    #[test]
    fn test_aggregate_routes_nothing() {
        let routes = aggregate_routes(&RunningInfo::default(), &TunnelOptions::default());
        assert!(routes.is_empty());
    }
}
