//! Integration tests for tunnel-netsettings
//!
//! These tests verify the complete workflow from routing-engine facts to
//! applied settings, through the public API only.

use std::net::Ipv4Addr;
use std::sync::Arc;
use tunnel_netsettings::engine::{
    read_last_error, DryRunTunnel, FileRoutingEngine, PacketTunnel, Reconciler,
    SharedFileNotifier,
};
use tunnel_netsettings::models::{DesiredSettings, Ipv4Cidr};
use tunnel_netsettings::processing::{de_duplicate_routes, is_minimal, prune_overlapping};
use tunnel_netsettings::{
    compute_settings, snapshot, CommandHandler, ReconcileError, TunnelOptions,
};

const FACTS: &str = r#"{
    "my_node_info": {"virtual_ipv4": {"address": "10.126.126.5", "network_length": 24}},
    "routes": [{"proxy_cidrs": ["10.126.126.0/24", "10.126.0.0/16"]}]
}"#;

#[test]
fn test_route_aggregation() {
    let candidates = vec!["10.0.0.0/8", "10.1.0.0/16", "192.168.1.0/24", "10.0.0.0/8"];
    let routes = de_duplicate_routes(&candidates);
    let pruned = prune_overlapping(routes);
    assert!(is_minimal(&pruned));
    assert_eq!(
        pruned,
        vec![
            Ipv4Cidr::new("10.0.0.0/8").unwrap(),
            Ipv4Cidr::new("192.168.1.0/24").unwrap()
        ]
    );
}

#[test]
fn test_compute_settings() {
    let settings = compute_settings(FACTS, &TunnelOptions::default()).expect("Failed to compute");
    assert_eq!(settings.ipv4.address, Ipv4Addr::new(10, 126, 126, 5));
    assert_eq!(settings.ipv4.subnet_mask, "255.255.255.0");
    assert_eq!(
        settings.ipv4.included_routes,
        vec![Ipv4Cidr::new("10.126.0.0/16").unwrap()]
    );
    assert_eq!(settings.mtu, 1380);

    // Same facts in a different order give the same snapshot
    let reordered = r#"{
        "routes": [{"proxy_cidrs": ["10.126.0.0/16", "10.126.126.0/24"]}],
        "my_node_info": {"virtual_ipv4": {"address": "10.126.126.5", "network_length": 24}}
    }"#;
    let other = compute_settings(reordered, &TunnelOptions::default()).unwrap();
    assert_eq!(snapshot(&settings), snapshot(&other));
}

#[test]
fn test_malformed_facts_are_not_ready() {
    let result = compute_settings("not json", &TunnelOptions::default());
    assert_eq!(result, Err(ReconcileError::NotReady));
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_from_facts_file() {
    let dir = tempfile::tempdir().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, FACTS).unwrap();

    let engine = Arc::new(FileRoutingEngine::new(&facts));
    let tunnel = Arc::new(DryRunTunnel::new(7));
    let notifier = Arc::new(SharedFileNotifier::new(dir.path()));
    let reconciler = Reconciler::spawn(
        engine.clone(),
        tunnel.clone(),
        notifier,
        TunnelOptions::default(),
    );

    reconciler.reassert().await.expect("First apply failed");
    assert_eq!(engine.bound_fd(), Some(7));
    let applied = tunnel.last_settings().expect("Nothing applied");
    assert_eq!(applied.ipv4.address, Ipv4Addr::new(10, 126, 126, 5));

    // Route-only change: applied, no rebind needed
    std::fs::write(
        &facts,
        r#"{
            "my_node_info": {"virtual_ipv4": {"address": "10.126.126.5", "network_length": 24}},
            "routes": [{"proxy_cidrs": ["10.126.0.0/16", "172.16.0.0/12"]}]
        }"#,
    )
    .unwrap();
    reconciler.facts_changed();
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let last = reconciler.last_snapshot().await.unwrap().expect("No snapshot");
    assert_eq!(last.ipv4_routes.len(), 2);
    assert_eq!(tunnel.last_settings().unwrap().ipv4.included_routes.len(), 2);
    assert!(read_last_error(dir.path()).is_none());

    reconciler.shutdown();
    reconciler.closed().await;
    assert_eq!(reconciler.reassert().await, Err(ReconcileError::Stopped));
}

struct BrokenTunnel;

#[async_trait::async_trait]
impl PacketTunnel for BrokenTunnel {
    async fn apply_settings(&self, _settings: &DesiredSettings) -> Result<(), String> {
        Err("permission denied".to_string())
    }

    fn tun_fd(&self) -> Option<i32> {
        None
    }
}

#[tokio::test(start_paused = true)]
async fn test_apply_failure_reaches_host() {
    let dir = tempfile::tempdir().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, FACTS).unwrap();

    let engine = Arc::new(FileRoutingEngine::new(&facts));
    let notifier = SharedFileNotifier::new(dir.path().join("shared"));
    let reconciler = Reconciler::spawn(
        engine.clone(),
        Arc::new(BrokenTunnel),
        Arc::new(notifier.clone()),
        TunnelOptions::default(),
    );

    let result = reconciler.reassert().await;
    assert!(matches!(result, Err(ReconcileError::ApplyFailed(_))));
    assert_eq!(
        read_last_error(&dir.path().join("shared")).as_deref(),
        Some("applying network settings failed: permission denied")
    );
    assert!(notifier.signal_path().exists());

    let handler = CommandHandler::new(reconciler, engine, None);
    let reply = handler.handle_json(r#"{"command":"last_settings"}"#).await;
    assert_eq!(reply, r#"{"ok":true,"payload":"null"}"#);
}
