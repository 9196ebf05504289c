// Model tests: record precedence, snapshot helpers, payload decoding

use dockmetrics::models::*;
use std::collections::HashMap;

#[test]
fn test_metric_keys_shadow_labels() {
    let mut r = MetricRecord::new();
    r.set("state", "running");
    r.merge_labels(&HashMap::from([
        ("state".to_string(), "from-label".to_string()),
        ("team".to_string(), "infra".to_string()),
    ]));

    assert_eq!(r.get("state"), Some(MetricValue::Text("running".into())));
    assert_eq!(r.get("team"), Some(MetricValue::Text("infra".into())));
    assert_eq!(r.len(), 2);

    let keys: Vec<&str> = r.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["state", "team"]);
}

#[test]
fn test_later_label_source_wins() {
    let mut r = MetricRecord::new();
    r.merge_labels(&HashMap::from([("zone".to_string(), "a".to_string())]));
    r.merge_labels(&HashMap::from([("zone".to_string(), "b".to_string())]));
    assert_eq!(r.get("zone"), Some(MetricValue::Text("b".into())));
}

#[test]
fn test_set_opt_skips_missing_values() {
    let mut r = MetricRecord::new();
    r.set_opt("sizeRw", None::<i64>);
    r.set_opt("sizeRootFs", Some(42i64));
    assert!(!r.contains_key("sizeRw"));
    assert_eq!(r.get("sizeRootFs"), Some(MetricValue::Int(42)));
}

#[test]
fn test_metric_value_numeric_variants() {
    assert!(MetricValue::from(1u64).is_numeric());
    assert!(MetricValue::from(-1i64).is_numeric());
    assert!(MetricValue::from(0.5f64).is_numeric());
    assert!(!MetricValue::from(true).is_numeric());
    assert!(!MetricValue::from("x").is_numeric());
}

#[test]
fn test_container_snapshot_display_helpers() {
    let c = ContainerSnapshot {
        id: "0123456789abcdef0123".into(),
        names: vec!["/web".into()],
        image: "nginx@sha256:abc".into(),
        ports: vec![
            PortBinding {
                ip: Some("0.0.0.0".into()),
                private_port: 80,
                public_port: Some(8080),
                kind: "tcp".into(),
            },
        ],
        host_config: Some(SummaryHostConfig {
            network_mode: "bridge".into(),
        }),
        ..Default::default()
    };
    assert_eq!(c.short_id(), "0123456789ab");
    assert_eq!(c.name(), "web");
    assert_eq!(c.image_short(), "nginx");
    assert_eq!(c.network_mode(), Some("bridge"));
    assert_eq!(c.ports_display(), "0.0.0.0:8080->80/tcp");
}

#[test]
fn test_short_id_of_short_identifier_is_whole_id() {
    let c = ContainerSnapshot {
        id: "abc".into(),
        ..Default::default()
    };
    assert_eq!(c.short_id(), "abc");
}

#[test]
fn test_null_collections_decode_as_empty() {
    let json = r#"{"Id":"abc","Names":null,"Labels":null,"Ports":null,"Mounts":null}"#;
    let c: ContainerSnapshot = serde_json::from_str(json).unwrap();
    assert_eq!(c.id, "abc");
    assert!(c.names.is_empty());
    assert!(c.labels.is_empty());
    assert!(c.ports.is_empty());
}

#[test]
fn test_stats_platform_tag() {
    let s: StatsSnapshot = serde_json::from_str(r#"{"os_type":"Windows"}"#).unwrap();
    assert_eq!(s.platform(), Platform::Windows);
    let s: StatsSnapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(s.platform(), Platform::Unix);
}

#[test]
fn test_service_stack_and_mode() {
    let json = r#"{
        "ID": "svc1",
        "Spec": {
            "Name": "payments_api",
            "Labels": {"com.docker.stack.namespace": "payments"},
            "Mode": {"Replicated": {"Replicas": 3}}
        }
    }"#;
    let s: SwarmService = serde_json::from_str(json).unwrap();
    assert_eq!(s.stack(), Some("payments"));
    assert_eq!(s.mode(), Some(ServiceMode::Replicated(3)));
}

#[test]
fn test_epoch_seconds_parses_rfc3339() {
    assert_eq!(epoch_seconds("1970-01-01T00:01:00Z"), Some(60));
    assert_eq!(
        epoch_seconds("2024-05-01T10:00:00.123456789+02:00"),
        Some(1_714_550_400)
    );
    assert_eq!(epoch_seconds("not a time"), None);
}
