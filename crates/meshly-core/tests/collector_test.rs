#![allow(clippy::unwrap_used)]
// End-to-end collection tests against a mocked signed API.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meshly_api::SignedClient;
use meshly_core::model::{MacAddress, NodeKey};
use meshly_core::{AggregationPolicy, Collector};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Collector) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let api = SignedClient::with_client(
        reqwest::Client::new(),
        base_url,
        "test-key".into(),
        SecretString::from("test-secret".to_owned()),
        "1".into(),
    );
    let collector = Collector::new(api, AggregationPolicy::default());
    (server, collector)
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a two-network deployment: each network has one gateway and one
/// relay routing through it, one client local to the gateway and one
/// behind the relay.
async fn mount_deployment(server: &MockServer) {
    mount_json(
        server,
        "/network/list",
        json!({
            "networks": [
                { "id": 7, "name": "lakeside", "node_count": 2 },
                { "id": 8, "name": "harbour", "node_count": 2 },
            ]
        }),
    )
    .await;

    mount_json(
        server,
        "/node/network/7/list",
        json!({
            "nodes": {
                "1": { "name": "gate-a", "role": "gateway", "mac": "aa:00:00:00:00:01" },
                "2": {
                    "name": "relay-a", "role": "repeater",
                    "mac": "aa:00:00:00:00:02", "selected_gateway": "gate-a",
                },
            }
        }),
    )
    .await;

    mount_json(
        server,
        "/node/network/8/list",
        json!({
            "nodes": {
                "3": { "name": "gate-b", "role": "gateway", "mac": "aa:00:00:00:00:03" },
                "4": {
                    "name": "relay-b", "role": "repeater",
                    "mac": "aa:00:00:00:00:04", "selected_gateway": "gate-b",
                },
            }
        }),
    )
    .await;

    for net in [7, 8] {
        Mock::given(method("GET"))
            .and(path(format!("/history/network/{net}/nodes")))
            .and(query_param("period", "day"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nodes": {
                    "1": {
                        "checkins": [
                            { "time": "2024-06-15T00:00:00Z", "status": "gateway" },
                            { "time": "2024-06-15T00:05:00Z", "status": "gateway" },
                        ],
                        "traffic": { "main": { "bdown": 5_000_000, "bup": 1_000_000 } },
                        "metrics": [
                            { "time": "2024-06-15T00:00:00Z", "speed": 21.5 },
                        ],
                    },
                    // History for an id the node list never reported.
                    "99": { "checkins": [{ "time": "2024-06-15T00:00:00Z" }] },
                }
            })))
            .mount(server)
            .await;
    }

    mount_json(
        server,
        "/history/network/7/clients",
        json!({
            "clients": {
                "cc:00:00:00:00:01": {
                    "name": "laptop-a", "last_node": 1,
                    "traffic": { "main": { "bdown": 100_000, "bup": 10_000 } },
                },
                "cc:00:00:00:00:02": {
                    "name": "phone-a", "last_node": 2,
                    "traffic": { "main": { "bdown": 200_000, "bup": 20_000 } },
                },
            }
        }),
    )
    .await;

    mount_json(
        server,
        "/history/network/8/clients",
        json!({
            "clients": {
                "cc:00:00:00:00:03": {
                    "name": "laptop-b", "last_node": 3,
                    "traffic": { "main": { "bdown": 400_000, "bup": 40_000 } },
                },
                "cc:00:00:00:00:04": {
                    "name": "phone-b", "last_node": 4,
                    "traffic": { "main": { "bdown": 800_000, "bup": 80_000 } },
                },
            }
        }),
    )
    .await;
}

// ── Full run ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_run_aggregates_two_networks() {
    let (server, mut collector) = setup().await;
    mount_deployment(&server).await;

    collector.run().await.unwrap();
    let survey = collector.survey();

    assert_eq!(survey.network_count(), 2);
    assert_eq!(survey.node_count(), 4);
    assert_eq!(survey.client_count(), 4);

    // Summary totals are the plain sum of all four clients' volumes.
    let summary = survey.summary();
    assert!((summary.total_download_mb - 1.5).abs() < 1e-9);
    assert!((summary.total_upload_mb - 0.15).abs() < 1e-9);

    // Gateway-only counters carry exactly the relay-routed volumes.
    let gate_a = survey.node(&NodeKey::Id(1)).unwrap();
    assert_eq!(gate_a.usage.gateway_download_kb, 200);
    assert_eq!(gate_a.usage.download_kb, 300);

    let gate_b = survey.node(&NodeKey::Id(3)).unwrap();
    assert_eq!(gate_b.usage.gateway_download_kb, 800);
    assert_eq!(gate_b.usage.download_kb, 1200);

    // Relay nodes keep their own attribution but no gateway counters.
    let relay_a = survey.node(&NodeKey::Id(2)).unwrap();
    assert_eq!(relay_a.usage.download_kb, 200);
    assert_eq!(relay_a.usage.gateway_download_kb, 0);
    assert_eq!(relay_a.usage.clients, 1);
}

#[tokio::test]
async fn test_history_merges_into_known_nodes_only() {
    let (server, mut collector) = setup().await;
    mount_deployment(&server).await;

    collector.run().await.unwrap();
    let survey = collector.survey();

    let gate_a = survey.node(&NodeKey::Id(1)).unwrap();
    // Two checkins; the metric merged into the first by timestamp.
    assert_eq!(gate_a.checkins.len(), 2);
    let first = gate_a.checkins.values().next().unwrap();
    assert_eq!(first.status.as_deref(), Some("gateway"));
    assert_eq!(first.speed, Some(21.5));
    assert_eq!(gate_a.total_traffic(), (5_000_000, 1_000_000));

    // Id 99 never materialized as a node.
    assert!(survey.node(&NodeKey::Id(99)).is_none());
    assert_eq!(survey.node_count(), 4);
}

#[tokio::test]
async fn test_clients_are_recorded_by_mac() {
    let (server, mut collector) = setup().await;
    mount_deployment(&server).await;

    collector.run().await.unwrap();
    let survey = collector.survey();

    let phone = survey
        .client(&MacAddress::new("cc:00:00:00:00:02"))
        .unwrap();
    assert_eq!(phone.name.as_deref(), Some("phone-a"));
    assert_eq!(phone.download_kb, 200);
    assert_eq!(phone.observations, 1);
}

// ── Fatal fetch semantics ───────────────────────────────────────────

#[tokio::test]
async fn test_server_error_aborts_run_with_status() {
    let (server, mut collector) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = collector.run().await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    // Nothing was aggregated.
    let survey = collector.survey();
    assert_eq!(survey.network_count(), 0);
    assert_eq!(survey.node_count(), 0);
    assert_eq!(survey.client_count(), 0);
}

#[tokio::test]
async fn test_mid_run_error_propagates() {
    let (server, mut collector) = setup().await;

    mount_json(
        &server,
        "/network/list",
        json!({ "networks": [{ "id": 7, "name": "lakeside" }] }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/node/network/7/list"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = collector.run().await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

// ── Tolerant empty responses ────────────────────────────────────────

#[tokio::test]
async fn test_empty_shapes_yield_empty_survey() {
    let (server, mut collector) = setup().await;

    // Top-level keys missing entirely: tolerated as "no data this cycle".
    mount_json(&server, "/network/list", json!({})).await;

    collector.run().await.unwrap();
    assert_eq!(collector.survey().network_count(), 0);
    assert_eq!(collector.survey().summary().clients, 0);
}
