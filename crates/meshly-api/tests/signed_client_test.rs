#![allow(clippy::unwrap_used)]
// Integration tests for `SignedClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use meshly_api::{Error, Payload, SignedClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SignedClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = SignedClient::with_client(
        reqwest::Client::new(),
        base_url,
        "test-key".into(),
        SecretString::from("test-secret".to_owned()),
        "1".into(),
    );
    (server, client)
}

// ── Signing headers ─────────────────────────────────────────────────

#[tokio::test]
async fn test_requests_carry_auth_and_signature_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .and(header_exists("Authorization"))
        .and(header_exists("Signature"))
        .and(header_exists("X-API-Version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "networks": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.list_networks().await.unwrap();
}

#[tokio::test]
async fn test_auth_header_shape() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "networks": [] })))
        .mount(&server)
        .await;

    client.list_networks().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let req: &Request = &requests[0];

    let auth = req.headers.get("Authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("key=test-key,timestamp="), "auth: {auth}");
    let nonce = auth.rsplit("nonce=").next().unwrap();
    assert_eq!(nonce.len(), 32);
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));

    let sig = req.headers.get("Signature").unwrap().to_str().unwrap();
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
}

// ── Payload decoding ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_networks_decodes_entries() {
    let (server, client) = setup().await;

    let body = json!({
        "networks": [
            {
                "id": 101,
                "name": "lakeside",
                "node_count": 4,
                "down_gateway": 0,
                "down_repeater": 1,
                "latest_firmware_version": "6.2.1",
            },
            { "id": 102, "name": "harbour" },
        ]
    });

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let resp = client.list_networks().await.unwrap();

    assert_eq!(resp.networks.len(), 2);
    assert_eq!(resp.networks[0].name, "lakeside");
    assert_eq!(resp.networks[0].down_repeater, Some(1));
    assert_eq!(resp.networks[1].node_count, None);
}

#[tokio::test]
async fn test_node_history_period_param() {
    let (server, client) = setup().await;

    let body = json!({
        "nodes": {
            "42": {
                "checkins": [
                    { "time": "2024-06-15T00:00:00Z", "status": "gateway" },
                    { "time": "2024-06-15T00:05:00Z" },
                ],
                "traffic": { "guest": { "bdown": 1024, "bup": 256 } },
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/history/network/7/nodes"))
        .and(query_param("period", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let resp = client.node_history(7, "day").await.unwrap();

    let entry = resp.nodes.get("42").unwrap();
    assert_eq!(entry.checkins.len(), 2);
    assert_eq!(entry.checkins[0].status.as_deref(), Some("gateway"));
    assert!(entry.checkins[1].status.is_none());
    assert_eq!(entry.traffic.get("guest").unwrap().bdown, 1024);
}

#[tokio::test]
async fn test_text_content_type_returns_text_payload() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("pong"),
        )
        .mount(&server)
        .await;

    let payload = client
        .request(reqwest::Method::GET, "/ping", None)
        .await
        .unwrap();

    match payload {
        Payload::Text(text) => assert_eq!(text, "pong"),
        Payload::Json(v) => panic!("expected text payload, got JSON: {v}"),
    }
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_fatal_with_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.list_networks().await;

    match result {
        Err(Error::Api { status, ref body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_networks().await;
    assert_eq!(result.unwrap_err().status(), Some(401));
}

#[tokio::test]
async fn test_malformed_json_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/network/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("{not json"),
        )
        .mount(&server)
        .await;

    let result = client.list_networks().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
