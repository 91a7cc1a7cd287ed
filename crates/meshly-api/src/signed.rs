// Signed REST client
//
// Wraps `reqwest::Client` with CloudMesh request signing, content-type
// aware payload decoding, and bounded retry on transient transport
// failures. Endpoint methods return decoded wire models; anything the
// remote answers with a non-2xx status is final and fatal to the run.

use std::time::Duration;

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::Error;
use crate::models::{
    ClientHistoryResponse, NetworkListResponse, NodeHistoryResponse, NodeListResponse,
};
use crate::signing::sign_now;
use crate::transport::TransportConfig;

/// Dashboard API version header.
const API_VERSION_HEADER: &str = "X-API-Version";

/// A decoded response payload.
///
/// The API answers JSON for data endpoints but plain text for a few
/// diagnostic paths; the content-type decides which.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

/// HTTP client for the CloudMesh signed REST API.
///
/// Every request is signed fresh (timestamp + nonce), so retries never
/// reuse a signature.
pub struct SignedClient {
    http: reqwest::Client,
    base_url: Url,
    key: String,
    secret: SecretString,
    api_version: String,
    retry_attempts: u32,
}

impl SignedClient {
    /// Create a new signed client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        key: String,
        secret: SecretString,
        api_version: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            key,
            secret,
            api_version,
            retry_attempts: transport.retry_attempts.max(1),
        })
    }

    /// Create a signed client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        key: String,
        secret: SecretString,
        api_version: String,
    ) -> Self {
        Self {
            http,
            base_url,
            key,
            secret,
            api_version,
            retry_attempts: 1,
        }
    }

    /// The dashboard base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an API path (which may carry a query string).
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Issue a signed request and decode the payload by content-type.
    ///
    /// Transient transport failures (connect errors, timeouts) are retried
    /// with doubling backoff up to the configured attempt budget. A non-2xx
    /// response is never retried: the status, reason, and body are logged
    /// and surfaced as [`Error::Api`].
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Payload, Error> {
        let url = self.api_url(path)?;
        let json_body = body.map(|b| b.to_string());

        let mut backoff = Duration::from_millis(500);
        let mut attempt = 1;
        loop {
            match self
                .send_once(method.clone(), url.clone(), path, json_body.as_deref())
                .await
            {
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    warn!(%url, attempt, "transient transport error, retrying: {e}");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        method: reqwest::Method,
        url: Url,
        path: &str,
        json_body: Option<&str>,
    ) -> Result<Payload, Error> {
        // Signed fresh per attempt: the nonce is single-use.
        let sig = sign_now(&self.key, &self.secret, path, json_body);

        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .header("Authorization", &sig.auth)
            .header("Signature", &sig.signature)
            .header(API_VERSION_HEADER, &self.api_version)
            .header("Content-Type", "application/json");
        if let Some(body) = json_body {
            builder = builder.body(body.to_owned());
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_owned();
            let body = resp.text().await.unwrap_or_default();
            error!("{} {} {}", status.as_u16(), reason, body);
            return Err(Error::Api {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let text = resp.text().await.map_err(Error::Transport)?;
        if is_json {
            let value = serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text,
            })?;
            Ok(Payload::Json(value))
        } else {
            Ok(Payload::Text(text))
        }
    }

    /// GET a path and decode the JSON payload into `T`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        match self.request(reqwest::Method::GET, path, None).await? {
            Payload::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: value.to_string(),
                })
            }
            Payload::Text(body) => Err(Error::Deserialization {
                message: "expected JSON response".into(),
                body,
            }),
        }
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List all networks visible to the API key.
    ///
    /// `GET /network/list`
    pub async fn list_networks(&self) -> Result<NetworkListResponse, Error> {
        self.get_json("/network/list").await
    }

    /// List the nodes of one network, keyed by node id.
    ///
    /// `GET /node/network/{id}/list`
    pub async fn list_nodes(&self, network_id: i64) -> Result<NodeListResponse, Error> {
        self.get_json(&format!("/node/network/{network_id}/list"))
            .await
    }

    /// Fetch checkin/traffic/metric history for a network's nodes.
    ///
    /// `GET /history/network/{id}/nodes?period={period}`
    pub async fn node_history(
        &self,
        network_id: i64,
        period: &str,
    ) -> Result<NodeHistoryResponse, Error> {
        self.get_json(&format!(
            "/history/network/{network_id}/nodes?period={period}"
        ))
        .await
    }

    /// Fetch the client usage history for a network, keyed by MAC.
    ///
    /// `GET /history/network/{id}/clients`
    pub async fn client_history(&self, network_id: i64) -> Result<ClientHistoryResponse, Error> {
        self.get_json(&format!("/history/network/{network_id}/clients"))
            .await
    }
}
