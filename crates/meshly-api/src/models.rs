// Wire types for the CloudMesh signed REST API.
//
// Fields use `#[serde(default)]` liberally because the API is inconsistent
// about field presence across dashboard releases, and `#[serde(flatten)]`
// catch-alls so undocumented fields never fail a decode. A list endpoint
// whose top-level key is missing decodes to an empty collection -- callers
// treat that as "no data this cycle", not an error.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The dashboard reports "no checkin yet" as a datetime with all zeroes.
const NULL_DATETIME: &str = "0000-00-00T00:00:00Z";

/// Tolerant datetime decoding: null, empty, the all-zeroes sentinel, and
/// unparseable values all map to `None`.
fn de_checkin_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.is_empty() && s != NULL_DATETIME)
        .and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }))
}

// ── Networks ─────────────────────────────────────────────────────────

/// `GET /network/list` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkListResponse {
    #[serde(default)]
    pub networks: Vec<NetworkEntry>,
}

/// One managed network from the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub node_count: Option<u32>,
    #[serde(default)]
    pub new_nodes: Option<u32>,
    #[serde(default)]
    pub spare_nodes: Option<u32>,
    #[serde(default)]
    pub down_gateway: Option<u32>,
    #[serde(default)]
    pub down_repeater: Option<u32>,
    #[serde(default)]
    pub is_fcc: Option<bool>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latest_firmware_version: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Nodes ────────────────────────────────────────────────────────────

/// `GET /node/network/{id}/list` response. Keyed by numeric node id
/// rendered as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeListResponse {
    #[serde(default)]
    pub nodes: HashMap<String, NodeEntry>,
}

/// One mesh node from the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `"gateway"` or `"repeater"` as reported; decoded in meshly-core.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub spare: Option<bool>,
    #[serde(default)]
    pub down: Option<bool>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub lan_info: Option<serde_json::Value>,
    #[serde(default)]
    pub anonymous_ip: Option<String>,
    /// Display name of the gateway this node currently routes through.
    #[serde(default)]
    pub selected_gateway: Option<String>,
    #[serde(default)]
    pub gateway_path: Option<serde_json::Value>,
    #[serde(default)]
    pub channels: Option<serde_json::Value>,
    #[serde(default)]
    pub ht_modes: Option<serde_json::Value>,
    #[serde(default)]
    pub hardware: Option<String>,
    /// Raw flags string; may be `0x`-prefixed hex.
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub mesh_version: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub neighbors: Option<serde_json::Value>,
    #[serde(default)]
    pub load: Option<f64>,
    #[serde(default)]
    pub memfree: Option<u64>,
    #[serde(default)]
    pub upgrade_status: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "de_checkin_datetime")]
    pub last_checkin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uptime: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Node history ─────────────────────────────────────────────────────

/// `GET /history/network/{id}/nodes?period=day` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeHistoryResponse {
    #[serde(default)]
    pub nodes: HashMap<String, NodeHistoryEntry>,
}

/// Per-node slice of the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeHistoryEntry {
    #[serde(default)]
    pub checkins: Vec<CheckinSample>,
    /// Per-SSID traffic totals over the period, bytes.
    #[serde(default)]
    pub traffic: HashMap<String, SsidTraffic>,
    #[serde(default)]
    pub metrics: Vec<MetricSample>,
}

/// One checkin time sample. A missing status means the node did not
/// check in during the sample window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinSample {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
}

/// One speed-test sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub speed: Option<f64>,
}

/// Byte totals for one SSID.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SsidTraffic {
    #[serde(default)]
    pub bdown: u64,
    #[serde(default)]
    pub bup: u64,
}

// ── Clients ──────────────────────────────────────────────────────────

/// `GET /history/network/{id}/clients` response. Keyed by client MAC.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientHistoryResponse {
    #[serde(default)]
    pub clients: HashMap<String, ClientEntry>,
}

/// One wifi client from the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEntry {
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub bitrate: Option<f64>,
    #[serde(default)]
    pub channel_width: Option<u32>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub mcs: Option<i32>,
    #[serde(default)]
    pub signal: Option<i32>,
    /// Per-SSID traffic totals, bytes.
    #[serde(default)]
    pub traffic: HashMap<String, SsidTraffic>,
    #[serde(default)]
    pub wifi_mode: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Numeric id of the node this client was last associated with.
    #[serde(default)]
    pub last_node: Option<i64>,
    #[serde(default, deserialize_with = "de_checkin_datetime")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_override: Option<String>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
