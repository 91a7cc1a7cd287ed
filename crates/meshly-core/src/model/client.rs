// ── Client (wifi user) domain type ──

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meshly_api::models::{ClientEntry, SsidTraffic};

use super::ids::MacAddress;

/// One wifi client, keyed by MAC and scoped to a network.
///
/// A client is a merge target within a run: the same MAC can surface in
/// several extracted rows (multiple SSIDs, multiple observation windows),
/// and repeated observations add their volumes rather than replacing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub mac: MacAddress,
    pub network: String,
    pub name: Option<String>,
    /// Display name and MAC of the node this client was last seen on.
    pub node_name: Option<String>,
    pub node_mac: Option<MacAddress>,
    /// Numeric id of the last node on the signed-API surface.
    pub last_node: Option<i64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub signal: Option<i32>,
    pub rate: Option<String>,
    pub mcs: Option<String>,
    pub blocked: Option<bool>,
    pub os: Option<String>,
    pub os_version: Option<String>,

    /// Cumulative volume across merged observations, kilobytes.
    pub download_kb: u64,
    pub upload_kb: u64,
    /// How many observations were merged into this record.
    pub observations: u32,

    /// Per-SSID byte totals from the history endpoint.
    pub traffic: HashMap<String, SsidTraffic>,
}

impl Client {
    /// A fresh single-observation client record.
    pub fn new(mac: MacAddress, network: impl Into<String>) -> Self {
        Self {
            mac,
            network: network.into(),
            name: None,
            node_name: None,
            node_mac: None,
            last_node: None,
            last_seen: None,
            signal: None,
            rate: None,
            mcs: None,
            blocked: None,
            os: None,
            os_version: None,
            download_kb: 0,
            upload_kb: 0,
            observations: 1,
            traffic: HashMap::new(),
        }
    }

    /// Build a client from a signed-API history entry.
    ///
    /// The entry's per-SSID byte totals are rolled up into the cumulative
    /// volume (bytes → kilobytes) so both surfaces merge the same way.
    pub fn from_entry(mac: MacAddress, network: impl Into<String>, entry: ClientEntry) -> Self {
        let (bdown, bup) = entry
            .traffic
            .values()
            .fold((0, 0), |(d, u), t| (d + t.bdown, u + t.bup));

        Self {
            name: entry.name_override.or(entry.name).or(entry.last_name),
            last_node: entry.last_node,
            last_seen: entry.last_seen,
            signal: entry.signal,
            rate: entry.bitrate.map(|b| b.to_string()),
            mcs: entry.mcs.map(|m| m.to_string()),
            blocked: entry.blocked,
            os: entry.os,
            os_version: entry.os_version,
            download_kb: bdown / 1000,
            upload_kb: bup / 1000,
            traffic: entry.traffic,
            ..Self::new(mac, network)
        }
    }

    /// Merge another observation of the same client: volumes add, the
    /// observation counter increments.
    pub fn merge_usage(&mut self, download_kb: u64, upload_kb: u64) {
        self.download_kb += download_kb;
        self.upload_kb += upload_kb;
        self.observations += 1;
    }

    /// Total bytes down/up across all SSIDs from the history endpoint.
    pub fn total_traffic(&self) -> (u64, u64) {
        self.traffic
            .values()
            .fold((0, 0), |(d, u), t| (d + t.bdown, u + t.bup))
    }
}
