// ── Node domain types ──
//
// A node is rebuilt from scratch each collection run and then accumulates
// usage attributed by clients, checkin history, and (on the dashboard
// surface) pixel-derived uptime percentages.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use meshly_api::models::{NodeEntry, SsidTraffic};

use super::ids::{MacAddress, NodeKey};
use crate::checkin::CheckinBreakdown;

// ── Role and state ──────────────────────────────────────────────────

/// What a node does in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeRole {
    /// Direct internet uplink.
    Gateway,
    /// Forwards traffic towards a gateway over the mesh.
    Relay,
    /// Standby node not currently serving traffic.
    Spare,
}

/// Whether the node is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

/// Role and reachability decoded together from the dashboard's one-digit
/// status code. Decoded once at the boundary -- nothing downstream ever
/// sees the raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub role: NodeRole,
    pub state: LinkState,
}

impl NodeStatus {
    /// Decode the dashboard status-code digit.
    ///
    /// Returns `None` for unrecognized codes; the caller counts those as
    /// omitted but keeps the raw row.
    pub fn from_dashboard_code(code: &str) -> Option<Self> {
        let (role, state) = match code {
            "1" => (NodeRole::Gateway, LinkState::Down),
            "2" => (NodeRole::Relay, LinkState::Down),
            "3" => (NodeRole::Gateway, LinkState::Up),
            "4" => (NodeRole::Relay, LinkState::Up),
            "5" | "6" => (NodeRole::Spare, LinkState::Down),
            "7" | "8" => (NodeRole::Spare, LinkState::Up),
            _ => return None,
        };
        Some(Self { role, state })
    }
}

// ── Usage attribution ───────────────────────────────────────────────

/// Where a node's client traffic went upstream.
///
/// Returned by [`Node::add_usage`]; the caller escalates to gateway-only
/// counters only for the `Named` variant -- a gateway's own clients are
/// `SelfGateway` and are not escalated unless the aggregation policy says so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamGateway {
    /// The node is itself the gateway for this traffic.
    SelfGateway,
    /// A distinct upstream gateway, by display name.
    Named(String),
    /// The node did not report an upstream gateway.
    NotReported,
}

/// Usage counters accumulated across one collection cycle, kilobytes.
///
/// Gateway counters track internet-bound traffic the node carried on
/// behalf of relay-attached clients; they are always a subset of the
/// totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUsage {
    pub download_kb: u64,
    pub upload_kb: u64,
    pub gateway_download_kb: u64,
    pub gateway_upload_kb: u64,
    /// How many client observations attributed usage to this node.
    pub clients: u32,
}

// ── Checkin history ─────────────────────────────────────────────────

/// One merged checkin sample. Status and speed arrive on separate
/// history records and are merged by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub status: Option<String>,
    pub speed: Option<f64>,
}

// ── Alerting policy ─────────────────────────────────────────────────

/// What makes a node count as alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertTrigger {
    /// The node reports a `down` condition.
    #[default]
    DownFlag,
    /// The pixel-derived offline percentage is greater than zero
    /// (dashboard surface only).
    OfflineTime,
}

/// Alerting predicate, configurable because the right answer depends on
/// the data surface and on whether spares are worth waking anyone for.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertPolicy {
    pub trigger: AlertTrigger,
    pub include_spares: bool,
}

// ── Node ────────────────────────────────────────────────────────────

/// One mesh node, scoped to a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    /// Network identity as rendered: numeric id on the API surface,
    /// dashboard network name on the session surface.
    pub network: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `None` when the source reported an unrecognized role/status code;
    /// such nodes are excluded from categorized reports but kept here.
    pub role: Option<NodeRole>,
    pub spare: bool,
    pub down: bool,
    pub mac: Option<MacAddress>,
    pub ip: Option<String>,
    /// Display name/IP of the gateway this node routes through.
    pub gateway_name: Option<String>,
    pub gateway_ip: Option<String>,
    pub firmware_version: Option<String>,
    pub firmware_name: Option<String>,
    pub hardware: Option<String>,
    /// Parsed from the raw flags string when it is `0x`-prefixed hex.
    pub flags: Option<u64>,
    pub load: Option<f64>,
    pub memfree: Option<u64>,
    pub channel_24: Option<String>,
    pub channel_58: Option<String>,
    pub last_checkin: Option<DateTime<Utc>>,
    /// Dashboard description of time since last checkin, verbatim.
    pub last_checkin_desc: Option<String>,
    pub uptime: Option<String>,
    pub latency_ms: Option<u32>,
    pub hops: Option<u32>,
    /// Client count as reported by the dashboard table, distinct from
    /// `usage.clients` which this run attributes itself.
    pub reported_clients: Option<u32>,
    /// 24h usage totals as reported by the dashboard table, kilobytes.
    pub reported_download_kb: Option<u64>,
    pub reported_upload_kb: Option<u64>,

    /// Usage attributed to this node by clients during this run.
    pub usage: NodeUsage,
    /// Per-SSID byte totals from the history endpoint.
    pub traffic: HashMap<String, SsidTraffic>,
    /// Merged (timestamp → status/speed) history samples.
    pub checkins: BTreeMap<DateTime<Utc>, Checkin>,
    /// Pixel-derived uptime breakdown (dashboard surface only).
    pub timeline: Option<CheckinBreakdown>,
}

impl Node {
    /// A bare node with the given identity; everything else absent.
    pub fn new(key: NodeKey, network: impl Into<String>) -> Self {
        Self {
            key,
            network: network.into(),
            name: None,
            description: None,
            role: None,
            spare: false,
            down: false,
            mac: None,
            ip: None,
            gateway_name: None,
            gateway_ip: None,
            firmware_version: None,
            firmware_name: None,
            hardware: None,
            flags: None,
            load: None,
            memfree: None,
            channel_24: None,
            channel_58: None,
            last_checkin: None,
            last_checkin_desc: None,
            uptime: None,
            latency_ms: None,
            hops: None,
            reported_clients: None,
            reported_download_kb: None,
            reported_upload_kb: None,
            usage: NodeUsage::default(),
            traffic: HashMap::new(),
            checkins: BTreeMap::new(),
            timeline: None,
        }
    }

    /// Build a node from a signed-API list entry.
    pub fn from_entry(id: i64, network: impl Into<String>, entry: NodeEntry) -> Self {
        let role = match entry.role.as_deref() {
            _ if entry.spare.unwrap_or(false) => Some(NodeRole::Spare),
            Some("gateway") => Some(NodeRole::Gateway),
            Some("repeater") => Some(NodeRole::Relay),
            _ => None,
        };

        let flags = entry
            .flags
            .as_deref()
            .filter(|f| !f.is_empty())
            .and_then(|f| {
                f.strip_prefix("0x")
                    .and_then(|hexpart| u64::from_str_radix(hexpart, 16).ok())
            });

        Self {
            role,
            spare: entry.spare.unwrap_or(false),
            down: entry.down.unwrap_or(false),
            name: entry.name,
            description: entry.description,
            mac: entry.mac.map(MacAddress::new),
            ip: entry.ip,
            gateway_name: entry.selected_gateway,
            firmware_version: entry.firmware_version,
            hardware: entry.hardware,
            flags,
            load: entry.load,
            memfree: entry.memfree,
            last_checkin: entry.last_checkin,
            uptime: entry.uptime,
            ..Self::new(NodeKey::Id(id), network)
        }
    }

    pub fn is_gateway(&self) -> bool {
        self.role == Some(NodeRole::Gateway)
    }

    pub fn is_relay(&self) -> bool {
        self.role == Some(NodeRole::Relay)
    }

    pub fn is_spare(&self) -> bool {
        self.spare || self.role == Some(NodeRole::Spare)
    }

    // ── Checkin history ──────────────────────────────────────────────

    /// Record a checkin sample, merging by timestamp.
    ///
    /// Status and speed arrive on separate history records; a second
    /// sample at a known timestamp fills in whichever half was missing
    /// instead of duplicating the entry.
    pub fn add_checkin(&mut self, time: DateTime<Utc>, status: Option<String>, speed: Option<f64>) {
        let sample = self.checkins.entry(time).or_default();
        if status.is_some() {
            sample.status = status;
        }
        if speed.is_some() {
            sample.speed = speed;
        }
    }

    /// Frequency count of each checkin status. Samples with no status are
    /// counted under `"none"` -- the node missed that checkin window.
    pub fn status_counts(&self) -> BTreeMap<&str, u32> {
        let mut counts = BTreeMap::new();
        for sample in self.checkins.values() {
            let status = sample.status.as_deref().unwrap_or("none");
            *counts.entry(status).or_insert(0) += 1;
        }
        counts
    }

    /// Total bytes down/up across all SSIDs from the history endpoint.
    pub fn total_traffic(&self) -> (u64, u64) {
        self.traffic
            .values()
            .fold((0, 0), |(d, u), t| (d + t.bdown, u + t.bup))
    }

    // ── Usage attribution ────────────────────────────────────────────

    /// Attribute one client observation's volume to this node.
    ///
    /// Adds to the node totals and the client counter, then tells the
    /// caller where the traffic went upstream so gateway-only counters
    /// can be credited on the right node.
    pub fn add_usage(&mut self, download_kb: u64, upload_kb: u64) -> UpstreamGateway {
        self.usage.download_kb += download_kb;
        self.usage.upload_kb += upload_kb;
        self.usage.clients += 1;

        if self.is_gateway() {
            UpstreamGateway::SelfGateway
        } else {
            match self.gateway_name.as_deref() {
                Some(name) if !name.is_empty() => UpstreamGateway::Named(name.to_owned()),
                _ => UpstreamGateway::NotReported,
            }
        }
    }

    /// Credit traffic this gateway carried for a relay-attached client.
    ///
    /// Counts into both the totals and the gateway-only counters: the
    /// traffic passed through this node, and it was internet-bound here.
    pub fn add_carried_usage(&mut self, download_kb: u64, upload_kb: u64) {
        self.usage.download_kb += download_kb;
        self.usage.upload_kb += upload_kb;
        self.usage.gateway_download_kb += download_kb;
        self.usage.gateway_upload_kb += upload_kb;
    }

    /// Credit gateway-only counters without touching the totals.
    ///
    /// Used when the aggregation policy counts a gateway's own clients
    /// into its gateway counters; the totals were already incremented by
    /// [`Node::add_usage`].
    pub fn add_gateway_usage(&mut self, download_kb: u64, upload_kb: u64) {
        self.usage.gateway_download_kb += download_kb;
        self.usage.gateway_upload_kb += upload_kb;
    }

    // ── Alerting ─────────────────────────────────────────────────────

    /// Whether this node satisfies the alerting predicate.
    pub fn is_alerting(&self, policy: AlertPolicy) -> bool {
        if self.is_spare() && !policy.include_spares {
            return false;
        }
        match policy.trigger {
            AlertTrigger::DownFlag => self.down,
            AlertTrigger::OfflineTime => self
                .timeline
                .as_ref()
                .is_some_and(|t| t.offline_pct > 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway(name: &str) -> Node {
        let mut node = Node::new(NodeKey::Mac(MacAddress::new("aa:00:00:00:00:01")), "test");
        node.name = Some(name.to_owned());
        node.role = Some(NodeRole::Gateway);
        node
    }

    fn relay(name: &str, gateway_name: &str) -> Node {
        let mut node = Node::new(NodeKey::Mac(MacAddress::new("aa:00:00:00:00:02")), "test");
        node.name = Some(name.to_owned());
        node.role = Some(NodeRole::Relay);
        node.gateway_name = Some(gateway_name.to_owned());
        node
    }

    // ── Status code decoding ─────────────────────────────────────────

    #[test]
    fn decodes_all_known_status_codes() {
        let cases = [
            ("1", NodeRole::Gateway, LinkState::Down),
            ("2", NodeRole::Relay, LinkState::Down),
            ("3", NodeRole::Gateway, LinkState::Up),
            ("4", NodeRole::Relay, LinkState::Up),
            ("5", NodeRole::Spare, LinkState::Down),
            ("6", NodeRole::Spare, LinkState::Down),
            ("7", NodeRole::Spare, LinkState::Up),
            ("8", NodeRole::Spare, LinkState::Up),
        ];
        for (code, role, state) in cases {
            let status = NodeStatus::from_dashboard_code(code).expect(code);
            assert_eq!(status.role, role, "code {code}");
            assert_eq!(status.state, state, "code {code}");
        }
    }

    #[test]
    fn unknown_status_code_is_none() {
        assert!(NodeStatus::from_dashboard_code("9").is_none());
        assert!(NodeStatus::from_dashboard_code("").is_none());
        assert!(NodeStatus::from_dashboard_code("gw").is_none());
    }

    // ── Usage sentinels ──────────────────────────────────────────────

    #[test]
    fn gateway_usage_returns_self_sentinel() {
        let mut node = gateway("gate-a");
        assert_eq!(node.add_usage(100, 10), UpstreamGateway::SelfGateway);
        assert_eq!(node.usage.download_kb, 100);
        assert_eq!(node.usage.clients, 1);
        // Self traffic does not touch gateway-only counters here.
        assert_eq!(node.usage.gateway_download_kb, 0);
    }

    #[test]
    fn relay_usage_names_its_gateway() {
        let mut node = relay("attic", "gate-a");
        assert_eq!(
            node.add_usage(50, 5),
            UpstreamGateway::Named("gate-a".to_owned())
        );
    }

    #[test]
    fn relay_without_gateway_is_not_reported() {
        let mut node = relay("attic", "gate-a");
        node.gateway_name = None;
        assert_eq!(node.add_usage(50, 5), UpstreamGateway::NotReported);

        node.gateway_name = Some(String::new());
        assert_eq!(node.add_usage(50, 5), UpstreamGateway::NotReported);
    }

    #[test]
    fn carried_usage_keeps_gateway_within_totals() {
        let mut node = gateway("gate-a");
        node.add_usage(100, 10);
        node.add_carried_usage(40, 4);

        assert_eq!(node.usage.download_kb, 140);
        assert_eq!(node.usage.gateway_download_kb, 40);
        assert!(node.usage.gateway_download_kb <= node.usage.download_kb);
        assert!(node.usage.gateway_upload_kb <= node.usage.upload_kb);
    }

    // ── Checkin merging ──────────────────────────────────────────────

    #[test]
    fn checkin_merges_status_and_speed_by_timestamp() {
        let mut node = gateway("gate-a");
        let t = DateTime::parse_from_rfc3339("2024-06-15T00:00:00Z")
            .expect("time")
            .with_timezone(&Utc);

        node.add_checkin(t, Some("gateway".into()), None);
        node.add_checkin(t, None, Some(18.5));

        assert_eq!(node.checkins.len(), 1);
        let sample = node.checkins.get(&t).expect("sample");
        assert_eq!(sample.status.as_deref(), Some("gateway"));
        assert_eq!(sample.speed, Some(18.5));
    }

    #[test]
    fn status_counts_track_missing_checkins_as_none() {
        let mut node = gateway("gate-a");
        let base = DateTime::parse_from_rfc3339("2024-06-15T00:00:00Z")
            .expect("time")
            .with_timezone(&Utc);

        node.add_checkin(base, Some("gateway".into()), None);
        node.add_checkin(base + chrono::Duration::minutes(5), Some("gateway".into()), None);
        node.add_checkin(base + chrono::Duration::minutes(10), None, None);

        let counts = node.status_counts();
        assert_eq!(counts.get("gateway"), Some(&2));
        assert_eq!(counts.get("none"), Some(&1));
    }

    // ── Alerting ─────────────────────────────────────────────────────

    #[test]
    fn down_node_alerts_under_down_flag_policy() {
        let mut node = relay("attic", "gate-a");
        node.down = true;
        assert!(node.is_alerting(AlertPolicy::default()));

        node.down = false;
        assert!(!node.is_alerting(AlertPolicy::default()));
    }

    #[test]
    fn spare_does_not_alert_unless_policy_includes_spares() {
        let mut node = relay("attic", "gate-a");
        node.role = Some(NodeRole::Spare);
        node.spare = true;
        node.down = true;

        assert!(!node.is_alerting(AlertPolicy::default()));
        assert!(node.is_alerting(AlertPolicy {
            include_spares: true,
            ..AlertPolicy::default()
        }));
    }

    #[test]
    fn offline_time_policy_reads_the_timeline() {
        let mut node = relay("attic", "gate-a");
        let policy = AlertPolicy {
            trigger: AlertTrigger::OfflineTime,
            include_spares: false,
        };

        assert!(!node.is_alerting(policy), "no timeline yet");

        node.timeline = Some(CheckinBreakdown {
            gateway_pct: 0.0,
            relay_pct: 95.0,
            offline_pct: 5.0,
        });
        assert!(node.is_alerting(policy));
    }

    // ── API entry decoding ───────────────────────────────────────────

    #[test]
    fn from_entry_decodes_role_and_flags() {
        let entry: NodeEntry = serde_json::from_value(json!({
            "name": "gate-a",
            "role": "gateway",
            "mac": "AA:00:00:00:00:01",
            "down": false,
            "flags": "0x2b",
            "firmware_version": "6.2.1",
        }))
        .expect("decode");

        let node = Node::from_entry(42, "7", entry);
        assert_eq!(node.key, NodeKey::Id(42));
        assert!(node.is_gateway());
        assert_eq!(node.flags, Some(0x2b));
        assert_eq!(node.mac.as_ref().map(MacAddress::as_str), Some("aa:00:00:00:00:01"));
    }

    #[test]
    fn from_entry_spare_flag_wins_over_role() {
        let entry: NodeEntry = serde_json::from_value(json!({
            "role": "repeater",
            "spare": true,
        }))
        .expect("decode");

        let node = Node::from_entry(1, "7", entry);
        assert_eq!(node.role, Some(NodeRole::Spare));
        assert!(node.is_spare());
    }
}
