// The in-memory aggregation state for one collection run.
//
// Survey owns the entity maps and every merge rule: node upserts, client
// volume merging by MAC, usage attribution to access nodes and upstream
// gateways, and the derived summary quantities. It is pure state -- the
// collectors drive it from whichever remote surface they speak.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use tracing::debug;

use meshly_api::models::NodeHistoryEntry;

use crate::model::{AlertPolicy, Client, MacAddress, Network, Node, NodeKey, UpstreamGateway};

/// Aggregation policy knobs left configurable because the historical
/// behavior differed between data surfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationPolicy {
    /// What makes a node alerting.
    pub alert: AlertPolicy,
    /// Whether a gateway's own directly-attached clients also count into
    /// its gateway-only counters. Off by default: internet-bound traffic
    /// is credited to a gateway only when it carried it for another node.
    pub count_self_traffic: bool,
}

/// Running usage totals across all merged client observations, kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub download_kb: u64,
    pub upload_kb: u64,
}

/// Derived summary quantities for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub networks: usize,
    pub nodes: usize,
    pub clients: usize,
    pub alerting: usize,
    /// Nodes excluded from categorized reporting because their status
    /// code was unrecognized.
    pub omitted: usize,
    pub total_download_mb: f64,
    pub total_upload_mb: f64,
}

/// Entity maps and merge logic for one collection run.
///
/// Everything is rebuilt from scratch each run; only external storage
/// carries identity across runs.
#[derive(Debug, Default)]
pub struct Survey {
    policy: AggregationPolicy,
    networks: BTreeMap<i64, Network>,
    nodes: BTreeMap<NodeKey, Node>,
    clients: BTreeMap<MacAddress, Client>,
    usage: UsageTotals,
}

impl Survey {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    // ── Networks ─────────────────────────────────────────────────────

    /// Replace the network map wholesale -- networks are snapshots, the
    /// latest fetch wins.
    pub fn replace_networks(&mut self, networks: impl IntoIterator<Item = Network>) {
        self.networks = networks.into_iter().map(|n| (n.id, n)).collect();
    }

    /// Drop networks the predicate rejects (scope filtering before the
    /// per-network passes run).
    pub fn retain_networks(&mut self, mut keep: impl FnMut(&Network) -> bool) {
        self.networks.retain(|_, n| keep(n));
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn network_ids(&self) -> Vec<i64> {
        self.networks.keys().copied().collect()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// Insert or replace a node by its key.
    pub fn upsert_node(&mut self, node: Node) {
        self.nodes.insert(node.key.clone(), node);
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find a node's key by display name (gateway escalation resolves by
    /// the name the relay reported).
    fn node_key_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes
            .values()
            .find(|n| n.name.as_deref() == Some(name))
            .map(|n| n.key.clone())
    }

    /// Attach a pixel-derived timeline breakdown to a node.
    ///
    /// Returns `false` when the node is unknown.
    pub fn set_node_timeline(
        &mut self,
        key: &NodeKey,
        timeline: crate::checkin::CheckinBreakdown,
    ) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.timeline = Some(timeline);
                true
            }
            None => false,
        }
    }

    /// Merge one node's history slice (checkins, traffic, metrics).
    ///
    /// Returns `false` when the node id is unknown -- history for nodes
    /// that vanished between passes is skipped, not fatal.
    pub fn merge_node_history(&mut self, key: &NodeKey, entry: NodeHistoryEntry) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        for checkin in entry.checkins {
            node.add_checkin(checkin.time, checkin.status, checkin.speed);
        }
        node.traffic.extend(entry.traffic);
        for metric in entry.metrics {
            node.add_checkin(metric.time, None, metric.speed);
        }
        true
    }

    // ── Clients ──────────────────────────────────────────────────────

    /// Record one client observation.
    ///
    /// Merges by MAC (volumes add, observation counter increments),
    /// accumulates the run totals, and attributes the same volume to the
    /// client's last-seen node -- escalating to that node's upstream
    /// gateway only when the node names a distinct, known gateway.
    pub fn record_client(&mut self, client: Client) {
        let download_kb = client.download_kb;
        let upload_kb = client.upload_kb;
        let node_key = client
            .node_mac
            .clone()
            .map(NodeKey::Mac)
            .or(client.last_node.map(NodeKey::Id));

        match self.clients.entry(client.mac.clone()) {
            Entry::Occupied(mut existing) => {
                debug!(mac = %client.mac, "merging repeated client observation");
                existing.get_mut().merge_usage(download_kb, upload_kb);
            }
            Entry::Vacant(slot) => {
                slot.insert(client);
            }
        }

        self.usage.download_kb += download_kb;
        self.usage.upload_kb += upload_kb;

        let Some(node_key) = node_key else {
            debug!("client observation without a node reference");
            return;
        };
        let upstream = match self.nodes.get_mut(&node_key) {
            Some(node) => node.add_usage(download_kb, upload_kb),
            None => {
                debug!(node = %node_key, "client's node not found, usage not attributed");
                return;
            }
        };

        match upstream {
            UpstreamGateway::SelfGateway => {
                if self.policy.count_self_traffic {
                    if let Some(node) = self.nodes.get_mut(&node_key) {
                        node.add_gateway_usage(download_kb, upload_kb);
                    }
                }
            }
            UpstreamGateway::Named(name) => {
                let gateway_key = self.node_key_by_name(&name).filter(|k| *k != node_key);
                match gateway_key.and_then(|k| self.nodes.get_mut(&k)) {
                    Some(gateway) if gateway.is_gateway() => {
                        gateway.add_carried_usage(download_kb, upload_kb);
                    }
                    _ => debug!(gateway = %name, "upstream gateway not found or not a gateway"),
                }
            }
            UpstreamGateway::NotReported => {}
        }
    }

    pub fn client(&self, mac: &MacAddress) -> Option<&Client> {
        self.clients.get(mac)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // ── Derived quantities ───────────────────────────────────────────

    pub fn usage(&self) -> UsageTotals {
        self.usage
    }

    /// Nodes whose status code the source rendered outside the known set.
    pub fn omitted(&self) -> usize {
        self.nodes.values().filter(|n| n.role.is_none()).count()
    }

    /// Nodes currently satisfying the alerting predicate.
    pub fn alerting(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.is_alerting(self.policy.alert))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            networks: self.networks.len(),
            nodes: self.nodes.len(),
            clients: self.clients.len(),
            alerting: self.alerting().len(),
            omitted: self.omitted(),
            total_download_mb: self.usage.download_kb as f64 / 1000.0,
            total_upload_mb: self.usage.upload_kb as f64 / 1000.0,
        }
    }
}
