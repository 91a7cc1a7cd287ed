// Signed-API collection driver.
//
// Drives the four collection passes against the signed REST surface in
// strict order: networks, nodes, node history, clients. Every fetch is a
// sequential call -- there is no parallelism across networks, and a fetch
// failure aborts the whole run with no partial results.

use tracing::{info, warn};

use meshly_api::SignedClient;

use crate::error::CoreError;
use crate::model::{Client, MacAddress, Network, Node, NodeKey};
use crate::survey::{AggregationPolicy, Survey};

/// History period requested from the history endpoints.
const DEFAULT_PERIOD: &str = "day";

/// Collects a full survey from the signed REST API.
pub struct Collector {
    api: SignedClient,
    survey: Survey,
    period: String,
}

impl Collector {
    pub fn new(api: SignedClient, policy: AggregationPolicy) -> Self {
        Self {
            api,
            survey: Survey::new(policy),
            period: DEFAULT_PERIOD.into(),
        }
    }

    /// Override the history period (`day`, `month`, `year`).
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn into_survey(self) -> Survey {
        self.survey
    }

    /// Restrict the remaining passes to one network by name. Call after
    /// [`Collector::collect_networks`].
    pub fn scope_to_network(&mut self, name: &str) {
        self.survey.retain_networks(|n| n.name == name);
        info!(
            "scoped to network {name}: {} remaining",
            self.survey.network_count()
        );
    }

    /// Run all collection passes in order.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        self.collect_networks().await?;
        self.collect_nodes().await?;
        self.collect_node_history().await?;
        self.collect_clients().await
    }

    /// Fetch the network list and replace the network map wholesale.
    pub async fn collect_networks(&mut self) -> Result<(), CoreError> {
        let resp = self.api.list_networks().await?;
        info!("got {} networks", resp.networks.len());
        self.survey
            .replace_networks(resp.networks.into_iter().map(Network::from));
        Ok(())
    }

    /// Fetch the node list of every known network.
    pub async fn collect_nodes(&mut self) -> Result<(), CoreError> {
        for network_id in self.survey.network_ids() {
            let resp = self.api.list_nodes(network_id).await?;
            info!("got {} nodes for network {}", resp.nodes.len(), network_id);
            for (raw_id, entry) in resp.nodes {
                match raw_id.parse::<i64>() {
                    Ok(id) => {
                        self.survey
                            .upsert_node(Node::from_entry(id, network_id.to_string(), entry));
                    }
                    Err(_) => warn!(%raw_id, "non-numeric node id, skipping"),
                }
            }
        }
        Ok(())
    }

    /// Fetch checkin/traffic/metric history and merge it into known nodes.
    pub async fn collect_node_history(&mut self) -> Result<(), CoreError> {
        for network_id in self.survey.network_ids() {
            let resp = self.api.node_history(network_id, &self.period).await?;
            for (raw_id, entry) in resp.nodes {
                let Ok(id) = raw_id.parse::<i64>() else {
                    warn!(%raw_id, "non-numeric node id in history, skipping");
                    continue;
                };
                if !self.survey.merge_node_history(&NodeKey::Id(id), entry) {
                    info!("node id {id} not found, skipping its history");
                }
            }
        }
        Ok(())
    }

    /// Fetch the client history of every known network and merge each
    /// record into the survey.
    pub async fn collect_clients(&mut self) -> Result<(), CoreError> {
        for network_id in self.survey.network_ids() {
            let resp = self.api.client_history(network_id).await?;
            info!(
                "got {} clients for network {}",
                resp.clients.len(),
                network_id
            );
            for (mac, entry) in resp.clients {
                let client =
                    Client::from_entry(MacAddress::new(mac), network_id.to_string(), entry);
                self.survey.record_client(client);
            }
        }
        Ok(())
    }
}
