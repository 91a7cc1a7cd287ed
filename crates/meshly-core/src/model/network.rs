// ── Network domain type ──

use serde::{Deserialize, Serialize};

use meshly_api::models::NetworkEntry;

/// One managed mesh network, as an immutable snapshot per collection cycle.
///
/// Networks are replaced wholesale on every fetch of the list endpoint;
/// there is no cross-cycle merging at the network level -- the latest
/// observation wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub node_count: Option<u32>,
    pub new_nodes: Option<u32>,
    pub spare_nodes: Option<u32>,
    pub down_gateway: Option<u32>,
    pub down_repeater: Option<u32>,
    pub is_fcc: Option<bool>,
    /// (latitude, longitude) of the network's nominal location.
    pub location: (Option<f64>, Option<f64>),
    pub latest_firmware_version: Option<String>,
}

impl From<NetworkEntry> for Network {
    fn from(entry: NetworkEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            node_count: entry.node_count,
            new_nodes: entry.new_nodes,
            spare_nodes: entry.spare_nodes,
            down_gateway: entry.down_gateway,
            down_repeater: entry.down_repeater,
            is_fcc: entry.is_fcc,
            location: (entry.latitude, entry.longitude),
            latest_firmware_version: entry.latest_firmware_version,
        }
    }
}
