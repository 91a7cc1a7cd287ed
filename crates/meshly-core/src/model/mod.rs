// Domain model: identity types, networks, nodes, clients.

mod client;
mod ids;
mod network;
mod node;

pub use client::Client;
pub use ids::{MacAddress, NodeKey};
pub use network::Network;
pub use node::{
    AlertPolicy, AlertTrigger, Checkin, LinkState, Node, NodeRole, NodeStatus, NodeUsage,
    UpstreamGateway,
};
