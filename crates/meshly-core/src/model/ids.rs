// ── Core identity types ──
//
// MacAddress and NodeKey form the foundation of the entity maps. A node is
// keyed by its MAC address on the dashboard surface and by a numeric id on
// the signed API; NodeKey unifies both behind a single ordered key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated form (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── NodeKey ─────────────────────────────────────────────────────────

/// Stable identity of a node within one collection run.
///
/// The dashboard identifies nodes by MAC; the signed API by numeric id.
/// Both key the same map -- a run only ever uses one surface, so the two
/// variants never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Id(i64),
    Mac(MacAddress),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Mac(mac) => write!(f, "{mac}"),
        }
    }
}

impl From<i64> for NodeKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<MacAddress> for NodeKey {
    fn from(mac: MacAddress) -> Self {
        Self::Mac(mac)
    }
}
