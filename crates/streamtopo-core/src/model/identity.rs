// ── Core identity types ──
//
// Dpid and Mac are the stable identities of the topology. Every index,
// link endpoint, and stream binding is keyed by one of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Dpid ────────────────────────────────────────────────────────────

/// Switch datapath id: an opaque hex string.
///
/// Ordered and compared as a string. The controller zero-pads dpids to a
/// fixed width, so string order matches numeric order for its output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dpid(String);

impl Dpid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form with leading zeros stripped (`"0000000000000001"` -> `"1"`).
    pub fn trimmed(&self) -> &str {
        trim_zero(&self.0)
    }

    /// Numeric value of the hex id, `None` if it is not valid hex.
    pub fn to_int(&self) -> Option<u64> {
        u64::from_str_radix(&self.0, 16).ok()
    }
}

impl fmt::Display for Dpid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Dpid {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Dpid {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Mac ─────────────────────────────────────────────────────────────

/// Host MAC address, normalized to lowercase colon-separated form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mac(String);

impl Mac {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_lowercase().replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Mac {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Mac {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── PortNo ──────────────────────────────────────────────────────────

/// Switch port number exactly as the controller reported it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNo(String);

impl PortNo {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn trimmed(&self) -> &str {
        trim_zero(&self.0)
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortNo {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<u32> for PortNo {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

// ── StreamId ────────────────────────────────────────────────────────

/// Logical data-stream identifier. Ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u32);

impl StreamId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for StreamId {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

// ── NodeKey ─────────────────────────────────────────────────────────

/// Stable identity of a node in the topology.
///
/// Switches and hosts live in separate namespaces, so a host MAC can never
/// shadow a switch dpid in the node index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum NodeKey {
    Switch(Dpid),
    Host(Mac),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch(dpid) => write!(f, "switch:{dpid}"),
            Self::Host(mac) => write!(f, "host:{mac}"),
        }
    }
}

fn trim_zero(s: &str) -> &str {
    let trimmed = s.trim_start_matches('0');
    if trimmed.is_empty() && !s.is_empty() {
        "0"
    } else {
        trimmed
    }
}
