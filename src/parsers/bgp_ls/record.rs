/*!
Classified BGP-LS records.

These are the records the topology builder consumes. They are already reduced from
full NLRI + LS attribute payloads to the handful of fields the graph needs, and
tagged by `"type"` (`Node`, `Link`, `Prefix`) when serialized.

A record whose tag is not one of the three known kinds still decodes, as
`LsaRecord::Unrecognized`, so that rejection happens in the builder with the
record's position attached instead of failing the whole snapshot decode.
*/

use std::{fmt::Display, str::FromStr};

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque attribute bag carried through from the routing daemon.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Node,
    Link,
    Prefix,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Node => write!(f, "Node"),
            RecordKind::Link => write!(f, "Link"),
            RecordKind::Prefix => write!(f, "Prefix"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Node" => Ok(RecordKind::Node),
            "Link" => Ok(RecordKind::Link),
            "Prefix" => Ok(RecordKind::Prefix),
            other => Err(format!("unknown LSA record kind: {other}")),
        }
    }
}

/// Node NLRI, optionally with a hostname from the node attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLsa {
    #[serde(default)]
    pub igp_router_id: String,
    #[serde(default)]
    pub is_pseudonode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_attributes: Option<Attributes>,
}

impl NodeLsa {
    pub fn router_id(&self) -> Option<&str> {
        non_blank(&self.igp_router_id)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(non_blank)
    }
}

/// Link NLRI. The remote pseudonode flag comes from the remote node descriptor
/// embedded in the link advertisement itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkLsa {
    #[serde(default)]
    pub local_igp_router_id: String,
    #[serde(default)]
    pub remote_igp_router_id: String,
    #[serde(default)]
    pub remote_is_pseudonode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
    #[serde(default)]
    pub link_attributes: Attributes,
}

impl LinkLsa {
    pub fn local_router_id(&self) -> Option<&str> {
        non_blank(&self.local_igp_router_id)
    }

    pub fn remote_router_id(&self) -> Option<&str> {
        non_blank(&self.remote_igp_router_id)
    }

    /// IGP metric of the link, `0` when none was advertised.
    pub fn cost(&self) -> u32 {
        self.metric.unwrap_or(0)
    }
}

/// Prefix NLRI owned by the advertising node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixLsa {
    #[serde(default)]
    pub owner_igp_router_id: String,
    #[serde(default)]
    pub prefix_attributes: Attributes,
}

impl PrefixLsa {
    pub fn owner_router_id(&self) -> Option<&str> {
        non_blank(&self.owner_igp_router_id)
    }

    /// Networks listed under `ipReachability`. Accepts a single string or a list;
    /// entries that don't parse as a network are skipped.
    pub fn ip_reachability(&self) -> Vec<IpNetwork> {
        match self.prefix_attributes.get("ipReachability") {
            Some(Value::String(s)) => s.parse().ok().into_iter().collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse().ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordWire", into = "RecordWire")]
pub enum LsaRecord {
    Node(NodeLsa),
    Link(LinkLsa),
    Prefix(PrefixLsa),
    /// Tag was unknown, or the tag was known but the fields didn't decode.
    /// `kind` is empty when the record had no tag.
    Unrecognized { kind: String },
}

impl LsaRecord {
    pub fn kind(&self) -> Option<RecordKind> {
        match self {
            LsaRecord::Node(_) => Some(RecordKind::Node),
            LsaRecord::Link(_) => Some(RecordKind::Link),
            LsaRecord::Prefix(_) => Some(RecordKind::Prefix),
            LsaRecord::Unrecognized { .. } => None,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<NodeLsa> for LsaRecord {
    fn from(value: NodeLsa) -> Self {
        LsaRecord::Node(value)
    }
}

impl From<LinkLsa> for LsaRecord {
    fn from(value: LinkLsa) -> Self {
        LsaRecord::Link(value)
    }
}

impl From<PrefixLsa> for LsaRecord {
    fn from(value: PrefixLsa) -> Self {
        LsaRecord::Prefix(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecordWire {
    Known(KnownRecord),
    Other {
        #[serde(rename = "type")]
        kind: String,
    },
    /// `"type"` missing or not a string.
    Untyped(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum KnownRecord {
    Node(NodeLsa),
    Link(LinkLsa),
    Prefix(PrefixLsa),
}

impl From<RecordWire> for LsaRecord {
    fn from(wire: RecordWire) -> Self {
        match wire {
            RecordWire::Known(KnownRecord::Node(n)) => LsaRecord::Node(n),
            RecordWire::Known(KnownRecord::Link(l)) => LsaRecord::Link(l),
            RecordWire::Known(KnownRecord::Prefix(p)) => LsaRecord::Prefix(p),
            RecordWire::Other { kind } => LsaRecord::Unrecognized { kind },
            RecordWire::Untyped(value) => LsaRecord::Unrecognized {
                kind: value.get("type").map(Value::to_string).unwrap_or_default(),
            },
        }
    }
}

impl From<LsaRecord> for RecordWire {
    fn from(record: LsaRecord) -> Self {
        match record {
            LsaRecord::Node(n) => RecordWire::Known(KnownRecord::Node(n)),
            LsaRecord::Link(l) => RecordWire::Known(KnownRecord::Link(l)),
            LsaRecord::Prefix(p) => RecordWire::Known(KnownRecord::Prefix(p)),
            LsaRecord::Unrecognized { kind } => RecordWire::Other { kind },
        }
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
