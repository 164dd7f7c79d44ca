use std::cmp::Ordering;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parsers::bgp_ls::record::{Attributes, NodeLsa, PrefixLsa};

/// Where a node's pseudonode flag came from. Ordered by authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PseudonodeOrigin {
    /// Never stated; the node was registered implicitly.
    Default,
    /// Taken from the remote node descriptor of a Link record.
    LinkDescriptor,
    /// Declared by a Node record.
    NodeRecord,
}

/// A prefix advertised by the node that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedPrefix {
    pub networks: Vec<IpNetwork>,
    pub attributes: Attributes,
}

impl From<&PrefixLsa> for AttachedPrefix {
    fn from(lsa: &PrefixLsa) -> Self {
        Self {
            networks: lsa.ip_reachability(),
            attributes: lsa.prefix_attributes.clone(),
        }
    }
}

/// Represents a router or pseudonode in the topology graph.
///
/// `id` is the node's current identity: the IGP Router ID until the display-name
/// remap runs, the display name afterwards. `router_id` and `uuid` never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: String,
    pub router_id: String,
    pub uuid: Uuid,
    pub is_pseudonode: bool,
    pub pseudonode_origin: PseudonodeOrigin,
    pub display_name: Option<String>,
    pub attached_prefixes: Vec<AttachedPrefix>,
    pub raw_attributes: Attributes,
}

impl TopologyNode {
    pub fn new(router_id: &str) -> Self {
        Self {
            id: router_id.to_string(),
            router_id: router_id.to_string(),
            uuid: router_id_to_uuidv5(router_id),
            is_pseudonode: false,
            pseudonode_origin: PseudonodeOrigin::Default,
            display_name: None,
            attached_prefixes: Vec::new(),
            raw_attributes: Attributes::new(),
        }
    }

    /// Folds a Node record into this node. The name and attribute keys of the
    /// latest record win; the pseudonode flag stays set once any record declared it.
    pub fn apply_node_record(&mut self, lsa: &NodeLsa) {
        if self.pseudonode_origin == PseudonodeOrigin::NodeRecord {
            self.is_pseudonode |= lsa.is_pseudonode;
        } else {
            self.is_pseudonode = lsa.is_pseudonode;
            self.pseudonode_origin = PseudonodeOrigin::NodeRecord;
        }
        if let Some(name) = lsa.display_name() {
            self.display_name = Some(name.to_string());
        }
        if let Some(attributes) = &lsa.node_attributes {
            for (key, value) in attributes {
                self.raw_attributes.insert(key.clone(), value.clone());
            }
        }
    }

    /// Records the pseudonode flag a Link record carries for this node as its remote
    /// endpoint. A flag declared by a Node record is left alone unless `override_declared`.
    pub fn apply_link_descriptor(&mut self, is_pseudonode: bool, override_declared: bool) {
        match self.pseudonode_origin {
            PseudonodeOrigin::NodeRecord if !override_declared => {}
            PseudonodeOrigin::LinkDescriptor => self.is_pseudonode |= is_pseudonode,
            _ => {
                self.is_pseudonode = is_pseudonode;
                self.pseudonode_origin = PseudonodeOrigin::LinkDescriptor;
            }
        }
    }

    pub fn attach_prefix(&mut self, prefix: AttachedPrefix) {
        self.attached_prefixes.push(prefix);
    }

    /// Merges a node that lost an identity clash into this one. This node's
    /// attribute values win conflicts; the other node's prefixes are appended.
    /// The pseudonode flag comes from whichever side has the more authoritative
    /// origin, and is OR-ed when both origins are equal.
    pub fn absorb(&mut self, other: TopologyNode) {
        match self.pseudonode_origin.cmp(&other.pseudonode_origin) {
            Ordering::Less => {
                self.is_pseudonode = other.is_pseudonode;
                self.pseudonode_origin = other.pseudonode_origin;
            }
            Ordering::Equal => self.is_pseudonode |= other.is_pseudonode,
            Ordering::Greater => {}
        }
        if self.display_name.is_none() {
            self.display_name = other.display_name;
        }
        self.attached_prefixes.extend(other.attached_prefixes);
        for (key, value) in other.raw_attributes {
            self.raw_attributes.entry(key).or_insert(value);
        }
    }

    /// True when the identity was replaced by a display name.
    pub fn is_relabeled(&self) -> bool {
        self.id != self.router_id
    }
}

pub fn router_id_to_uuidv5(router_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, router_id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_lsa(id: &str, pseudonode: bool, name: Option<&str>) -> NodeLsa {
        NodeLsa {
            igp_router_id: id.to_string(),
            is_pseudonode: pseudonode,
            name: name.map(str::to_string),
            node_attributes: None,
        }
    }

    #[test]
    fn test_new_node_defaults() {
        let node = TopologyNode::new("10.0.0.1");
        assert_eq!(node.id, "10.0.0.1");
        assert!(!node.is_pseudonode);
        assert_eq!(node.pseudonode_origin, PseudonodeOrigin::Default);
        assert_eq!(node.uuid, router_id_to_uuidv5("10.0.0.1"));
        assert_ne!(node.uuid, router_id_to_uuidv5("10.0.0.2"));
    }

    #[test]
    fn test_node_record_pseudonode_is_sticky() {
        let mut node = TopologyNode::new("r9");
        node.apply_node_record(&node_lsa("r9", true, None));
        node.apply_node_record(&node_lsa("r9", false, None));
        assert!(node.is_pseudonode);
        assert_eq!(node.pseudonode_origin, PseudonodeOrigin::NodeRecord);
    }

    #[test]
    fn test_last_name_and_attributes_win() {
        let mut node = TopologyNode::new("r1");
        let mut first = node_lsa("r1", false, Some("old"));
        first.node_attributes = Some(
            json!({ "isisArea": "49.0001", "flags": 1 })
                .as_object()
                .unwrap()
                .clone(),
        );
        let mut second = node_lsa("r1", false, None);
        second.node_attributes = Some(json!({ "flags": 2 }).as_object().unwrap().clone());
        let third = node_lsa("r1", false, Some("new"));

        node.apply_node_record(&first);
        node.apply_node_record(&second);
        assert_eq!(node.display_name.as_deref(), Some("old"));
        node.apply_node_record(&third);

        assert_eq!(node.display_name.as_deref(), Some("new"));
        assert_eq!(node.raw_attributes["isisArea"], "49.0001");
        assert_eq!(node.raw_attributes["flags"], 2);
    }

    #[test]
    fn test_declared_flag_beats_link_descriptor() {
        let mut node = TopologyNode::new("r9");
        node.apply_node_record(&node_lsa("r9", false, None));
        node.apply_link_descriptor(true, false);
        assert!(!node.is_pseudonode);

        node.apply_link_descriptor(true, true);
        assert!(node.is_pseudonode);
        assert_eq!(node.pseudonode_origin, PseudonodeOrigin::LinkDescriptor);
    }

    #[test]
    fn test_link_descriptor_for_implicit_node() {
        let mut node = TopologyNode::new("r9");
        node.apply_link_descriptor(true, false);
        node.apply_link_descriptor(false, false);
        assert!(node.is_pseudonode);
        assert_eq!(node.pseudonode_origin, PseudonodeOrigin::LinkDescriptor);
    }

    #[test]
    fn test_absorb_keeps_survivor_values() {
        let mut survivor = TopologyNode::new("r2");
        survivor.raw_attributes.insert("name".into(), json!("R"));
        let mut loser = TopologyNode::new("r1");
        loser.raw_attributes.insert("name".into(), json!("other"));
        loser.raw_attributes.insert("area".into(), json!(1));
        loser.is_pseudonode = true;
        loser.pseudonode_origin = PseudonodeOrigin::NodeRecord;
        loser.attach_prefix(AttachedPrefix {
            networks: vec!["10.0.0.0/8".parse().unwrap()],
            attributes: Attributes::new(),
        });

        loser.display_name = Some("R".into());

        survivor.absorb(loser);
        assert_eq!(survivor.display_name.as_deref(), Some("R"));
        assert_eq!(survivor.raw_attributes["name"], "R");
        assert_eq!(survivor.raw_attributes["area"], 1);
        assert!(survivor.is_pseudonode);
        assert_eq!(survivor.pseudonode_origin, PseudonodeOrigin::NodeRecord);
        assert_eq!(survivor.attached_prefixes.len(), 1);
    }

    #[test]
    fn test_absorb_declared_flag_beats_link_descriptor() {
        let mut implicit = TopologyNode::new("X");
        implicit.apply_link_descriptor(true, false);
        let mut declared = TopologyNode::new("A");
        declared.apply_node_record(&node_lsa("A", false, Some("X")));

        implicit.absorb(declared);
        assert!(!implicit.is_pseudonode);
        assert_eq!(implicit.pseudonode_origin, PseudonodeOrigin::NodeRecord);
        assert_eq!(implicit.display_name.as_deref(), Some("X"));

        // equal authority: flags are OR-ed
        let mut a = TopologyNode::new("a");
        a.apply_link_descriptor(false, false);
        let mut b = TopologyNode::new("b");
        b.apply_link_descriptor(true, false);
        a.absorb(b);
        assert!(a.is_pseudonode);
        assert_eq!(a.pseudonode_origin, PseudonodeOrigin::LinkDescriptor);
    }
}
