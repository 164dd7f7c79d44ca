use serde::{Deserialize, Serialize};

use crate::parsers::bgp_ls::record::{Attributes, LinkLsa};

/// A directed adjacency, created once per Link record and never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyEdge {
    /// Position of the originating Link record among all Link records.
    pub seq: usize,
    pub cost: u32,
    pub remote_is_pseudonode: bool,
    /// Router IDs as advertised, unaffected by relabeling.
    pub local_router_id: String,
    pub remote_router_id: String,
    pub raw_attributes: Attributes,
}

impl TopologyEdge {
    pub fn from_link(seq: usize, local: &str, remote: &str, lsa: &LinkLsa) -> Self {
        Self {
            seq,
            cost: lsa.cost(),
            remote_is_pseudonode: lsa.remote_is_pseudonode,
            local_router_id: local.to_string(),
            remote_router_id: remote.to_string(),
            raw_attributes: lsa.link_attributes.clone(),
        }
    }

    /// Edge label in the form renderers have always shown it.
    pub fn cost_label(&self) -> String {
        format!("Cost: {}", self.cost)
    }
}
