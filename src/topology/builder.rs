/*!
LSDB to topology graph.

The builder makes three passes over the records:
1. Node records register nodes and their pseudonode flag, name and attributes.
2. Link records add one edge each and Prefix records attach to their owner; endpoints
   and owners that were never declared are registered on the fly.
3. Nodes that carry a display name are relabeled to it.

All records are validated before the first pass, so a malformed record never leaves
a half-built graph behind.
*/

use tracing::{debug, info};

use crate::{
    network::{
        edge::TopologyEdge,
        node::{AttachedPrefix, TopologyNode},
        topology_graph::TopologyGraph,
    },
    parsers::bgp_ls::record::{LinkLsa, LsaRecord, NodeLsa, PrefixLsa, RecordKind},
    topology::error::MalformedRecordError,
};

/// Which record decides a node's pseudonode flag when a Node record and a Link's
/// remote descriptor disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PseudonodePrecedence {
    /// The Node record decides; Link descriptors only inform undeclared nodes.
    #[default]
    PreferNodeRecord,
    /// The Link descriptor overrides whatever the Node record said.
    PreferLinkDescriptor,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    apply_display_names: bool,
    pseudonode_precedence: PseudonodePrecedence,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            apply_display_names: true,
            pseudonode_precedence: PseudonodePrecedence::default(),
        }
    }
}

impl BuildConfig {
    pub fn new(apply_display_names: bool, pseudonode_precedence: PseudonodePrecedence) -> Self {
        Self {
            apply_display_names,
            pseudonode_precedence,
        }
    }
    pub fn apply_display_names(&self) -> bool {
        self.apply_display_names
    }
    pub fn set_apply_display_names(&mut self, apply: bool) {
        self.apply_display_names = apply;
    }
    pub fn pseudonode_precedence(&self) -> PseudonodePrecedence {
        self.pseudonode_precedence
    }
    pub fn set_pseudonode_precedence(&mut self, precedence: PseudonodePrecedence) {
        self.pseudonode_precedence = precedence;
    }
}

/// A record that passed validation, with its router IDs resolved.
enum Checked<'a> {
    Node {
        router_id: &'a str,
        lsa: &'a NodeLsa,
    },
    Link {
        local: &'a str,
        remote: &'a str,
        lsa: &'a LinkLsa,
    },
    Prefix {
        owner: &'a str,
        lsa: &'a PrefixLsa,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    config: BuildConfig,
}

impl TopologyBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, records: &[LsaRecord]) -> Result<TopologyGraph, MalformedRecordError> {
        let checked = check_records(records)?;
        let mut graph = TopologyGraph::default();

        self.register_nodes(&mut graph, &checked);
        self.attach_links_and_prefixes(&mut graph, &checked);

        if self.config.apply_display_names {
            let collisions = graph.remap_identities(display_identity);
            debug!(collisions = collisions.len(), "applied display names");
        }

        info!(
            records = records.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built topology"
        );
        Ok(graph)
    }

    fn register_nodes(&self, graph: &mut TopologyGraph, checked: &[Checked<'_>]) {
        let mut declared = 0usize;
        for record in checked {
            if let Checked::Node { router_id, lsa } = record {
                let index = graph.ensure_node(router_id);
                graph.node_at_mut(index).apply_node_record(lsa);
                declared += 1;
            }
        }
        debug!(
            declared,
            nodes = graph.node_count(),
            "registered declared nodes"
        );
    }

    fn attach_links_and_prefixes(&self, graph: &mut TopologyGraph, checked: &[Checked<'_>]) {
        let override_declared =
            self.config.pseudonode_precedence == PseudonodePrecedence::PreferLinkDescriptor;
        let mut seq = 0usize;
        let mut prefixes = 0usize;

        for record in checked {
            match record {
                Checked::Link { local, remote, lsa } => {
                    let source = graph.ensure_node(local);
                    let target = graph.ensure_node(remote);
                    graph
                        .node_at_mut(target)
                        .apply_link_descriptor(lsa.remote_is_pseudonode, override_declared);
                    let edge = TopologyEdge::from_link(seq, local, remote, lsa);
                    graph.add_edge(source, target, edge);
                    seq += 1;
                }
                Checked::Prefix { owner, lsa } => {
                    let index = graph.ensure_node(owner);
                    graph.node_at_mut(index).attach_prefix(AttachedPrefix::from(*lsa));
                    prefixes += 1;
                }
                Checked::Node { .. } => {}
            }
        }
        debug!(
            links = seq,
            prefixes,
            nodes = graph.node_count(),
            "attached links and prefixes"
        );
    }
}

/// Builds with the default configuration.
pub fn build(records: &[LsaRecord]) -> Result<TopologyGraph, MalformedRecordError> {
    TopologyBuilder::default().build(records)
}

fn display_identity(node: &TopologyNode) -> String {
    node.display_name
        .clone()
        .unwrap_or_else(|| node.router_id.clone())
}

fn check_records(records: &[LsaRecord]) -> Result<Vec<Checked<'_>>, MalformedRecordError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| check_record(index, record))
        .collect()
}

fn check_record(index: usize, record: &LsaRecord) -> Result<Checked<'_>, MalformedRecordError> {
    let missing = |kind: RecordKind, field: &'static str| MalformedRecordError::MissingRouterId {
        index,
        kind,
        field,
    };
    match record {
        LsaRecord::Node(lsa) => Ok(Checked::Node {
            router_id: lsa.router_id().ok_or_else(|| missing(RecordKind::Node, "igpRouterId"))?,
            lsa,
        }),
        LsaRecord::Link(lsa) => Ok(Checked::Link {
            local: lsa
                .local_router_id()
                .ok_or_else(|| missing(RecordKind::Link, "localIgpRouterId"))?,
            remote: lsa
                .remote_router_id()
                .ok_or_else(|| missing(RecordKind::Link, "remoteIgpRouterId"))?,
            lsa,
        }),
        LsaRecord::Prefix(lsa) => Ok(Checked::Prefix {
            owner: lsa
                .owner_router_id()
                .ok_or_else(|| missing(RecordKind::Prefix, "ownerIgpRouterId"))?,
            lsa,
        }),
        LsaRecord::Unrecognized { kind } if kind.trim().is_empty() => {
            Err(MalformedRecordError::MissingType { index })
        }
        LsaRecord::Unrecognized { kind } => Err(match kind.parse::<RecordKind>() {
            Ok(kind) => MalformedRecordError::UndecodableFields { index, kind },
            Err(_) => MalformedRecordError::UnrecognizedType {
                index,
                kind: kind.clone(),
            },
        }),
    }
}
