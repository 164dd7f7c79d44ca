/*!
Caller-facing topology provider interface.

This module defines:
- `TopologySource`: an async trait that returns a finished `TopologyGraph`.
- `LsdbTopology`: the BGP-LS implementation, which pulls classified records from any
  `LsdbSource` and runs them through a `TopologyBuilder`.
*/

use async_trait::async_trait;
use tracing::debug;

use crate::{
    network::topology_graph::TopologyGraph,
    parsers::bgp_ls::source::LsdbSource,
    topology::{
        builder::TopologyBuilder,
        error::{TopologyError, TopologyResult},
    },
};

/// Implementations hide transport and decoding details and hand back a built graph.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch_graph(&mut self) -> TopologyResult<TopologyGraph>;
}

pub struct LsdbTopology<S: LsdbSource> {
    source: S,
    builder: TopologyBuilder,
}

impl<S: LsdbSource> LsdbTopology<S> {
    pub fn new(source: S, builder: TopologyBuilder) -> Self {
        Self { source, builder }
    }

    pub fn builder(&self) -> &TopologyBuilder {
        &self.builder
    }
}

#[async_trait]
impl<S: LsdbSource> TopologySource for LsdbTopology<S> {
    async fn fetch_graph(&mut self) -> TopologyResult<TopologyGraph> {
        let records = self.source.fetch_records().await?;
        debug!(records = records.len(), "fetched LSDB records");
        self.builder.build(&records).map_err(TopologyError::from)
    }
}
