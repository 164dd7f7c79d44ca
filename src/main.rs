use std::{env, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bgp_ls_topology::{
    network::TopologyGraph,
    parsers::bgp_ls::{SnapshotConfig, SnapshotFileSource, SnapshotFormat},
    topology::{BuildConfig, LsdbTopology, PseudonodePrecedence, TopologyBuilder, TopologySource},
};

/// Build a topology graph from a BGP-LS LSDB snapshot.
#[derive(Parser, Debug)]
#[command(name = "lsdb-topology", version, about)]
struct Args {
    /// Snapshot file (.json, .yaml or .yml)
    #[arg(long)]
    snapshot: PathBuf,

    /// Snapshot contents: classified `records` or a raw GoBGP ListPath dump (`gobgp`)
    #[arg(long, default_value_t = SnapshotFormat::Records)]
    format: SnapshotFormat,

    /// Keep IGP Router IDs as node identities
    #[arg(long)]
    no_display_names: bool,

    /// Let Link remote descriptors override the pseudonode flag of Node records
    #[arg(long)]
    prefer_link_descriptor: bool,

    /// Print the graph as JSON instead of one line per edge
    #[arg(long)]
    json: bool,
}

impl Args {
    fn build_config(&self) -> BuildConfig {
        let precedence = if self.prefer_link_descriptor {
            PseudonodePrecedence::PreferLinkDescriptor
        } else {
            PseudonodePrecedence::PreferNodeRecord
        };
        BuildConfig::new(!self.no_display_names, precedence)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LSDB_TOPOLOGY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("bgp_ls_topology=info,warn"));

    let format = env::var("LSDB_TOPOLOGY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the graph
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn print_edges(graph: &TopologyGraph) {
    for node in graph.nodes() {
        let kind = if node.is_pseudonode { "pseudonode" } else { "router" };
        println!("{} [{kind}, {}]", node.id, node.router_id);
    }
    for view in graph.edges() {
        println!(
            "{} -> {} ({})",
            view.source.id,
            view.target.id,
            view.edge.cost_label()
        );
    }
    for collision in graph.collisions() {
        println!("collision: {collision}");
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = SnapshotFileSource::new(SnapshotConfig::new(&args.snapshot, args.format));
    let builder = TopologyBuilder::new(args.build_config());
    let mut topology = LsdbTopology::new(source, builder);

    let graph = topology.fetch_graph().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
    } else {
        print_edges(&graph);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
