//! `taxonomy-replay` — rebuild a taxonomy from an event log and report on it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use taxonomy_engine::{ConceptId, TaxonomyKind};
use taxonomy_runtime::config::RuntimeConfig;
use taxonomy_runtime::error::Result;
use taxonomy_runtime::event_store::EventStore;
use taxonomy_runtime::replay::rebuild_graph;
use taxonomy_runtime::telemetry::init_tracing;

#[derive(Parser)]
#[command(name = "taxonomy-replay")]
#[command(about = "Replay a taxonomy change-event log and print the resulting hierarchy summary", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to an events.log file
    log: PathBuf,

    /// Taxonomy to build (stated or inferred)
    #[arg(short, long)]
    kind: Option<TaxonomyKind>,

    /// TOML configuration file
    #[arg(short, long, env = "TAXONOMY_CONFIG")]
    config: Option<PathBuf>,

    /// Do not fail queries on IS-A cycles
    #[arg(long)]
    no_check_cycles: bool,

    /// Print parents and indirect ancestors of this concept
    #[arg(long)]
    concept: Option<ConceptId>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(kind) = cli.kind {
        config.taxonomy = kind;
    }
    if cli.no_check_cycles {
        config.check_cycles = false;
    }
    init_tracing(&config.log_level);

    let store = EventStore::open(&cli.log)?;
    let events = store.load_all()?;
    let (graph, status, hash) = rebuild_graph(config.taxonomy, config.graph_config(), &events)?;

    println!("taxonomy:  {}", config.taxonomy);
    println!("events:    {}", events.len());
    println!("concepts:  {}", graph.node_count());
    println!("edges:     {}", graph.edge_count());
    println!("status:    {:?}", status.severity);
    for invalid in &status.invalid_relationships {
        println!("  {}", invalid);
    }
    println!("hash:      {}", hash);

    if let Some(concept) = cli.concept {
        let parentage = graph.parentage(concept)?;
        println!("concept {}:", concept);
        println!("  parents:   {:?}", parentage.parents);
        println!("  ancestors: {:?}", parentage.ancestors);
        println!("  depth:     {}", graph.depth(concept)?);
    }
    Ok(())
}
