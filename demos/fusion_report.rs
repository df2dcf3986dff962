//! Fusion report tool
//!
//! Print the fusion groups found in a traced module tree.
//!
//! Usage: fusion_report <tree.json> [catalog.json] [--chains] [--brute-force]
//! Set `RUST_LOG=autoquant_fusion=debug` to see each match as it is found.

use std::env;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use autoquant_fusion::fusion::{FusionFinder, MatchConfig};
use autoquant_fusion::graph::TraceGraph;
use autoquant_fusion::io::{load_module_tree, load_pattern_catalog};
use autoquant_fusion::pattern::{linear_chains, PatternCatalog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
    let show_chains = args.iter().any(|a| a == "--chains");
    let brute_force = args.iter().any(|a| a == "--brute-force");

    let Some(tree_path) = positional.first() else {
        eprintln!(
            "Usage: {} <tree.json> [catalog.json] [--chains] [--brute-force]",
            args[0]
        );
        std::process::exit(1);
    };

    let path = Path::new(tree_path.as_str());
    println!("Fusion Report: {}", path.display());
    println!("{}", "=".repeat(60));

    let model = load_module_tree(path)?;
    let catalog = match positional.get(1) {
        Some(catalog_path) => load_pattern_catalog(catalog_path.as_str())?,
        None => PatternCatalog::default(),
    };

    println!("\n## Catalog ({} patterns)", catalog.len());
    for pattern in catalog.patterns() {
        println!("  {}", pattern);
    }

    let config = if brute_force {
        MatchConfig::brute_force()
    } else {
        MatchConfig::default()
    };
    let mut finder = FusionFinder::new(&catalog).with_config(config);
    let groups = finder.find(&model);

    println!("\n## Fusion Groups");
    if groups.is_empty() {
        println!("  (none)");
    }
    for group in groups.iter() {
        println!("  {}", group);
    }

    if show_chains {
        println!("\n## Linear Chains");
        for (fqn, module) in model.named_modules() {
            let Some(state) = module.auto_quant_state() else {
                continue;
            };
            let graph = TraceGraph::new(state);
            let label = if fqn.is_empty() { "<root>" } else { fqn.as_str() };
            println!("  {} ({} ops)", label, graph.op_count());
            for chain in linear_chains(&graph) {
                let names: Vec<String> = chain
                    .iter()
                    .map(|op| format!("{}@{}", op.op_type, op.fqn))
                    .collect();
                println!("    {}", names.join(" -> "));
            }
        }
    }

    let stats = finder.stats();
    println!("\n## Stats");
    println!("  Modules visited:    {}", stats.modules_visited);
    println!("  Modules with trace: {}", stats.modules_with_state);
    println!("  Ops scanned:        {}", stats.ops_scanned);
    println!("  Patterns tried:     {}", stats.patterns_tried);
    println!("  Groups found:       {}", stats.groups_found);
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);

    Ok(())
}
