// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodeflow headless runner.
//!
//! Loads a graph document saved by the editor and executes it against
//! the built-in node library, reporting per-node status on stdout.

use clap::{Parser, Subcommand};
use nodeflow_engine::{builtin_registry, ConsoleSink, Executor, NodeOutcome};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nodeflow", about = "Run Nodeflow graph documents", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a graph document
    Run {
        /// Path to the graph JSON file
        path: PathBuf,
    },
    /// List the registered node definitions by category
    Nodes,
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nodeflow=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { path } => run_graph(&path),
        Command::Nodes => list_nodes(),
    }
}

fn run_graph(path: &PathBuf) -> ExitCode {
    let registry = builtin_registry();

    let doc = match nodeflow_engine::load_doc(path) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "cannot load graph document");
            return ExitCode::FAILURE;
        }
    };
    let graph = doc.into_graph(&registry);
    if graph.node_count() == 0 {
        tracing::warn!("no nodes to execute");
        return ExitCode::FAILURE;
    }

    let mut sink = ConsoleSink;
    let report = match Executor::new(&registry).run(&graph, &mut sink) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(error = %err, "graph is not executable");
            return ExitCode::FAILURE;
        }
    };

    for (id, outcome) in report.iter() {
        let name = graph.node(id).map_or("<removed>", |n| n.name.as_str());
        match outcome {
            NodeOutcome::Completed(Some(value)) => println!("{name}: completed ({value})"),
            NodeOutcome::Completed(None) => println!("{name}: completed"),
            NodeOutcome::Failed(err) => println!("{name}: failed ({err})"),
            NodeOutcome::Skipped => println!("{name}: skipped"),
        }
    }

    if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn list_nodes() -> ExitCode {
    let registry = builtin_registry();
    for category in registry.categories() {
        println!("{category}:");
        for definition in registry.definitions_in_category(category) {
            let params: Vec<String> = definition
                .params
                .iter()
                .map(|(name, ty)| format!("{name}: {ty}"))
                .collect();
            let returns = definition
                .returns
                .map_or_else(String::new, |ty| format!(" -> {ty}"));
            println!(
                "  {} ({}){}  {}",
                definition.name,
                params.join(", "),
                returns,
                definition.description
            );
        }
    }
    ExitCode::SUCCESS
}
