use crate::config::{Direction, Distribution, LayoutOptions, load_options};
use crate::ir::GraphInput;
use crate::layout::{LayoutResult, compute_hierarchical_layout, compute_layout};
use crate::layout_dump::{write_layout_dump, write_layout_dump_to};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flowlayout", version, about = "Lay out a node-link graph and print node positions")]
pub struct Args {
    /// Input graph JSON ({"nodes": [...], "edges": [...]}) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Options file (JSON5, camelCase keys)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Overrides the configured distribution strategy
    #[arg(short = 'd', long = "distribution", value_enum)]
    pub distribution: Option<Distribution>,

    /// Use the hierarchical engine (falls back to compact placement on failure)
    #[arg(long = "hierarchical")]
    pub hierarchical: bool,

    /// Flow direction for the hierarchical engine
    #[arg(long = "direction", value_enum)]
    pub direction: Option<Direction>,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    execute(&args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn execute(args: &Args) -> Result<()> {
    let options = resolve_options(args)?;
    let input = read_input(args.input.as_deref())?;
    let graph: GraphInput = serde_json::from_str(&input).context("invalid graph JSON")?;
    let result = layout_graph(&graph, &options, args.hierarchical);

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &result, &graph.nodes, &options)?,
        None => write_layout_dump_to(io::stdout().lock(), &result, &graph.nodes, &options)?,
    }
    Ok(())
}

fn resolve_options(args: &Args) -> Result<LayoutOptions> {
    let mut options = load_options(args.config.as_deref())
        .with_context(|| format!("failed to load options from {:?}", args.config))?;
    if let Some(distribution) = args.distribution {
        options.distribution = distribution;
    }
    if let Some(direction) = args.direction {
        options.direction = direction;
    }
    Ok(options)
}

fn layout_graph(graph: &GraphInput, options: &LayoutOptions, hierarchical: bool) -> LayoutResult {
    if hierarchical {
        futures::executor::block_on(compute_hierarchical_layout(&graph.nodes, &graph.edges, options))
    } else {
        compute_layout(&graph.nodes, &graph.edges, options)
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
