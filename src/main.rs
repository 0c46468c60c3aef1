use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use crd_gates::config::Config;
use crd_gates::file::loader::load_yaml;
use crd_gates::file::saver::{save_yaml_stream, write_yaml_stream};
use crd_gates::gates::{process_tree, GateDiscovery, GateOptions};
use crd_gates::logging::init_logging;

/// crd-gates - Wrap feature-gated CRD schema fields in template conditionals
#[derive(Parser)]
#[command(name = "crd-gates")]
#[command(version)]
#[command(
    about = "Wrap feature-gated CRD schema fields in template conditionals",
    long_about = None
)]
struct Cli {
    /// CRD YAML file to process ("-" reads from stdin; .gz is decompressed)
    file: PathBuf,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: ~/.config/crd-gates/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let mut tree = load_yaml(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    tracing::info!(documents = tree.len(), file = %cli.file.display(), "Loaded YAML stream");

    let options = GateOptions::from(&config);
    let mut report = |discovery: &GateDiscovery| eprintln!("{}", discovery);
    let discoveries =
        process_tree(&mut tree, &options, &mut report).context("Failed to process document")?;
    tracing::info!(gates = discoveries.len(), "Rewrote gated fields");

    match &cli.output {
        Some(path) => save_yaml_stream(path, &tree, &config)
            .with_context(|| format!("Failed to write output to {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            write_yaml_stream(BufWriter::new(stdout.lock()), &tree, &config)
                .context("Failed to write output")?
        }
    }

    Ok(())
}
