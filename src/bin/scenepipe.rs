//! scenepipe - run a pipeline document
//!
//! Positional `ARGS` feed `<args:N>` placeholders, the process environment
//! feeds `<env:NAME>`.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use scenepipe::{Pipeline, Placeholders, RunOptions};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scenepipe")]
#[command(about = "Run a declarative procedural-scene pipeline")]
struct Cli {
    /// Path to the pipeline document
    config: PathBuf,

    /// Values for <args:N> placeholders
    args: Vec<String>,

    /// Seed for the run's random source (fresh seed when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Parse, substitute and validate module names without running
    #[arg(long)]
    check: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scenepipe=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> scenepipe::Result<()> {
    let text = std::fs::read_to_string(&cli.config)?;
    let placeholders = Placeholders::from_process(cli.args);
    let pipeline = Pipeline::new();

    let spec = pipeline.check(&text, &placeholders)?;
    if cli.check {
        info!(modules = spec.modules.len(), "{} is valid", cli.config.display());
        return Ok(());
    }

    let report = pipeline.run(&spec, RunOptions { seed: cli.seed })?;
    info!(
        seed = report.seed,
        modules = report.modules.len(),
        entities = report.registry.len(),
        "pipeline completed"
    );
    Ok(())
}
