//! learnadex: fit probability-filter parameters to a CSV stream.
//!
//! Usage:
//! ```bash
//! RUST_LOG=info learnadex --config run.json --output-params fitted.json
//! ```
use std::{fs::File, io::BufWriter, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use learnadex::{
    config::RunConfig,
    data::StreamData,
    learning::{JsonLogOutput, NilOutput, ObjectiveOutput},
    optimization::OptimisationAlgorithm,
};

#[derive(Parser)]
#[command(name = "learnadex")]
#[command(version, about = "Online probability-reweighting filter fitting", long_about = None)]
struct Cli {
    /// JSON run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Write the fitted parameters here instead of stdout
    #[arg(short, long)]
    output_params: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = RunConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let source = &config.data;
    let stream = StreamData::from_csv_path(
        &source.path,
        source.time_column,
        &source.state_columns,
        source.skip_header,
    )
    .with_context(|| format!("reading {}", source.path.display()))?;
    info!(rows = stream.len(), width = stream.state_width(); "loaded stream");

    let output: Arc<dyn ObjectiveOutput> = match &config.json_log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating json log {}", path.display()))?;
            Arc::new(JsonLogOutput::new(Box::new(BufWriter::new(file))))
        }
        None => Arc::new(NilOutput),
    };

    let evaluator = config.evaluator(Arc::new(stream), output)?;
    let optimiser = OptimisationAlgorithm::new(config.optimiser_options()?);
    let (fitted, outcome) = optimiser
        .run_with_outcome(&evaluator, evaluator.params())
        .context("optimisation failed")?;
    info!(
        log_likelihood = outcome.value,
        iterations = outcome.iterations;
        "fit complete"
    );

    let json = serde_json::to_string_pretty(&fitted)?;
    match &cli.output_params {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
