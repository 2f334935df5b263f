mod color;
mod config;
mod data;
mod error;
mod outliers;
mod pipeline;
mod preprocess;
mod render;
mod report;
mod stats;
mod summary;

use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use config::{AnalysisConfig, Credential};
use data::loader::dataset_name;

#[derive(Parser, Debug)]
#[command(
    name = "autolysis",
    version,
    about = "Analyze a CSV dataset and write charts plus a Markdown report"
)]
struct Args {
    /// CSV file to analyze
    dataset: PathBuf,

    /// Write results here instead of the directory derived from the file name
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail when the API credential is not set
    #[arg(long)]
    strict_credential_check: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if args.strict_credential_check {
        config.strict_credential_check = true;
    }
    let credential = Credential::resolve(&config)?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir(Path::new("."), &dataset_name(&args.dataset)));

    if !process_dataset(&args.dataset, &output_dir, &config, &credential) {
        info!("no report written for {}", args.dataset.display());
    }
    Ok(())
}

/// Analyse one dataset and log the outcome. Processing failures are logged
/// with the dataset path and reported as `false`; they never reach the exit
/// status.
fn process_dataset(
    dataset: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    credential: &Credential,
) -> bool {
    match pipeline::run(dataset, output_dir, config, credential) {
        Ok(artifacts) => {
            info!(
                "finished {}: {} chart(s), {} failed, results in {} ({})",
                dataset.display(),
                artifacts.charts.len(),
                artifacts.failures.len(),
                artifacts.output_dir.display(),
                artifacts.report.display()
            );
            true
        }
        Err(e) => {
            error!("error processing {}: {e}", dataset.display());
            false
        }
    }
}
