//! Extracts the embedding matrix of one record's proteins into a `.npy` file.

use anyhow::Context;
use clap::Parser;
use protscope::{
    about,
    config::ExtractionConfig,
    embedding_store::Metric,
    embeddings::{ExtractionRequest, run_extraction},
    hdf5_store::Hdf5EmbeddingStore,
    logging::init_cli_logging,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "extract_record_embeddings",
    version = about::PROTSCOPE_VERSION,
    long_version = about::PROTSCOPE_LONG_VERSION,
    about = "Gather per-protein embeddings for a genomic record"
)]
struct Args {
    /// SQLite record database
    #[arg(long, value_name = "DB")]
    database_path: PathBuf,
    /// HDF5 embedding store [default: from config, else the course store]
    #[arg(long, value_name = "H5")]
    h5_path: Option<PathBuf>,
    #[arg(long, value_name = "ID")]
    record_id: String,
    #[arg(long, value_enum)]
    metric: Metric,
    /// Output matrix [default: embeddings.npy]
    #[arg(long, value_name = "NPY")]
    output_path: Option<PathBuf>,
    /// JSON file with extraction settings
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,
    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_cli_logging(args.verbose);
    log::debug!("{}", about::version_cli_text());

    let mut config = match &args.config {
        Some(path) => ExtractionConfig::from_json_file(path)
            .with_context(|| format!("Could not load config '{}'", path.display()))?,
        None => ExtractionConfig::default(),
    };
    if let Some(h5_path) = args.h5_path {
        config.embedding_store_path = h5_path;
    }
    if let Some(output_path) = args.output_path {
        config.output_path = output_path;
    }

    let ids_dataset = config.protein_ids_dataset.clone();
    let request = ExtractionRequest {
        database_path: args.database_path,
        record_id: args.record_id,
        metric: args.metric,
        config,
    };
    let report = run_extraction(&request, |path| {
        Hdf5EmbeddingStore::open(path, &ids_dataset)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Saved embeddings to {}", report.output_path.display());
        println!("Matrix shape: {}", report.shape_text());
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
