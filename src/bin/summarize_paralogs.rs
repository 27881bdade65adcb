//! Summarizes paralogous proteins from a protein FASTA and a cluster table.

use anyhow::Context;
use clap::Parser;
use protscope::{
    about,
    config::ParalogConfig,
    logging::init_cli_logging,
    paralogs::{NO_PARALOGS_MESSAGE, ParalogRequest, summarize_paralogs},
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "summarize_paralogs",
    version = about::PROTSCOPE_VERSION,
    long_version = about::PROTSCOPE_LONG_VERSION,
    about = "Summarize protein paralogs from sequence clusters"
)]
struct Args {
    /// Protein FASTA file (e.g. assembly.faa, optionally gzipped)
    #[arg(long, value_name = "FASTA")]
    faa: PathBuf,
    /// Cluster table with cluster_id<TAB>protein_id lines
    #[arg(long, value_name = "TSV")]
    clusters: PathBuf,
    /// Output TSV: protein_id, protein_name, copy_number
    #[arg(long, value_name = "TSV")]
    out_tsv: PathBuf,
    /// Output bar chart of the top paralogs (.png, or .svg)
    #[arg(long, value_name = "PNG")]
    out_png: PathBuf,
    /// JSON file with chart settings
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

    let config = match &args.config {
        Some(path) => ParalogConfig::from_json_file(path)
            .with_context(|| format!("Could not load config '{}'", path.display()))?,
        None => ParalogConfig::default(),
    };
    let request = ParalogRequest {
        faa_path: args.faa,
        clusters_path: args.clusters,
        out_tsv: args.out_tsv,
        out_chart: args.out_png,
        config,
    };
    let report = summarize_paralogs(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match &report.chart_path {
        Some(chart_path) => {
            println!("Wrote TSV: {}", report.tsv_path.display());
            println!("Wrote PNG: {}", chart_path.display());
        }
        None => println!("{NO_PARALOGS_MESSAGE}"),
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
