use anyhow::Result;
use bulkload::{config::LoadConfig, load, writer::TableCompression};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bulkload")]
#[command(about = "Convert a target_history CSV file into a Parquet table file")]
struct Args {
    /// YAML config file; flags below override its values
    #[arg(short, long, env = "BULKLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Input CSV file (first line is a header)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Root output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    keyspace: Option<String>,

    #[arg(long)]
    table: Option<String>,

    /// Rows per record batch
    #[arg(long)]
    batch_rows: Option<usize>,

    #[arg(long, value_enum)]
    compression: Option<TableCompression>,

    /// Abort once more than this many lines failed
    #[arg(long)]
    max_errors: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_filter = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder().with_env_filter(env).init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) resolve configuration ────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => LoadConfig::from_yaml_file(path)?,
        None => LoadConfig::default(),
    };
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(keyspace) = args.keyspace {
        config.keyspace = keyspace;
    }
    if let Some(table) = args.table {
        config.table = table;
    }
    if let Some(batch_rows) = args.batch_rows {
        config.batch_rows = batch_rows;
    }
    if let Some(compression) = args.compression {
        config.compression = compression;
    }
    if args.max_errors.is_some() {
        config.max_errors = args.max_errors;
    }
    info!(?config, "startup");

    // ─── 3) load ─────────────────────────────────────────────────────
    let summary = load::run(&config)?;

    match &summary.output.path {
        Some(path) => info!(
            path = %path.display(),
            rows = summary.output.rows,
            skipped = summary.stats.failed(),
            "done"
        ),
        None => info!(skipped = summary.stats.failed(), "done; no rows written"),
    }
    Ok(())
}
