use anyhow::{bail, Context, Result};
use bulkload::writer::{read_table_head, table_metadata};
use clap::Parser;
use glob::glob;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "inspect_table")]
#[command(about = "Print metadata and rows of target_history table files")]
struct Args {
    /// A table file, or a table directory whose *.parquet files are all inspected
    path: PathBuf,

    /// Rows to print per file as JSON lines
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let files = table_files(&args.path)?;
    if files.is_empty() {
        bail!("No table files found under '{}'", args.path.display());
    }

    let mut total_rows = 0i64;
    for file in &files {
        total_rows += inspect(file, args.limit)?;
    }

    if files.len() > 1 {
        println!("{:-<55}", "");
        println!("{: <25} {:>15}", "Files", files.len());
        println!("{: <25} {:>15}", "Total rows", total_rows);
    }
    Ok(())
}

fn table_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let pattern = format!("{}/*.parquet", path.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Print one file's footer facts and its first `limit` rows; returns its row count.
fn inspect(path: &Path, limit: usize) -> Result<i64> {
    let info = table_metadata(path)?;

    println!("=== Table file: {} ===", path.display());
    println!(
        "Table:                {}.{}",
        info.keyspace.as_deref().unwrap_or("<unknown>"),
        info.table.as_deref().unwrap_or("<unknown>")
    );
    println!("Primary key:          ({})", info.primary_key.join(", "));
    println!(
        "Created by:           {}",
        info.created_by.as_deref().unwrap_or("<unknown>")
    );
    println!("Total rows:           {}", info.rows);
    println!("Number of row groups: {}", info.row_groups);
    println!("File size on disk:    {} bytes", std::fs::metadata(path)?.len());
    if let Some(stmt) = &info.create_statement {
        println!("Schema:               {}", stmt);
    }
    println!();

    if limit > 0 {
        for record in read_table_head(path, limit)? {
            println!("{}", serde_json::to_string(&record)?);
        }
        println!();
    }

    Ok(info.rows)
}
