//! crucible-extract: Turn an unzipped Facebook download into scrubbed tables
//!
//! Usage:
//!   # Extract every table, JSON Lines to stdout
//!   crucible-extract ./facebook-export
//!
//!   # Write to a file, 500 rows per table chunk
//!   crucible-extract ./facebook-export --output tables.jsonl --chunk-size 500
//!
//!   # Only list the groups the account joined
//!   crucible-extract ./facebook-export --list-groups
//!
//! Set RUST_LOG=debug to see which files were missing or malformed.

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::facebook::{extract_all, groups_to_list, DirectorySource};
use crucible::{ExtractConfig, TableWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crucible-extract")]
#[command(about = "Extract scrubbed tables from a Facebook data download", long_about = None)]
struct Args {
    /// Directory holding the unzipped download
    #[arg(value_name = "EXPORT_DIR")]
    export_dir: String,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Maximum rows per emitted table, 0 disables chunking (default: 10000)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum nesting depth to flatten (default: 64)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Replacement for redacted strings (default: "<Redacted>")
    #[arg(long)]
    placeholder: Option<String>,

    /// Replacement for the account holder's own name (default: "You")
    #[arg(long)]
    you: Option<String>,

    /// Comma-separated columns to redact
    #[arg(long)]
    redact_columns: Option<String>,

    /// Print the deduplicated group names instead of the tables
    #[arg(long)]
    list_groups: bool,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = ExtractConfig::default();
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Some(placeholder) = args.placeholder {
        config.placeholder = placeholder;
    }
    if let Some(you) = args.you {
        config.you_token = you;
    }
    if let Some(columns) = args.redact_columns {
        config.redact_columns = split_list(&columns);
    }

    let source = DirectorySource::new(&args.export_dir)
        .with_context(|| format!("Failed to open export directory: {}", args.export_dir))?;
    tracing::info!(files = source.len(), "indexed export");

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let mut writer = TableWriter::new(output);

    if args.list_groups {
        writer.write_list(&groups_to_list(&source, &config))?;
    } else {
        let tables = extract_all(&source, &config);
        tracing::info!(tables = tables.len(), "writing tables");
        writer.write_tables(&tables)?;
    }

    writer.flush()?;
    Ok(())
}
