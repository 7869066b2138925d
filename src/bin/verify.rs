// src/bin/verify.rs

use anyhow::{Context, Result};
use clap::Parser;
use eancompleter::{
    config::ascii_delimiter,
    dataset::{CsvSource, DataSource},
    ean,
    enrich::DEFAULT_TARGET_COLUMN,
};
use std::path::PathBuf;

/// Audit the identifier column of a product CSV.
#[derive(Parser, Debug)]
#[command(name = "verify")]
struct Args {
    /// CSV to check
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_TARGET_COLUMN)]
    target_column: String,

    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Invalid rows to list
    #[arg(long, default_value_t = 10)]
    show: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let delimiter = ascii_delimiter(args.delimiter)?;

    let dataset = CsvSource::open(&args.input)?
        .with_delimiter(delimiter)
        .load()
        .with_context(|| format!("loading {}", args.input.display()))?;
    if dataset.column_index(&args.target_column).is_none() {
        anyhow::bail!("missing exact column: {}", args.target_column);
    }

    let (mut empty, mut valid) = (0usize, 0usize);
    let mut invalid_rows = Vec::new();
    for (i, row) in dataset.rows().enumerate() {
        let value = row.get(&args.target_column).unwrap_or_default().trim();
        if value.is_empty() {
            empty += 1;
        } else if value.len() == ean::EAN13_LEN && ean::checksum_valid(value) {
            valid += 1;
        } else {
            invalid_rows.push((i, value.to_string()));
        }
    }

    println!("\n{: <25} {:>10}", "Identifier values", "Count");
    println!("{:-<36}", "");
    println!("{: <25} {:>10}", "rows", dataset.len());
    println!("{: <25} {:>10}", "empty", empty);
    println!("{: <25} {:>10}", "valid EAN-13", valid);
    println!("{: <25} {:>10}", "invalid", invalid_rows.len());

    if !invalid_rows.is_empty() {
        println!();
        // +2: header line and 1-based numbering
        for (i, value) in invalid_rows.iter().take(args.show) {
            println!("line {: >6}: {:?}", i + 2, value);
        }
    }

    Ok(())
}
