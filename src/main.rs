use anyhow::{Context, Result};
use clap::Parser;
use eancompleter::{
    config::Settings,
    dataset::{write_dataset_path, CsvSource, DataSource},
    enrich::{Enricher, PreviewEntry},
    search::BingClient,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn print_preview(preview: &[PreviewEntry], target_column: &str) {
    println!("\nFirst {} matches found", preview.len());
    println!("{: <20} {: <40} {: <15}", "SKU", "Name", target_column);
    println!("{:-<77}", "");
    for entry in preview {
        println!("{: <20} {: <40} {: <15}", entry.sku, entry.name, entry.code);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) settings + preflight ─────────────────────────────────────
    let settings = Settings::parse();
    let enrich_cfg = settings.enrich_config()?;
    let delimiter = settings.delimiter_byte()?;
    let client = BingClient::new(settings.bing_config()?)?;
    info!(
        endpoint = %client.config().endpoint,
        market = %client.config().market,
        "search client ready"
    );
    client
        .preflight()
        .await
        .context("search API connection test failed")?;

    // ─── 3) load the table ───────────────────────────────────────────
    let dataset = CsvSource::open(&settings.input)?
        .with_delimiter(delimiter)
        .load()
        .with_context(|| format!("loading {}", settings.input.display()))?;
    info!(input = %settings.input.display(), rows = dataset.len(), "table loaded");

    // ─── 4) enrich ───────────────────────────────────────────────────
    let enricher = Enricher::new(client, enrich_cfg);
    let outcome = enricher.run(dataset).await?;

    // ─── 5) report + write ───────────────────────────────────────────
    if outcome.preview.is_empty() {
        println!("\nNo matches found, or all codes were already filled in.");
    } else {
        print_preview(&outcome.preview, &settings.target_column);
    }
    println!("\n{}", outcome.stats.summary(enricher.config().unit_price));

    write_dataset_path(&settings.output, &outcome.dataset, delimiter)?;
    info!(output = %settings.output.display(), "processing finished");
    Ok(())
}
