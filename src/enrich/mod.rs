// src/enrich/mod.rs

pub mod stats;

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    dataset::Dataset,
    ean,
    error::{ConfigError, ProviderError},
    search::SearchProvider,
};

pub use stats::{PreviewEntry, RunStats, DEFAULT_UNIT_PRICE};

/// Exact header of the identifier column in the product exports this tool targets.
pub const DEFAULT_TARGET_COLUMN: &str = "GTIN, UPC, EAN, or ISBN";
pub const SKU_COLUMN: &str = "SKU";
pub const NAME_COLUMN: &str = "Name";

pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 3;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub target_column: String,
    /// Values below 1 are treated as 1.
    pub requests_per_second: u32,
    /// Progress checkpoint granularity only; has no effect on results.
    pub batch_size: usize,
    pub preview_limit: usize,
    /// USD per 1000 queries, for the cost estimate.
    pub unit_price: f64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            batch_size: DEFAULT_BATCH_SIZE,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            unit_price: DEFAULT_UNIT_PRICE,
        }
    }
}

impl EnrichConfig {
    /// Fixed pause after every query.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.requests_per_second.max(1)))
    }
}

/// Checkpoint passed to the progress hook after each pending row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// 1-based batch number of the row just handled.
    pub batch: usize,
    pub batches: usize,
}

#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub dataset: Dataset,
    pub stats: RunStats,
    /// Newly filled rows in discovery order, capped at `preview_limit`.
    pub preview: Vec<PreviewEntry>,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    target: usize,
    sku: usize,
    name: Option<usize>,
}

#[derive(Debug)]
enum RowOutcome {
    Skipped,
    Filled(PreviewEntry),
    NoMatch,
    Failed(ProviderError),
}

/// Fills empty identifier cells using a web search provider.
pub struct Enricher<P> {
    provider: P,
    config: EnrichConfig,
}

impl<P: SearchProvider> Enricher<P> {
    pub fn new(provider: P, config: EnrichConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub async fn run(&self, dataset: Dataset) -> Result<EnrichOutcome, ConfigError> {
        self.run_with_progress(dataset, |_| {}).await
    }

    /// Query the provider once per pending row, strictly one at a time, and
    /// write the first checksum-valid code found back into the target column.
    ///
    /// Only a missing target column is fatal; it is detected before any query.
    /// Provider failures are counted as misses and the run continues.
    #[instrument(level = "info", skip_all, fields(target = %self.config.target_column))]
    pub async fn run_with_progress<F>(
        &self,
        mut dataset: Dataset,
        mut on_progress: F,
    ) -> Result<EnrichOutcome, ConfigError>
    where
        F: FnMut(Progress),
    {
        let cfg = &self.config;
        let target = match dataset.column_index(&cfg.target_column) {
            Some(idx) => idx,
            None => {
                error!(column = %cfg.target_column, "target column not found");
                return Err(ConfigError::MissingTargetColumn {
                    column: cfg.target_column.clone(),
                });
            }
        };
        let cols = Columns {
            target,
            sku: dataset.column_index(SKU_COLUMN).unwrap_or(0),
            name: dataset.column_index(NAME_COLUMN),
        };

        let todo: Vec<usize> = (0..dataset.len())
            .filter(|&i| is_blank(dataset.value(i, target)))
            .collect();
        let total = todo.len();
        let batch_size = cfg.batch_size.max(1);
        let batches = total.div_ceil(batch_size);
        let delay = cfg.delay();
        info!(rows = dataset.len(), pending = total, batches, "starting enrichment");

        let mut stats = RunStats::default();
        let mut preview = Vec::new();
        let mut done = 0;

        for (b, chunk) in todo.chunks(batch_size).enumerate() {
            let batch = b + 1;
            for &i in chunk {
                done += 1;
                let outcome = self.enrich_row(&mut dataset, i, cols).await;
                let queried = !matches!(outcome, RowOutcome::Skipped);
                if queried {
                    stats.queries_issued += 1;
                }
                match outcome {
                    RowOutcome::Skipped => stats.skipped += 1,
                    RowOutcome::Filled(entry) => {
                        stats.hits += 1;
                        if preview.len() < cfg.preview_limit {
                            preview.push(entry);
                        }
                    }
                    RowOutcome::NoMatch => stats.misses += 1,
                    RowOutcome::Failed(e) => {
                        warn!(row = i, error = %e, "search failed, counting as miss");
                        stats.misses += 1;
                        stats.provider_errors += 1;
                    }
                }

                on_progress(Progress {
                    done,
                    total,
                    batch,
                    batches,
                });
                if queried {
                    info!("{}", stats.summary(cfg.unit_price));
                    sleep(delay).await;
                }
            }
            info!("batch {}/{} processed", batch, batches);
        }

        info!(
            queries = stats.queries_issued,
            hits = stats.hits,
            misses = stats.misses,
            provider_errors = stats.provider_errors,
            "enrichment finished"
        );
        Ok(EnrichOutcome {
            dataset,
            stats,
            preview,
        })
    }

    /// Handle one planned row. A row whose target was filled since planning is
    /// skipped without a query.
    async fn enrich_row(&self, dataset: &mut Dataset, i: usize, cols: Columns) -> RowOutcome {
        if !is_blank(dataset.value(i, cols.target)) {
            debug!(row = i, "target already filled, skipping");
            return RowOutcome::Skipped;
        }

        let sku = dataset.value(i, cols.sku).trim().to_string();
        let name = cols
            .name
            .map(|c| dataset.value(i, c).trim().to_string())
            .unwrap_or_default();
        let query = format!("{} {}", sku, name).trim().to_string();

        match self.lookup(&query).await {
            Ok(Some(code)) => {
                debug!(row = i, %query, %code, "code found");
                dataset.set_value(i, cols.target, code.as_str());
                RowOutcome::Filled(PreviewEntry { sku, name, code })
            }
            Ok(None) => {
                debug!(row = i, %query, "no valid code in results");
                RowOutcome::NoMatch
            }
            Err(e) => {
                debug!(row = i, %query, "search request failed");
                RowOutcome::Failed(e)
            }
        }
    }

    /// First valid code across all fragments of all results, in provider order.
    async fn lookup(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let result = self.provider.search(query).await?;
        let code = result
            .fragments()
            .find_map(|text| ean::extract_first_valid(&text));
        Ok(code)
    }
}
