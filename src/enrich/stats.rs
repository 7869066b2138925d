// src/enrich/stats.rs

use std::fmt;

/// USD per 1000 queries on the standard Bing Web Search tier.
pub const DEFAULT_UNIT_PRICE: f64 = 5.0;

/// Counters for one enrichment run.
///
/// `hits + misses == queries_issued`. `provider_errors` counts the misses that
/// came from a failed request rather than from results without a valid code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub queries_issued: u64,
    pub hits: u64,
    pub misses: u64,
    pub provider_errors: u64,
    /// Rows that were pending at planning time but already filled when reached.
    pub skipped: u64,
}

impl RunStats {
    /// `queries_issued / 1000 × unit_price`
    pub fn estimated_cost(&self, unit_price: f64) -> f64 {
        self.queries_issued as f64 / 1000.0 * unit_price
    }

    /// Render the live metrics line.
    pub fn summary(&self, unit_price: f64) -> Summary<'_> {
        Summary {
            stats: self,
            unit_price,
        }
    }
}

pub struct Summary<'a> {
    stats: &'a RunStats,
    unit_price: f64,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "queries: {} • found: {} • missed: {} • estimated cost: ~${:.2}",
            self.stats.queries_issued,
            self.stats.hits,
            self.stats.misses,
            self.stats.estimated_cost(self.unit_price)
        )?;
        if self.stats.provider_errors > 0 {
            write!(f, " ({} request failures)", self.stats.provider_errors)?;
        }
        Ok(())
    }
}

/// A row filled during the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub sku: String,
    pub name: String,
    pub code: String,
}
