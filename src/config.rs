// src/config.rs

use clap::Parser;
use std::path::PathBuf;

use crate::{
    enrich::{
        EnrichConfig, DEFAULT_BATCH_SIZE, DEFAULT_PREVIEW_LIMIT, DEFAULT_REQUESTS_PER_SECOND,
        DEFAULT_TARGET_COLUMN, DEFAULT_UNIT_PRICE,
    },
    error::ConfigError,
    search::bing::{
        parse_endpoint, BingConfig, DEFAULT_ENDPOINT, DEFAULT_MARKET, DEFAULT_RESULT_COUNT,
    },
};

pub const DEFAULT_OUTPUT: &str = "products_with_ean.csv";

/// Bing Web Search caps `count` at 50 results per request.
const MAX_RESULT_COUNT: u32 = 50;

/// Command-line settings, with environment fallbacks for the API secrets.
#[derive(Parser, Debug, Clone)]
#[command(name = "eancompleter")]
#[command(about = "Fill missing EAN-13 codes in a product CSV from web search results")]
#[command(version)]
pub struct Settings {
    /// Product CSV to complete
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the completed CSV
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Bing Web Search subscription key
    #[arg(long, env = "BING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Market / locale passed to the search API
    #[arg(long, env = "BING_MKT", default_value = DEFAULT_MARKET)]
    pub market: String,

    /// Maximum search requests per second
    #[arg(long, env = "QPS", default_value_t = DEFAULT_REQUESTS_PER_SECOND)]
    pub qps: u32,

    #[arg(long, env = "BING_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Results requested per query
    #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
    pub count: u32,

    /// Rows per progress checkpoint
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of newly found codes listed at the end
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
    pub preview_limit: usize,

    /// USD per 1000 queries, for the cost estimate
    #[arg(long, default_value_t = DEFAULT_UNIT_PRICE)]
    pub unit_price: f64,

    /// Exact header of the identifier column
    #[arg(long, default_value = DEFAULT_TARGET_COLUMN)]
    pub target_column: String,

    #[arg(short, long, default_value_t = ',')]
    pub delimiter: char,
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSetting {
        name,
        reason: reason.into(),
    }
}

/// The CSV reader and writer take a single byte; only ASCII maps to one.
pub fn ascii_delimiter(c: char) -> Result<u8, ConfigError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| invalid("delimiter", "must be a single ASCII character"))
}

impl Settings {
    pub fn enrich_config(&self) -> Result<EnrichConfig, ConfigError> {
        if self.qps == 0 {
            return Err(invalid("qps", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch-size", "must be at least 1"));
        }
        if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            return Err(invalid("unit-price", format!("{} is not a price", self.unit_price)));
        }
        Ok(EnrichConfig {
            target_column: self.target_column.clone(),
            requests_per_second: self.qps,
            batch_size: self.batch_size,
            preview_limit: self.preview_limit,
            unit_price: self.unit_price,
        })
    }

    pub fn bing_config(&self) -> Result<BingConfig, ConfigError> {
        let api_key = match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ConfigError::MissingCredential),
        };
        if self.count == 0 || self.count > MAX_RESULT_COUNT {
            return Err(invalid(
                "count",
                format!("must be between 1 and {}", MAX_RESULT_COUNT),
            ));
        }
        let mut cfg = BingConfig::new(api_key)?;
        cfg.endpoint = parse_endpoint(&self.endpoint)?;
        cfg.market = self.market.clone();
        cfg.count = self.count;
        Ok(cfg)
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        ascii_delimiter(self.delimiter)
    }
}
