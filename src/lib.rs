pub mod config;
pub mod dataset;
pub mod ean;
pub mod enrich;
pub mod error;
pub mod search;

pub use error::{ConfigError, ProviderError};
