// src/search/mod.rs

pub mod bing;

use std::future::Future;

use crate::error::ProviderError;

pub use bing::{BingClient, BingConfig};

/// One web result as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }

    /// Title, snippet and url joined by single spaces; this is the text scanned for codes.
    pub fn fragment(&self) -> String {
        [self.title.as_str(), self.snippet.as_str(), self.url.as_str()].join(" ")
    }
}

/// Ordered hits for a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }

    /// Text fragments in provider order, built lazily.
    pub fn fragments(&self) -> impl Iterator<Item = String> + '_ {
        self.hits.iter().map(SearchHit::fragment)
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Web search capability used by the enrichment loop.
pub trait SearchProvider {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResult, ProviderError>> + Send;
}

impl<P: SearchProvider + Sync> SearchProvider for &P {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResult, ProviderError>> + Send {
        (**self).search(query)
    }
}
