// src/search/bing.rs

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{SearchHit, SearchProvider, SearchResult};
use crate::error::{ConfigError, ProviderError};

pub const DEFAULT_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";
pub const DEFAULT_MARKET: &str = "ro-RO";
pub const DEFAULT_RESULT_COUNT: u32 = 10;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const PREFLIGHT_QUERY: &str = "test";

#[derive(Debug, Clone)]
pub struct BingConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub market: String,
    pub count: u32,
}

impl BingConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: api_key.into(),
            endpoint: parse_endpoint(DEFAULT_ENDPOINT)?,
            market: DEFAULT_MARKET.to_string(),
            count: DEFAULT_RESULT_COUNT,
        })
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidSetting {
        name: "endpoint",
        reason: format!("{}: {}", raw, e),
    })
}

#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    value: Option<Vec<WebPage>>,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    name: Option<String>,
    snippet: Option<String>,
    url: Option<String>,
}

/// Map a Bing Web Search JSON body to ordered hits. A body without
/// `webPages` is a valid empty result.
pub fn parse_response(body: &str) -> Result<SearchResult, ProviderError> {
    let resp: BingResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let hits = resp
        .web_pages
        .and_then(|w| w.value)
        .unwrap_or_default()
        .into_iter()
        .map(|p| SearchHit {
            title: p.name.unwrap_or_default(),
            snippet: p.snippet.unwrap_or_default(),
            url: p.url.unwrap_or_default(),
        })
        .collect();
    Ok(SearchResult::new(hits))
}

/// Bing Web Search v7 client.
pub struct BingClient {
    client: Client,
    config: BingConfig,
}

impl BingClient {
    pub fn new(config: BingConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                name: "http client",
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BingConfig {
        &self.config
    }

    /// One lightweight search to confirm the endpoint is reachable and the key is accepted.
    #[instrument(level = "info", skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn preflight(&self) -> Result<(), ConfigError> {
        let resp = self
            .client
            .get(self.config.endpoint.clone())
            .header(KEY_HEADER, &self.config.api_key)
            .query(&[
                ("q", PREFLIGHT_QUERY),
                ("count", "1"),
                ("mkt", self.config.market.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ConfigError::PreflightUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "preflight rejected");
            return Err(ConfigError::PreflightRejected {
                status: status.as_u16(),
            });
        }
        info!("search API key accepted");
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<SearchResult, ProviderError> {
        let count = self.config.count.to_string();
        let resp = self
            .client
            .get(self.config.endpoint.clone())
            .header(KEY_HEADER, &self.config.api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("textDecorations", "false"),
                ("textFormat", "Raw"),
                ("mkt", self.config.market.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        let result = parse_response(&body)?;
        debug!(query, hits = result.hits.len(), "search returned");
        Ok(result)
    }
}

impl SearchProvider for BingClient {
    async fn search(&self, query: &str) -> Result<SearchResult, ProviderError> {
        self.query(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a local port; returns the endpoint
    /// and a handle yielding the raw request line.
    async fn serve_once(status: &str, body: &str) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });
        let url = Url::parse(&format!("http://{}/v7.0/search", addr)).unwrap();
        (url, handle)
    }

    fn client_for(endpoint: Url) -> BingClient {
        let mut cfg = BingConfig::new("secret").unwrap();
        cfg.endpoint = endpoint;
        BingClient::new(cfg).unwrap()
    }

    #[test]
    fn test_parse_response_maps_web_pages() {
        let body = r#"{
            "_type": "SearchResponse",
            "webPages": {
                "value": [
                    {"name": "Cablu HDMI", "snippet": "Cod EAN: 4006381333931", "url": "https://a.example/1"},
                    {"name": "Other", "url": "https://b.example/2"}
                ]
            }
        }"#;
        let res = parse_response(body).unwrap();
        assert_eq!(res.hits.len(), 2);
        assert_eq!(res.hits[0].snippet, "Cod EAN: 4006381333931");
        assert_eq!(res.hits[1].snippet, "");
        assert_eq!(res.hits[1].url, "https://b.example/2");
    }

    #[test]
    fn test_parse_response_without_web_pages_is_empty() {
        assert!(parse_response(r#"{"_type": "SearchResponse"}"#)
            .unwrap()
            .is_empty());
        assert!(parse_response(r#"{"webPages": null}"#).unwrap().is_empty());
        assert!(parse_response(r#"{"webPages": {"value": null}}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(matches!(
            parse_response("<html>"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_key_is_missing_credential() {
        let cfg = BingConfig::new("  ").unwrap();
        assert!(matches!(
            BingClient::new(cfg),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_search_sends_query_and_parses_hits() {
        let body = r#"{"webPages":{"value":[{"name":"x","snippet":"4006381333931","url":"u"}]}}"#;
        let (url, handle) = serve_once("200 OK", body).await;
        let client = client_for(url);

        let res = client.search("SKU-1 Widget").await.unwrap();
        assert_eq!(res.hits.len(), 1);

        let request_line = handle.await.unwrap();
        assert!(request_line.starts_with("GET /v7.0/search?"));
        assert!(request_line.contains("q=SKU-1+Widget"));
        assert!(request_line.contains("textFormat=Raw"));
        assert!(request_line.contains("mkt=ro-RO"));
    }

    #[tokio::test]
    async fn test_search_non_success_is_provider_error() {
        let (url, _handle) = serve_once("500 Internal Server Error", "{}").await;
        let client = client_for(url);
        assert!(matches!(
            client.search("q").await,
            Err(ProviderError::Status(500))
        ));
    }

    #[tokio::test]
    async fn test_preflight_rejected_key() {
        let (url, handle) = serve_once("401 Unauthorized", "{}").await;
        let client = client_for(url);
        assert!(matches!(
            client.preflight().await,
            Err(ConfigError::PreflightRejected { status: 401 })
        ));
        let request_line = handle.await.unwrap();
        assert!(request_line.contains("q=test"));
        assert!(request_line.contains("count=1"));
    }

    #[tokio::test]
    async fn test_preflight_accepts_ok() {
        let (url, _handle) = serve_once("200 OK", "{}").await;
        assert!(client_for(url).preflight().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // bind then drop so the port is closed
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{}/search", addr)).unwrap();
        let client = client_for(url);

        assert!(matches!(
            client.preflight().await,
            Err(ConfigError::PreflightUnreachable(_))
        ));
        assert!(matches!(
            client.search("q").await,
            Err(ProviderError::Transport(_))
        ));
    }
}
