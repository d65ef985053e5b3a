//! Web-search collaborator
//!
//! Supplies per-request context chunks for the LLM generator. The provider
//! is deliberately best-effort: a missing API key or any transport failure
//! degrades to an empty chunk list so the pipeline always continues with
//! whatever context it has.

use crate::types::SearchChunk;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable carrying the Tavily API key.
pub const API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Trait for web-search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch context chunks for `query`. Degrades to empty on any upstream
    /// failure; never errors.
    async fn search(&self, query: &str) -> Vec<SearchChunk>;
}

/// Provider that returns no chunks (no credentials, tests).
pub struct NoOpSearch;

#[async_trait]
impl SearchProvider for NoOpSearch {
    async fn search(&self, _query: &str) -> Vec<SearchChunk> {
        Vec::new()
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: String,
    search_depth: &'static str,
    include_answer: bool,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    content: String,
}

/// Tavily-backed search provider.
pub struct TavilyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl TavilyClient {
    /// Build a client reading the API key from [`API_KEY_ENV`].
    ///
    /// A missing key is not an error; the client just returns empty results.
    pub fn new(base_url: &str, max_results: usize, timeout_secs: u64) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok();
        if api_key.is_none() {
            warn!(
                "{} is not set; web search will return empty results",
                API_KEY_ENV
            );
        }
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results,
        }
    }

    async fn fetch(&self, api_key: &str, query: &str) -> Result<Vec<SearchChunk>, reqwest::Error> {
        let request = TavilyRequest {
            api_key,
            query: format!("step-by-step solution for {query}"),
            search_depth: "basic",
            include_answer: false,
            max_results: self.max_results,
        };

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: TavilyResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .enumerate()
            .map(|(i, r)| SearchChunk {
                url: r.url,
                chunk_id: format!("web-{}", i + 1),
                text: r.content,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Vec<SearchChunk> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Vec::new();
        };

        info!(query, "performing web search");
        match self.fetch(api_key, query).await {
            Ok(chunks) => {
                info!(chunks = chunks.len(), "web search returned");
                chunks
            }
            Err(e) => {
                warn!(error = %e, "web search unavailable; continuing with empty results");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_search_is_empty() {
        let provider = NoOpSearch;
        assert!(provider.search("what is 2+2").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_degrades_to_empty() {
        let client = TavilyClient {
            http: reqwest::Client::new(),
            base_url: "https://api.tavily.example".to_string(),
            api_key: None,
            max_results: 5,
        };
        assert!(client.search("what is 2+2").await.is_empty());
    }

    #[test]
    fn test_chunk_ids_are_sequential() {
        let body = r#"{"results":[
            {"url":"https://a.example","content":"first"},
            {"url":"https://b.example","content":"second"}
        ]}"#;
        let parsed: TavilyResponse = serde_json::from_str(body).unwrap();
        let chunks: Vec<SearchChunk> = parsed
            .results
            .into_iter()
            .enumerate()
            .map(|(i, r)| SearchChunk {
                url: r.url,
                chunk_id: format!("web-{}", i + 1),
                text: r.content,
            })
            .collect();
        assert_eq!(chunks[0].chunk_id, "web-1");
        assert_eq!(chunks[1].chunk_id, "web-2");
    }
}
