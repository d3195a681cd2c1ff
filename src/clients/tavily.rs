//! Tavily web search client.

use super::{SearchBackend, SearchHit};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Search backend backed by the Tavily search API.
pub struct TavilyClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    search_depth: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl TavilyClient {
    pub fn new(api_url: &str, api_key: &str, search_depth: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(SporError::Config(
                "Tavily API key is empty. Set TAVILY_API_KEY or search.api_key".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            search_depth: search_depth.to_string(),
        })
    }
}

#[async_trait]
impl SearchBackend for TavilyClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query,
            max_results,
            search_depth: &self.search_depth,
            include_answer: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SporError::Search(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let mut hits = parse_results(&body)?;
        hits.truncate(max_results);
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchHit>> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
        SporError::Search(format!(
            "Failed to parse search response: {} (first 200 chars: {})",
            e,
            body.chars().take(200).collect::<String>()
        ))
    })?;
    Ok(response.results)
}
