//! # cotiza-search
//!
//! Client for the upstream product search API.
//!
//! Issues locale-scoped queries and reshapes whatever the upstream returns
//! into uniform hit records; the upstream itself stays an opaque
//! collaborator behind a base URL.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the upstream search API.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Http(String),

    #[error("Unexpected search response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// One reshaped search result.
///
/// Fields the upstream omits come back as empty strings, except the result
/// type which defaults to `product`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub price: String,
    pub source: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Client for the upstream search API.
pub struct SearchClient {
    client: Client,
    base_url: String,
    country: String,
    language: String,
}

fn text_field(entry: &JsonValue, key: &str) -> String {
    match entry.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn hit_from_json(entry: &JsonValue) -> SearchHit {
    SearchHit {
        title: text_field(entry, "title"),
        price: text_field(entry, "price"),
        source: text_field(entry, "source"),
        link: text_field(entry, "link"),
        kind: entry
            .get("type")
            .and_then(JsonValue::as_str)
            .unwrap_or("product")
            .to_string(),
    }
}

impl SearchClient {
    /// Build a client for the given upstream URL with the default `co`/`es`
    /// locale.
    ///
    /// The underlying HTTP client uses a 30-second timeout and bypasses
    /// system proxy lookup.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if building the underlying HTTP client
    /// fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        Ok(SearchClient {
            client,
            base_url: base_url.into(),
            country: "co".to_string(),
            language: "es".to_string(),
        })
    }

    /// Override the country/language pair sent with every query.
    #[must_use]
    pub fn with_locale(mut self, country: &str, language: &str) -> Self {
        self.country = country.to_string();
        self.language = language.to_string();
        self
    }

    /// Query the upstream for a term and reshape the `results` array.
    ///
    /// A missing or non-array `results` field yields an empty hit list.
    ///
    /// # Errors
    ///
    /// `SearchError::Http` on transport failure or a non-2xx status;
    /// `SearchError::InvalidResponse` when the body is not JSON.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", term),
                ("gl", self.country.as_str()),
                ("hl", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "HTTP {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let hits: Vec<SearchHit> = body
            .get("results")
            .and_then(JsonValue::as_array)
            .map(|entries| entries.iter().map(hit_from_json).collect())
            .unwrap_or_default();

        debug!(term, hits = hits.len(), "search results reshaped");
        Ok(hits)
    }
}
