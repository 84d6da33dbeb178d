//! NewsAPI search provider.
//!
//! Without a usable key this provider returns no articles and makes no
//! request. With a key, a non-success response is a terminal error.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use super::http::{build_client, transport_error, DEFAULT_TIMEOUT};
use super::provider::{DataError, NewsError, NewsProvider, ProviderId};
use crate::domain::NewsDocument;

const BASE_URL: &str = "https://newsapi.org/v2/everything";

/// Keys shorter than this are treated as not configured.
pub const MIN_KEY_LEN: usize = 10;

/// Articles requested per search unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 8;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published_at: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl From<Article> for NewsDocument {
    fn from(a: Article) -> Self {
        let content = a
            .description
            .filter(|d| !d.is_empty())
            .or(a.content)
            .unwrap_or_default();
        NewsDocument {
            title: a.title.unwrap_or_default(),
            content,
            published: a.published_at.unwrap_or_default(),
            source: a.source.and_then(|s| s.name).unwrap_or_default(),
        }
    }
}

/// NewsAPI `/v2/everything` client.
pub struct NewsApiProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
    page_size: u32,
}

impl NewsApiProvider {
    pub fn new(api_key: Option<String>) -> Result<Self, DataError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: Option<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// The configured key, if it is long enough to be real.
    pub fn usable_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| k.len() >= MIN_KEY_LEN)
    }

    fn parse_articles(resp: SearchResponse) -> Vec<NewsDocument> {
        resp.articles.into_iter().map(NewsDocument::from).collect()
    }
}

impl NewsProvider for NewsApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::NewsApi
    }

    fn search(&self, query: &str) -> Result<Vec<NewsDocument>, NewsError> {
        let Some(key) = self.usable_key() else {
            warn!(query, "NEWSAPI_KEY missing or invalid, skipping news search");
            return Ok(Vec::new());
        };
        info!(query, page_size = self.page_size, "searching news");

        let page_size = self.page_size.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("apiKey", key),
            ])
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NewsError::Api {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let body: SearchResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse news search: {e}"))
        })?;
        let docs = Self::parse_articles(body);
        info!(query, articles = docs.len(), "news fetched");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_preferred_over_content() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"status":"ok","totalResults":2,"articles":[
                {"source":{"id":null,"name":"Reuters"},"title":"Apple beats","description":"Short summary","content":"Full body [+1200 chars]","publishedAt":"2024-05-03T12:00:00Z"},
                {"source":{"id":"bbc","name":"BBC"},"title":"Apple slips","description":"","content":"Body only","publishedAt":"2024-05-02T08:00:00Z"}
            ]}"#,
        )
        .unwrap();

        let docs = NewsApiProvider::parse_articles(resp);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Short summary");
        assert_eq!(docs[0].source, "Reuters");
        assert_eq!(docs[1].content, "Body only");
        assert_eq!(docs[1].published, "2024-05-02T08:00:00Z");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"articles":[{"title":null,"source":{"name":null}}]}"#).unwrap();
        let docs = NewsApiProvider::parse_articles(resp);
        assert_eq!(docs[0], NewsDocument::new("", "", "", ""));
    }

    #[test]
    fn short_keys_are_unusable() {
        let p = NewsApiProvider::new(Some("abc".into())).unwrap();
        assert!(p.usable_key().is_none());
        let p = NewsApiProvider::new(Some("0123456789abcdef".into())).unwrap();
        assert_eq!(p.usable_key(), Some("0123456789abcdef"));
    }
}
