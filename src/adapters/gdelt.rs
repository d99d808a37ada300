//! GDELT 2.1 DOC adapter: the secondary news index.
//!
//! Requires no credentials, so it is always configured. Results are
//! additive evidence and stay Neutral unless their domain is trusted.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{EvidenceSource, SearchResult};
use crate::config::Config;
use crate::core::sanitize::sanitize_untrusted_text;

const GDELT_DOC_ENDPOINT: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

/// GDELT DOC API client
pub struct GdeltNews {
    client: reqwest::Client,
}

impl GdeltNews {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source_timeout_seconds))
            .build()
            .context("Failed to build HTTP client for GDELT")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl EvidenceSource for GdeltNews {
    fn name(&self) -> &str {
        "gdelt"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>> {
        let maxrecords = count.clamp(1, 50).to_string();
        let params = [
            ("query", query),
            ("mode", "ArtList"),
            ("format", "json"),
            ("maxrecords", maxrecords.as_str()),
            ("sort", "HybridRel"),
        ];

        let response = self
            .client
            .get(GDELT_DOC_ENDPOINT)
            .query(&params)
            .send()
            .await
            .context("GDELT request failed")?
            .error_for_status()
            .context("GDELT returned an error status")?;

        let data: GdeltResponse = response
            .json()
            .await
            .context("Failed to parse GDELT response")?;

        let results = data
            .articles
            .unwrap_or_default()
            .into_iter()
            .map(convert)
            .collect();

        Ok(results)
    }
}

fn convert(article: GdeltArticle) -> SearchResult {
    SearchResult {
        url: article.url,
        title: article.title.as_deref().map(|t| sanitize_untrusted_text(t, 500)),
        snippet: article.seendate.as_deref().map(|s| sanitize_untrusted_text(s, 120)),
        publisher: article
            .source_country
            .as_deref()
            .map(|p| sanitize_untrusted_text(p, 120))
            .filter(|p| !p.is_empty()),
        published_date: article.seendate,
        thumbnail_url: None,
    }
}

#[derive(Debug, Deserialize)]
struct GdeltResponse {
    articles: Option<Vec<GdeltArticle>>,
}

#[derive(Debug, Deserialize)]
struct GdeltArticle {
    url: Option<String>,
    title: Option<String>,
    seendate: Option<String>,
    #[serde(rename = "sourcecountry", alias = "sourceCountry")]
    source_country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_configured() {
        let source = GdeltNews::new(&Config::default()).unwrap();
        assert!(source.is_configured());
        assert_eq!(source.name(), "gdelt");
    }

    #[test]
    fn test_article_conversion() {
        let raw = r#"{
            "articles": [{
                "url": "https://example.net/story",
                "title": "Something happened",
                "seendate": "20240315T120000Z",
                "sourcecountry": "Kenya"
            }]
        }"#;

        let parsed: GdeltResponse = serde_json::from_str(raw).unwrap();
        let result = convert(parsed.articles.unwrap().remove(0));

        assert_eq!(result.url.as_deref(), Some("https://example.net/story"));
        assert_eq!(result.publisher.as_deref(), Some("Kenya"));
        assert_eq!(result.published_date.as_deref(), Some("20240315T120000Z"));
    }

    #[test]
    fn test_empty_articles() {
        let parsed: GdeltResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.articles.is_none());
    }
}
