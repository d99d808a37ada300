//! Google Custom Search adapter (web and image modes).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{EvidenceSource, SearchResult};
use crate::config::Config;
use crate::core::sanitize::sanitize_untrusted_text;

const CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Which CSE mode this instance queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CseKind {
    Web,
    Image,
}

/// Google Custom Search client
pub struct GoogleCse {
    api_key: Option<String>,
    engine_id: Option<String>,
    kind: CseKind,
    client: reqwest::Client,
}

impl GoogleCse {
    /// Web-search instance
    pub fn web(config: &Config) -> Result<Self> {
        Self::new(config, CseKind::Web)
    }

    /// Image-search instance
    pub fn images(config: &Config) -> Result<Self> {
        Self::new(config, CseKind::Image)
    }

    fn new(config: &Config, kind: CseKind) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source_timeout_seconds))
            .build()
            .context("Failed to build HTTP client for Google CSE")?;

        Ok(Self {
            api_key: config.google_cse_api_key.clone(),
            engine_id: config.google_cse_engine_id.clone(),
            kind,
            client,
        })
    }
}

#[async_trait]
impl EvidenceSource for GoogleCse {
    fn name(&self) -> &str {
        match self.kind {
            CseKind::Web => "web",
            CseKind::Image => "image",
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>> {
        let (Some(api_key), Some(engine_id)) = (&self.api_key, &self.engine_id) else {
            anyhow::bail!("Google CSE is not configured");
        };

        let num = count.clamp(1, 10).to_string();
        let mut params = vec![
            ("key", api_key.as_str()),
            ("cx", engine_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ];
        if self.kind == CseKind::Image {
            params.push(("searchType", "image"));
        }

        let response = self
            .client
            .get(CSE_ENDPOINT)
            .query(&params)
            .send()
            .await
            .context("Google CSE request failed")?
            .error_for_status()
            .context("Google CSE returned an error status")?;

        let data: CseResponse = response
            .json()
            .await
            .context("Failed to parse Google CSE response")?;

        let results = data
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| self.convert(item))
            .collect();

        Ok(results)
    }
}

impl GoogleCse {
    fn convert(&self, item: CseItem) -> SearchResult {
        match self.kind {
            CseKind::Web => SearchResult {
                url: item.link.clone(),
                title: item.title.as_deref().map(|t| sanitize_untrusted_text(t, 500)),
                snippet: item.snippet.as_deref().map(|s| sanitize_untrusted_text(s, 800)),
                publisher: item.display_link.clone(),
                published_date: item.pagemap.as_ref().and_then(extract_published_date),
                thumbnail_url: item.pagemap.as_ref().and_then(extract_thumbnail),
            },
            CseKind::Image => SearchResult {
                url: item.link.clone(),
                title: item.title.as_deref().map(|t| sanitize_untrusted_text(t, 500)),
                snippet: None,
                publisher: item.display_link.clone(),
                published_date: None,
                thumbnail_url: item.image.and_then(|i| i.thumbnail_link),
            },
        }
    }
}

/// Best effort: some results carry dates in their metatags.
fn extract_published_date(pagemap: &Pagemap) -> Option<String> {
    let tags = pagemap.metatags.as_ref()?.first()?;
    tags.get("article:published_time")
        .or_else(|| tags.get("og:updated_time"))
        .cloned()
}

fn extract_thumbnail(pagemap: &Pagemap) -> Option<String> {
    if let Some(thumb) = pagemap
        .cse_thumbnail
        .as_ref()
        .and_then(|t| t.first())
        .and_then(|t| t.src.clone())
    {
        return Some(thumb);
    }
    if let Some(img) = pagemap
        .cse_image
        .as_ref()
        .and_then(|i| i.first())
        .and_then(|i| i.src.clone())
    {
        return Some(img);
    }
    pagemap
        .metatags
        .as_ref()
        .and_then(|m| m.first())
        .and_then(|tags| tags.get("og:image").cloned())
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    items: Option<Vec<CseItem>>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
    #[serde(rename = "displayLink")]
    display_link: Option<String>,
    pagemap: Option<Pagemap>,
    image: Option<CseImage>,
}

#[derive(Debug, Deserialize)]
struct Pagemap {
    cse_thumbnail: Option<Vec<PagemapImage>>,
    cse_image: Option<Vec<PagemapImage>>,
    metatags: Option<Vec<std::collections::HashMap<String, String>>>,
}

#[derive(Debug, Deserialize)]
struct PagemapImage {
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CseImage {
    #[serde(rename = "thumbnailLink")]
    thumbnail_link: Option<String>,
}
