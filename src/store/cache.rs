//! TTL-keyed cache of evidence-source responses.
//!
//! Append-only JSONL: `put` always inserts a new entry and never updates
//! one in place. Reads pick the most recently created non-expired entry
//! for (kind, query_key). An empty cached payload is a valid hit and
//! short-circuits the network call. Concurrent duplicate writes for the
//! same key are acceptable; the last write is simply another valid row.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One cached response row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub kind: String,
    pub query_key: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// JSONL-backed search cache
pub struct SearchCache {
    path: PathBuf,
    ttl_seconds: u64,
}

impl SearchCache {
    pub fn new(path: PathBuf, ttl_seconds: u64) -> Self {
        Self { path, ttl_seconds }
    }

    /// Most recent non-expired payload for (kind, query_key), or miss
    pub async fn get(&self, kind: &str, query_key: &str) -> Result<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let now = Utc::now();
        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open cache: {}", self.path.display()))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut hit: Option<CacheEntry> = None;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let entry: CacheEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse cache entry: {line}"))?;

            if entry.kind != kind || entry.query_key != query_key || entry.expires_at <= now {
                continue;
            }
            let newer = match &hit {
                Some(existing) => entry.created_at >= existing.created_at,
                None => true,
            };
            if newer {
                hit = Some(entry);
            }
        }

        Ok(hit.map(|e| e.payload))
    }

    /// Insert a new entry; existing entries are never overwritten
    pub async fn put(&self, kind: &str, query_key: &str, payload: serde_json::Value) -> Result<()> {
        let now = Utc::now();
        let entry = CacheEntry {
            kind: kind.to_string(),
            query_key: query_key.to_string(),
            payload,
            created_at: now,
            expires_at: now + Duration::seconds(self.ttl_seconds as i64),
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open cache: {}", self.path.display()))?;

        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;
        file.write_all(format!("{json}\n").as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache(ttl: u64) -> (SearchCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = SearchCache::new(temp.path().join("cache.jsonl"), ttl);
        (cache, temp)
    }

    #[tokio::test]
    async fn test_miss_on_empty_cache() {
        let (cache, _temp) = test_cache(60);
        assert!(cache.get("web", "q=x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (cache, _temp) = test_cache(60);
        let payload = serde_json::json!([{"url": "https://a.com"}]);
        cache.put("web", "q=x", payload.clone()).await.unwrap();

        let hit = cache.get("web", "q=x").await.unwrap().unwrap();
        assert_eq!(hit, payload);
    }

    #[tokio::test]
    async fn test_kind_and_key_discriminate() {
        let (cache, _temp) = test_cache(60);
        cache.put("web", "q=x", serde_json::json!(1)).await.unwrap();

        assert!(cache.get("image", "q=x").await.unwrap().is_none());
        assert!(cache.get("web", "q=y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_ignored() {
        let (cache, _temp) = test_cache(0);
        cache.put("web", "q=x", serde_json::json!(1)).await.unwrap();
        assert!(cache.get("web", "q=x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_most_recent_entry_wins() {
        let (cache, _temp) = test_cache(60);
        cache.put("web", "q=x", serde_json::json!("old")).await.unwrap();
        cache.put("web", "q=x", serde_json::json!("new")).await.unwrap();

        let hit = cache.get("web", "q=x").await.unwrap().unwrap();
        assert_eq!(hit, serde_json::json!("new"));
    }

    #[tokio::test]
    async fn test_empty_payload_is_a_hit() {
        let (cache, _temp) = test_cache(60);
        cache.put("web", "q=x", serde_json::json!([])).await.unwrap();

        let hit = cache.get("web", "q=x").await.unwrap();
        assert_eq!(hit, Some(serde_json::json!([])));
    }
}
