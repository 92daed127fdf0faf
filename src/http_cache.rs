use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "nfl_score_matrix";
const PAGES_DIR: &str = "pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: String,
}

/// On-disk store of fetched pages, one JSON file per URL.
///
/// Every fetch still hits the network; stored validators only turn an
/// unchanged page into a `304`.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: Option<PathBuf>,
}

impl PageCache {
    pub fn from_env() -> Self {
        Self {
            dir: app_cache_dir().map(|dir| dir.join(PAGES_DIR)),
        }
    }

    pub fn at(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    fn entry_path(&self, url: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", cache_key(url))))
    }

    fn load(&self, url: &str) -> Option<CacheEntry> {
        let raw = fs::read_to_string(self.entry_path(url)?).ok()?;
        let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
        if entry.version != CACHE_VERSION || entry.url != url {
            return None;
        }
        Some(entry)
    }

    fn store(&self, entry: &CacheEntry) -> Result<()> {
        let Some(path) = self.entry_path(&entry.url) else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("create page cache dir")?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry).context("serialize page cache entry")?;
        fs::write(&tmp, json).context("write page cache entry")?;
        fs::rename(&tmp, &path).context("swap page cache entry")?;
        Ok(())
    }
}

pub fn fetch_page_cached(client: &Client, url: &str, cache: &PageCache) -> Result<String> {
    let cached_entry = cache.load(url);

    let mut req = client.get(url);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        let Some(entry) = cached_entry else {
            return Err(anyhow!("received 304 without cached body for {url}"));
        };
        log::debug!("page unchanged since {}: {url}", entry.fetched_at);
        return Ok(entry.body);
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }

    if cache.is_enabled() {
        let entry = CacheEntry {
            version: CACHE_VERSION,
            url: url.to_string(),
            body: body.clone(),
            etag: header_string(&headers, ETAG),
            last_modified: header_string(&headers, LAST_MODIFIED),
            fetched_at: Utc::now().to_rfc3339(),
        };
        if let Err(err) = cache.store(&entry) {
            log::warn!("page cache write failed for {url}: {err:#}");
        }
    }
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn cache_key(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    stripped
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_filesystem_safe() {
        assert_eq!(
            cache_key("https://www.pro-football-reference.com/years/1999/games.htm"),
            "www_pro_football_reference_com_years_1999_games_htm"
        );
    }

    #[test]
    fn stored_entry_is_loaded_back_for_same_url() {
        let dir = std::env::temp_dir().join(format!(
            "nfl_score_matrix_cache_test_{}",
            std::process::id()
        ));
        let cache = PageCache::at(dir.clone());
        let url = "https://example.test/years/2001/games.htm";
        let entry = CacheEntry {
            version: CACHE_VERSION,
            url: url.to_string(),
            body: "<html></html>".to_string(),
            etag: Some("\"abc\"".to_string()),
            last_modified: None,
            fetched_at: Utc::now().to_rfc3339(),
        };
        cache.store(&entry).expect("store entry");

        let loaded = cache.load(url).expect("entry should load");
        assert_eq!(loaded.body, "<html></html>");
        assert_eq!(loaded.etag.as_deref(), Some("\"abc\""));
        assert!(cache.load("https://example.test/years/2002/games.htm").is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = PageCache::disabled();
        assert!(!cache.is_enabled());
        assert!(cache.load("https://example.test/").is_none());
    }
}
