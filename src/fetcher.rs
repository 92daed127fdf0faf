use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::ScrapeConfig;
use crate::games_table::parse_games_table;
use crate::http_cache::{PageCache, fetch_page_cached};
use crate::score_matrix::ScorePair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonTally {
    pub year: i32,
    pub rows_seen: usize,
    pub pairs_kept: usize,
    pub rows_skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub pairs: Vec<ScorePair>,
    pub seasons: Vec<SeasonTally>,
}

impl CollectSummary {
    pub fn rows_skipped(&self) -> usize {
        self.seasons.iter().map(|s| s.rows_skipped).sum()
    }
}

/// Walks every configured season in order, one page per season.
///
/// `fetch_page` receives the season URL; `pause` runs between requests but
/// not after the last one. The first failing season aborts the walk.
pub fn collect_score_pairs(
    config: &ScrapeConfig,
    mut fetch_page: impl FnMut(&str) -> Result<String>,
    mut pause: impl FnMut(Duration),
) -> Result<CollectSummary> {
    let mut summary = CollectSummary::default();

    for year in config.seasons() {
        log::info!("{year}...");
        let url = config.season_url(year);
        let html = fetch_page(&url).with_context(|| format!("season {year}: fetch {url}"))?;
        let rows = parse_games_table(&html).with_context(|| format!("season {year}: parse {url}"))?;

        log::debug!(
            "season {year}: {} rows, {} scores, {} skipped",
            rows.rows_seen,
            rows.pairs.len(),
            rows.rows_skipped
        );
        summary.seasons.push(SeasonTally {
            year,
            rows_seen: rows.rows_seen,
            pairs_kept: rows.pairs.len(),
            rows_skipped: rows.rows_skipped,
        });
        summary.pairs.extend(rows.pairs);

        if year != config.last_year {
            pause(config.delay);
        }
    }

    Ok(summary)
}

/// Network-backed walk over the configured seasons.
pub fn fetch_all_seasons(config: &ScrapeConfig, client: &Client) -> Result<CollectSummary> {
    let cache = if config.use_cache {
        PageCache::from_env()
    } else {
        PageCache::disabled()
    };
    collect_score_pairs(
        config,
        |url| fetch_page_cached(client, url, &cache),
        std::thread::sleep,
    )
}
