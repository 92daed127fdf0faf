use anyhow::{Context, Result};

use nfl_score_matrix::config::ScrapeConfig;
use nfl_score_matrix::http_client::http_client;
use nfl_score_matrix::{build_matrix, fetcher, matrix_export};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ScrapeConfig::load()?;
    log::info!(
        "scraping seasons {}..={} ({} pages, {:?} between requests)",
        config.first_year,
        config.last_year,
        config.season_count(),
        config.delay
    );

    let client = http_client()?;
    let summary = fetcher::fetch_all_seasons(&config, client)?;
    let matrix = build_matrix(&summary.pairs).context("no valid scores collected")?;

    matrix_export::save_csv(&matrix, &config.out)?;
    if let Some(xlsx) = config.xlsx_out.as_deref() {
        matrix_export::save_xlsx(&matrix, xlsx)?;
    }

    println!("Score matrix complete");
    println!("Seasons: {}", summary.seasons.len());
    println!("Games: {}", summary.pairs.len());
    println!("Rows skipped: {}", summary.rows_skipped());
    println!("Matrix: {0}x{0}", matrix.dim());
    println!("CSV: {}", config.out.display());
    if let Some(xlsx) = config.xlsx_out.as_deref() {
        println!("XLSX: {}", xlsx.display());
    }

    Ok(())
}
