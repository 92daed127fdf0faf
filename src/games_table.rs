use anyhow::{Context, Result, anyhow};
use scraper::{ElementRef, Html, Selector};

use crate::score_matrix::ScorePair;

pub const GAMES_TABLE_ID: &str = "games";

// Repeated headers, section headings and summary rows.
const METADATA_ROW_CLASSES: &[&str] = &["thead", "stathead", "rowSum"];

#[derive(Debug, Clone, Default)]
pub struct SeasonRows {
    pub pairs: Vec<ScorePair>,
    pub rows_seen: usize,
    pub rows_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointsColumns {
    winning: usize,
    losing: usize,
}

pub fn parse_games_table(html: &str) -> Result<SeasonRows> {
    let document = Html::parse_document(html);
    let table_selector = selector(&format!("table#{GAMES_TABLE_ID}"))?;
    let header_selector = selector("thead tr")?;
    let body_selector = selector("tbody tr")?;
    let cell_selector = selector("th, td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| anyhow!("missing table#{GAMES_TABLE_ID}"))?;

    // Column labels live in the last header row; earlier ones are groupings.
    let header = table
        .select(&header_selector)
        .filter(|row| !is_metadata_row(row))
        .last()
        .ok_or_else(|| anyhow!("games table has no header row"))?;
    let labels = header
        .select(&cell_selector)
        .map(|cell| cell_text(&cell))
        .collect::<Vec<_>>();
    let columns = find_points_columns(&labels)?;

    let mut out = SeasonRows::default();
    for row in table.select(&body_selector) {
        if is_metadata_row(&row) {
            continue;
        }
        out.rows_seen += 1;
        let cells = row
            .select(&cell_selector)
            .map(|cell| cell_text(&cell))
            .collect::<Vec<_>>();
        match score_pair_from_cells(&cells, columns) {
            Some(pair) => out.pairs.push(pair),
            None => out.rows_skipped += 1,
        }
    }
    Ok(out)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .ok()
        .with_context(|| format!("invalid selector {css}"))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn is_metadata_row(row: &ElementRef<'_>) -> bool {
    let Some(class) = row.value().attr("class") else {
        return false;
    };
    let classes = class.split_whitespace().collect::<Vec<_>>();
    matches!(classes.as_slice(), [only] if METADATA_ROW_CLASSES.contains(only))
}

fn find_points_columns(labels: &[String]) -> Result<PointsColumns> {
    let position = |name: &str| labels.iter().position(|l| l == name);
    if let (Some(winning), Some(losing)) = (position("PtsW"), position("PtsL")) {
        return Ok(PointsColumns { winning, losing });
    }

    let mut pts = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_str() == "Pts")
        .map(|(idx, _)| idx);
    match (pts.next(), pts.next()) {
        (Some(winning), Some(losing)) => Ok(PointsColumns { winning, losing }),
        _ => Err(anyhow!(
            "games table is missing winning/losing points columns (headers: {})",
            labels.join("|")
        )),
    }
}

fn score_pair_from_cells(cells: &[String], columns: PointsColumns) -> Option<ScorePair> {
    let winning = parse_points(cells.get(columns.winning)?)?;
    let losing = parse_points(cells.get(columns.losing)?)?;
    Some(ScorePair::new(winning, losing))
}

fn parse_points(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}
