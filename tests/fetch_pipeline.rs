use std::cell::RefCell;
use std::time::Duration;

use anyhow::anyhow;

use nfl_score_matrix::ScorePair;
use nfl_score_matrix::config::ScrapeConfig;
use nfl_score_matrix::fetcher::collect_score_pairs;

fn season_page(winning: u32, losing: u32) -> String {
    format!(
        r#"<table id="games"><thead><tr><th>Week</th><th>Pts</th><th>Pts</th></tr></thead>
        <tbody>
        <tr><th>1</th><td>{winning}</td><td>{losing}</td></tr>
        <tr class="thead"><th>Week</th><td>Pts</td><td>Pts</td></tr>
        <tr><th>2</th><td></td><td></td></tr>
        </tbody></table>"#
    )
}

fn config(first_year: i32, last_year: i32) -> ScrapeConfig {
    ScrapeConfig {
        first_year,
        last_year,
        url_template: "https://example.test/years/{year}/games.htm".to_string(),
        ..ScrapeConfig::default()
    }
}

#[test]
fn walks_every_season_and_pauses_between_requests() {
    let cfg = config(2000, 2002);
    let urls = RefCell::new(Vec::new());
    let mut pauses = Vec::new();

    let summary = collect_score_pairs(
        &cfg,
        |url| {
            urls.borrow_mut().push(url.to_string());
            let n = urls.borrow().len() as u32;
            Ok(season_page(20 + n, n))
        },
        |delay| pauses.push(delay),
    )
    .expect("walk should succeed");

    assert_eq!(
        urls.into_inner(),
        vec![
            "https://example.test/years/2000/games.htm",
            "https://example.test/years/2001/games.htm",
            "https://example.test/years/2002/games.htm",
        ]
    );
    assert_eq!(pauses, vec![Duration::from_secs(3); 2]);
    assert_eq!(
        summary.pairs,
        vec![
            ScorePair::new(21, 1),
            ScorePair::new(22, 2),
            ScorePair::new(23, 3)
        ]
    );
    assert_eq!(summary.seasons.len(), 3);
    assert_eq!(summary.seasons[1].year, 2001);
    assert_eq!(summary.seasons[1].rows_seen, 2);
    assert_eq!(summary.rows_skipped(), 3);
}

#[test]
fn single_season_never_pauses() {
    let cfg = config(1999, 1999);
    let mut pauses = 0;
    let summary = collect_score_pairs(&cfg, |_| Ok(season_page(13, 6)), |_| pauses += 1)
        .expect("walk should succeed");
    assert_eq!(pauses, 0);
    assert_eq!(summary.pairs, vec![ScorePair::new(13, 6)]);
}

#[test]
fn first_failing_season_aborts_the_walk() {
    let cfg = config(2000, 2003);
    let mut calls = 0;
    let mut pauses = 0;
    let err = collect_score_pairs(
        &cfg,
        |url| {
            calls += 1;
            if url.contains("2001") {
                Err(anyhow!("http 429 Too Many Requests"))
            } else {
                Ok(season_page(10, 3))
            }
        },
        |_| pauses += 1,
    )
    .unwrap_err();

    assert_eq!(calls, 2);
    assert_eq!(pauses, 1);
    assert!(format!("{err:#}").contains("season 2001"));
    assert!(format!("{err:#}").contains("429"));
}

#[test]
fn malformed_page_aborts_with_season_context() {
    let cfg = config(2010, 2011);
    let err = collect_score_pairs(&cfg, |_| Ok("<html></html>".to_string()), |_| {})
        .unwrap_err();
    assert!(format!("{err:#}").contains("season 2010"));
}
