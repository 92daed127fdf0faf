use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nfl_score_matrix::config::DEFAULT_OUT;
use nfl_score_matrix::{ScorePair, matrix_export};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let lookup = parse_args(&args)?;
    let matrix_path = lookup
        .matrix
        .or_else(|| std::env::var("SCORE_MATRIX_OUT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));

    let matrix = matrix_export::load_csv(&matrix_path)?;
    log::debug!(
        "loaded {0}x{0} matrix from {1}",
        matrix.dim(),
        matrix_path.display()
    );

    for raw in lookup.scores {
        let pair = ScorePair::parse(&raw).with_context(|| format!("not a final score: {raw}"))?;
        match matrix.occurrences(pair.winning, pair.losing) {
            Some(count) => println!("{}-{}: {count}", pair.winning, pair.losing),
            None => println!("{}-{}: impossible", pair.winning, pair.losing),
        }
    }
    println!("Games in matrix: {}", matrix.total_games());

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct LookupArgs {
    matrix: Option<PathBuf>,
    scores: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<LookupArgs> {
    let mut matrix = None;
    let mut scores = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--matrix=") {
            matrix = Some(matrix_path(path, arg)?);
        } else if arg == "--matrix" {
            let next = iter
                .next()
                .filter(|v| !v.starts_with("--"))
                .ok_or_else(|| anyhow!("missing value for --matrix"))?;
            matrix = Some(matrix_path(next, arg)?);
        } else if arg.starts_with("--") {
            return Err(anyhow!("unknown argument: {arg}"));
        } else {
            scores.push(arg.clone());
        }
    }
    if scores.is_empty() {
        return Err(anyhow!(
            "usage: score_lookup [--matrix PATH] SCORE... (e.g. 24-17)"
        ));
    }
    Ok(LookupArgs { matrix, scores })
}

fn matrix_path(raw: &str, arg: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("missing value for {arg}"));
    }
    Ok(PathBuf::from(trimmed))
}
