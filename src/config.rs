use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Utc};

pub const DEFAULT_FIRST_YEAR: i32 = 1922;
pub const DEFAULT_LAST_YEAR: i32 = 2022;
pub const DEFAULT_DELAY_SECS: u64 = 3;
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.pro-football-reference.com/years/{year}/games.htm";
pub const DEFAULT_OUT: &str = "nfl_matrix.csv";
pub const YEAR_PLACEHOLDER: &str = "{year}";

// Accepted range for season years.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2200;

const VALUE_FLAGS: &[&str] = &[
    "--first-year",
    "--last-year",
    "--delay-secs",
    "--url-template",
    "--out",
    "--xlsx",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    pub first_year: i32,
    pub last_year: i32,
    pub delay: Duration,
    pub url_template: String,
    pub out: PathBuf,
    pub xlsx_out: Option<PathBuf>,
    pub use_cache: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            out: PathBuf::from(DEFAULT_OUT),
            xlsx_out: None,
            use_cache: true,
        }
    }
}

impl ScrapeConfig {
    /// Reads `.env.local`/`.env`, the process environment and command line.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::resolve(&args, |key| std::env::var(key).ok())
    }

    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        reject_unknown_args(args)?;
        let lookup = |flag: &str, key: &str| {
            arg_value(args, flag).or_else(|| env(key).filter(|v| !v.trim().is_empty()))
        };

        let mut cfg = Self::default();
        if let Some(raw) = lookup("--first-year", "SCORE_MATRIX_FIRST_YEAR") {
            cfg.first_year = parse_year(&raw).context("invalid first year")?;
        }
        if let Some(raw) = lookup("--last-year", "SCORE_MATRIX_LAST_YEAR") {
            cfg.last_year = parse_year(&raw).context("invalid last year")?;
        }
        if let Some(raw) = lookup("--delay-secs", "SCORE_MATRIX_DELAY_SECS") {
            cfg.delay = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| anyhow!("invalid delay seconds: {raw}"))?;
        }
        if let Some(raw) = lookup("--url-template", "SCORE_MATRIX_URL_TEMPLATE") {
            cfg.url_template = raw.trim().to_string();
        }
        if let Some(raw) = lookup("--out", "SCORE_MATRIX_OUT") {
            cfg.out = PathBuf::from(raw.trim());
        }
        if let Some(raw) = lookup("--xlsx", "SCORE_MATRIX_XLSX") {
            cfg.xlsx_out = Some(PathBuf::from(raw.trim()));
        }
        if args.iter().any(|a| a == "--no-cache")
            || env("SCORE_MATRIX_NO_CACHE").is_some_and(|v| is_truthy(&v))
        {
            cfg.use_cache = false;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        for year in [self.first_year, self.last_year] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(anyhow!("season {year} is outside {MIN_YEAR}..={MAX_YEAR}"));
            }
        }
        if self.first_year > self.last_year {
            return Err(anyhow!(
                "first year {} is after last year {}",
                self.first_year,
                self.last_year
            ));
        }
        if !self.url_template.contains(YEAR_PLACEHOLDER) {
            return Err(anyhow!(
                "url template must contain {YEAR_PLACEHOLDER}: {}",
                self.url_template
            ));
        }
        let current_year = Utc::now().year();
        if self.last_year > current_year {
            log::warn!(
                "last year {} is after the current year {current_year}; those seasons have no games yet",
                self.last_year
            );
        }
        Ok(())
    }

    pub fn seasons(&self) -> impl Iterator<Item = i32> {
        self.first_year..=self.last_year
    }

    pub fn season_count(&self) -> usize {
        (i64::from(self.last_year) - i64::from(self.first_year) + 1).max(0) as usize
    }

    pub fn season_url(&self, year: i32) -> String {
        self.url_template
            .replace(YEAR_PLACEHOLDER, &year.to_string())
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}

fn reject_unknown_args(args: &[String]) -> Result<()> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--no-cache" {
            continue;
        }
        let name = arg.split('=').next().unwrap_or(arg);
        if !VALUE_FLAGS.contains(&name) {
            return Err(anyhow!("unknown argument: {arg}"));
        }
        if arg.contains('=') {
            continue;
        }
        match iter.next() {
            Some(value) if !value.starts_with("--") => {}
            _ => return Err(anyhow!("missing value for {arg}")),
        }
    }
    Ok(())
}

fn parse_year(raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .with_context(|| format!("not a year: {raw}"))
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_cover_full_history() {
        let cfg = ScrapeConfig::resolve(&[], no_env).unwrap();
        assert_eq!(cfg, ScrapeConfig::default());
        assert_eq!(cfg.season_count(), 101);
        assert_eq!(
            cfg.season_url(1999),
            "https://www.pro-football-reference.com/years/1999/games.htm"
        );
    }

    #[test]
    fn flags_override_env() {
        let env = HashMap::from([
            ("SCORE_MATRIX_FIRST_YEAR", "1950"),
            ("SCORE_MATRIX_LAST_YEAR", "1960"),
            ("SCORE_MATRIX_NO_CACHE", "true"),
        ]);
        let cfg = ScrapeConfig::resolve(
            &args(&["--last-year=1955", "--delay-secs", "0.5", "--xlsx", "m.xlsx"]),
            |key| env.get(key).map(|v| v.to_string()),
        )
        .unwrap();
        assert_eq!(cfg.first_year, 1950);
        assert_eq!(cfg.last_year, 1955);
        assert_eq!(cfg.delay, Duration::from_millis(500));
        assert_eq!(cfg.xlsx_out, Some(PathBuf::from("m.xlsx")));
        assert!(!cfg.use_cache);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = ScrapeConfig::resolve(&args(&["--first-year", "2000", "--last-year", "1999"]), no_env)
            .unwrap_err();
        assert!(err.to_string().contains("after last year"));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(
            ScrapeConfig::resolve(&args(&["--url-template", "https://x.test/games"]), no_env)
                .is_err()
        );
    }

    #[test]
    fn oversized_delay_is_an_error() {
        let err = ScrapeConfig::resolve(&args(&["--delay-secs", "1e30"]), no_env).unwrap_err();
        assert!(err.to_string().contains("invalid delay seconds"));
        assert!(ScrapeConfig::resolve(&args(&["--delay-secs=-1"]), no_env).is_err());
        assert!(ScrapeConfig::resolve(&args(&["--delay-secs", "NaN"]), no_env).is_err());
    }

    #[test]
    fn flag_is_not_taken_as_a_value() {
        let err = ScrapeConfig::resolve(&args(&["--out", "--no-cache"]), no_env).unwrap_err();
        assert!(err.to_string().contains("missing value for --out"));
    }

    #[test]
    fn extreme_years_are_rejected() {
        let err = ScrapeConfig::resolve(
            &args(&["--first-year", "-2147483648", "--last-year", "2147483647"]),
            no_env,
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn season_count_does_not_overflow() {
        let cfg = ScrapeConfig {
            first_year: i32::MIN,
            last_year: i32::MAX,
            ..ScrapeConfig::default()
        };
        assert_eq!(cfg.season_count(), 1usize << 32);
    }

    #[test]
    fn unknown_and_dangling_flags_are_rejected() {
        assert!(ScrapeConfig::resolve(&args(&["--years"]), no_env).is_err());
        assert!(ScrapeConfig::resolve(&args(&["--out"]), no_env).is_err());
    }
}
