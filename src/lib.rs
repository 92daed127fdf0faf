pub mod config;
pub mod fetcher;
pub mod games_table;
pub mod http_cache;
pub mod http_client;
pub mod matrix_export;
pub mod score_matrix;

pub use score_matrix::{MatrixError, ScoreMatrix, ScorePair, build_matrix};
