use thiserror::Error;

/// Marks a cell whose score combination cannot occur.
pub const SENTINEL: i64 = -1;

/// No final score of exactly one point exists in this sport.
const IMPOSSIBLE_SCORE: usize = 1;

/// Highest score the grid will be sized for; anything above is bad data.
pub const MAX_SCORE: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("no score pairs to aggregate")]
    EmptyInput,
    #[error("matrix is not square: row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("invalid cell value {value} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, value: i64 },
    #[error("score {max_score} exceeds the largest supported score {limit}")]
    TooLarge { max_score: u32, limit: u32 },
}

/// One completed game's final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScorePair {
    pub winning: u32,
    pub losing: u32,
}

impl ScorePair {
    pub fn new(winning: u32, losing: u32) -> Self {
        Self { winning, losing }
    }

    /// Parses a final score such as `24-17` or `17 : 24`; the larger value
    /// is taken as the winning score.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut nums = raw
            .split(|ch: char| !ch.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u32>());
        let a = nums.next()?.ok()?;
        let b = nums.next()?.ok()?;
        if nums.next().is_some() {
            return None;
        }
        Some(Self::new(a.max(b), a.min(b)))
    }
}

/// Square grid of final-score frequencies.
///
/// Rows are indexed by the losing score and columns by the winning score.
/// Cells below the diagonal, and every cell in row or column 1, hold
/// [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMatrix {
    dim: usize,
    cells: Vec<i64>,
}

/// Counts `pairs` into a [`ScoreMatrix`] sized by the highest score seen.
pub fn build_matrix(pairs: &[ScorePair]) -> Result<ScoreMatrix, MatrixError> {
    ScoreMatrix::build(pairs)
}

pub fn is_sentinel_cell(losing: usize, winning: usize) -> bool {
    losing > winning || losing == IMPOSSIBLE_SCORE || winning == IMPOSSIBLE_SCORE
}

impl ScoreMatrix {
    pub fn build(pairs: &[ScorePair]) -> Result<Self, MatrixError> {
        let max_score = pairs
            .iter()
            .map(|p| p.winning.max(p.losing))
            .max()
            .ok_or(MatrixError::EmptyInput)?;
        let too_large = MatrixError::TooLarge {
            max_score,
            limit: MAX_SCORE,
        };
        if max_score > MAX_SCORE {
            return Err(too_large);
        }

        let dim = max_score as usize + 1;
        let len = dim.checked_mul(dim).ok_or(too_large)?;
        let mut cells = vec![0i64; len];
        for pair in pairs {
            cells[pair.losing as usize * dim + pair.winning as usize] += 1;
        }

        for losing in 0..dim {
            for winning in 0..dim {
                if is_sentinel_cell(losing, winning) {
                    cells[losing * dim + winning] = SENTINEL;
                }
            }
        }

        Ok(Self { dim, cells })
    }

    /// Rebuilds a matrix from persisted rows.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::EmptyInput);
        }
        let dim = rows.len();
        let mut cells = Vec::with_capacity(dim * dim);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(MatrixError::NotSquare {
                    row: row_idx,
                    len: row.len(),
                    expected: dim,
                });
            }
            if let Some((col, value)) = row.iter().enumerate().find(|(_, v)| **v < SENTINEL) {
                return Err(MatrixError::InvalidCell {
                    row: row_idx,
                    col,
                    value: *value,
                });
            }
            cells.extend(row);
        }
        Ok(Self { dim, cells })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, losing: usize, winning: usize) -> Option<i64> {
        if losing >= self.dim || winning >= self.dim {
            return None;
        }
        Some(self.cells[losing * self.dim + winning])
    }

    /// How often a game ended `winning`-`losing`.
    ///
    /// Returns `None` for impossible combinations. A possible score beyond
    /// the matrix bounds was simply never observed and reports 0.
    pub fn occurrences(&self, winning: u32, losing: u32) -> Option<u64> {
        let (losing, winning) = (losing as usize, winning as usize);
        if is_sentinel_cell(losing, winning) {
            return None;
        }
        match self.get(losing, winning) {
            Some(SENTINEL) => None,
            Some(count) => u64::try_from(count).ok(),
            None => Some(0),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i64]> {
        self.cells.chunks(self.dim)
    }

    pub fn total_games(&self) -> u64 {
        self.cells
            .iter()
            .filter(|v| **v > 0)
            .map(|v| *v as u64)
            .sum()
    }
}
