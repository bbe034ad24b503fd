use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimilarityError>;

/// Which operand of a similarity call an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Query,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Query => write!(f, "query"),
            Side::Target => write!(f, "target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("Dimension mismatch: query has {query_cols} columns, target has {target_cols}")]
    DimensionMismatch { query_cols: usize, target_cols: usize },

    #[error("Empty input: {side} matrix has no rows")]
    EmptyInput { side: Side },

    #[error("Column {col} out of range in row {row} (matrix has {cols} columns)")]
    ColumnOutOfRange { row: usize, col: usize, cols: usize },

    #[error("Ragged rows: row {row} has {found} entries, expected {expected}")]
    RaggedRows { row: usize, expected: usize, found: usize },

    #[error("Weight overflow at row {row}, column {col}")]
    WeightOverflow { row: usize, col: usize },

    #[error("Invalid sparse layout: {0}")]
    InvalidLayout(String),

    #[error("Buffer pool exhausted: requested {requested} bytes, {available} available")]
    PoolExhausted { requested: usize, available: usize },

    #[error("Failed to build thread pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR codec error: {0}")]
    Codec(#[from] serde_cbor::Error),
}
