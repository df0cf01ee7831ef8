use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown customer id {0:?}")]
    UnknownCustomer(String),
    #[error("upper bound {upper} must be after lower bound {lower}")]
    InvalidRange {
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("line {line}: expected 4 comma-separated fields, got {fields}")]
    MalformedRecord { line: usize, fields: usize },
    #[error("line {line}: unparseable timestamp {value:?}: {source}")]
    MalformedTimestamp {
        line: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
