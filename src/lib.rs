use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct EventsQueryParams {
    pub customer: String,
    pub lower: DateTime<Utc>,
    pub upper: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub lower: DateTime<Utc>,
    pub upper: DateTime<Utc>,
    pub buckets: Vec<Bucket>,
}

/// One hour of the histogram. `bucket` is the offset in hours from the
/// query's lower bound, `time` the absolute start of that hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub time: DateTime<Utc>,
    pub events: u64,
    pub bucket: usize,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod error;
pub mod ingest;
pub mod store;

pub use error::{IngestError, QueryError};
pub use store::{Event, EventStore, StoreHandle};
