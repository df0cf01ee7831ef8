use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

use crate::{Bucket, error::QueryError};

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Clone, Debug)]
pub struct Event {
    pub transaction_id: String,
    pub event_type: String,
    pub time: DateTime<Utc>,
}

/// Per-customer event sequences, each sorted ascending by time.
/// Built once from the feed, read-only afterwards.
#[derive(Debug)]
pub struct EventStore {
    customers: HashMap<String, Vec<Event>>,
}

impl EventStore {
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, Event)>,
    {
        let mut customers: HashMap<String, Vec<Event>> = HashMap::new();
        for (customer_id, event) in records {
            customers.entry(customer_id).or_default().push(event);
        }
        for events in customers.values_mut() {
            // stable: equal timestamps keep feed order
            events.sort_by_key(|e| e.time);
        }
        Self { customers }
    }

    pub fn lookup(&self, customer_id: &str) -> Option<&[Event]> {
        self.customers.get(customer_id).map(Vec::as_slice)
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// Dense one-hour histogram over `[lower, upper)`. Every bucket in the
    /// range is present, zero-count buckets included. The final bucket spans
    /// a full hour even when `upper - lower` is not a whole number of hours,
    /// and counts every event inside that hour.
    pub fn hourly_buckets(
        &self,
        customer_id: &str,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Result<Vec<Bucket>, QueryError> {
        let events = self
            .lookup(customer_id)
            .ok_or_else(|| QueryError::UnknownCustomer(customer_id.to_string()))?;

        let span_ms = (upper - lower).num_milliseconds();
        if span_ms <= 0 {
            return Err(QueryError::InvalidRange { lower, upper });
        }
        let total_buckets = (span_ms as u64).div_ceil(MILLIS_PER_HOUR as u64) as usize;

        let mut buckets: Vec<Bucket> = (0..total_buckets)
            .map(|i| Bucket {
                time: lower + Duration::milliseconds(i as i64 * MILLIS_PER_HOUR),
                events: 0,
                bucket: i,
            })
            .collect();

        for event in &events[first_at_or_after(events, lower)..] {
            let idx = ((event.time - lower).num_milliseconds() / MILLIS_PER_HOUR) as usize;
            if idx >= total_buckets {
                // sorted, so nothing later can land back in range
                break;
            }
            buckets[idx].events += 1;
        }

        Ok(buckets)
    }
}

/// Index of the first event with `time >= lower` (leftmost on ties), or
/// `events.len()` when every event precedes `lower`.
pub fn first_at_or_after(events: &[Event], lower: DateTime<Utc>) -> usize {
    let mut low = 0;
    let mut high = events.len();
    while low < high {
        let mid = (low + high) / 2;
        if events[mid].time < lower {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// One-shot gate around the store: the load task publishes once, every
/// query that arrived earlier wakes and shares the same immutable index.
#[derive(Clone, Default)]
pub struct StoreHandle {
    slot: Arc<Mutex<Option<Arc<EventStore>>>>,
    ready: Arc<Notify>,
}

impl StoreHandle {
    pub fn publish(&self, store: EventStore) {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return;
        }
        *slot = Some(Arc::new(store));
        drop(slot);
        self.ready.notify_waiters();
    }

    pub async fn get(&self) -> Arc<EventStore> {
        loop {
            // register before checking, so a publish in between cannot be missed
            let notified = self.ready.notified();
            if let Some(store) = self.slot.lock().unwrap().clone() {
                return store;
            }
            notified.await;
        }
    }
}
