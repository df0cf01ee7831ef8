use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::info;

use crate::{
    error::IngestError,
    store::{Event, EventStore},
};

/// Reads the whole feed and builds the index. The reader buffers partial
/// lines across read chunks, so a record spanning two chunks is reassembled
/// before parsing.
pub async fn load(path: impl AsRef<Path>) -> Result<EventStore, IngestError> {
    let file = File::open(path.as_ref()).await?;
    let mut lines = BufReader::new(file).lines();

    let mut records = Vec::new();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(parse_record(line, line_no)?);
    }

    info!(records = records.len(), "event feed read");
    Ok(EventStore::build(records))
}

/// One feed row: `customerId,eventType,transactionId,time`.
fn parse_record(line: &str, line_no: usize) -> Result<(String, Event), IngestError> {
    let mut fields = line.split(',');
    let (Some(customer_id), Some(event_type), Some(transaction_id), Some(time), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(IngestError::MalformedRecord {
            line: line_no,
            fields: line.split(',').count(),
        });
    };

    let time = time
        .parse::<DateTime<Utc>>()
        .map_err(|source| IngestError::MalformedTimestamp {
            line: line_no,
            value: time.to_string(),
            source,
        })?;

    Ok((
        customer_id.to_string(),
        Event {
            transaction_id: transaction_id.to_string(),
            event_type: event_type.to_string(),
            time,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_row_into_a_typed_record() {
        let (customer, event) =
            parse_record("2343225,PUSH_FLAG,6f14f2dc,2021-03-01T10:20:31.000Z", 1).unwrap();
        assert_eq!(customer, "2343225");
        assert_eq!(event.event_type, "PUSH_FLAG");
        assert_eq!(event.transaction_id, "6f14f2dc");
        assert_eq!(
            event.time,
            "2021-03-01T10:20:31Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn rejects_rows_with_wrong_field_count() {
        let err = parse_record("2343225,PUSH_FLAG,6f14f2dc", 7).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRecord { line: 7, fields: 3 }
        ));
        let err = parse_record("a,b,c,2021-03-01T10:20:31Z,extra", 8).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRecord { line: 8, fields: 5 }
        ));
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let err = parse_record("2343225,PUSH_FLAG,6f14f2dc,yesterday", 3).unwrap_err();
        match err {
            IngestError::MalformedTimestamp { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn loads_a_feed_file_into_a_sorted_index() {
        let path = std::env::temp_dir().join("event-buckets-ingest-ok.csv");
        std::fs::write(
            &path,
            "C1,CLICK,t2,2021-03-01T11:00:00Z\r\n\
             C2,CLICK,t3,2021-03-01T09:00:00Z\n\
             C1,CLICK,t1,2021-03-01T10:00:00Z\n\n",
        )
        .unwrap();

        let store = load(&path).await.unwrap();
        assert_eq!(store.customer_count(), 2);
        let c1 = store.lookup("C1").unwrap();
        assert_eq!(c1.len(), 2);
        assert_eq!(c1[0].transaction_id, "t1");
        assert_eq!(c1[1].transaction_id, "t2");
    }

    #[tokio::test]
    async fn load_surfaces_the_offending_line() {
        let path = std::env::temp_dir().join("event-buckets-ingest-bad.csv");
        std::fs::write(
            &path,
            "C1,CLICK,t1,2021-03-01T10:00:00Z\nC1,CLICK,t2,not-a-time\n",
        )
        .unwrap();

        let err = load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedTimestamp { line: 2, .. }
        ));
    }

    #[tokio::test]
    async fn load_fails_on_missing_file() {
        let err = load("/nonexistent/events.csv").await.unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
