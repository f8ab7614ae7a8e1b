// Exchange timestamps look like "2014-07-09T11:29:56.2Z": ISO-8601, variable
// fractional precision (possibly none), always UTC. Some endpoints drop the Z.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::trace;

use crate::error::ParseError;
use crate::market_data::table::{Cell, Table};

pub const TIME_STAMP_COLUMN: &str = "time_stamp";
pub const CREATED_COLUMN: &str = "created";

// %.f reads nothing when there is no fractional part
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let trimmed = raw.trim();
    let naive_part = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);
    let naive = NaiveDateTime::parse_from_str(naive_part, TIMESTAMP_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Replace the text cells of `column` with parsed instants, in place.
///
/// Nulls stay null. A table without the column (nothing was mapped) is left alone.
/// Any other cell, or text that does not parse, is an error naming the value.
pub fn normalize_timestamp_column(table: &mut Table, column: &str) -> Result<(), ParseError> {
    let Some(cells) = table.column_mut(column) else {
        trace!(column, "no such column, nothing to normalize");
        return Ok(());
    };

    for cell in cells {
        let parsed = match cell {
            Cell::Null | Cell::Timestamp(_) => continue,
            Cell::Text(raw) => parse_timestamp(raw).map_err(|e| ParseError::new(column, raw.as_str(), Some(e)))?,
            other => return Err(ParseError::new(column, other.to_string(), None)),
        };
        *cell = Cell::Timestamp(parsed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::normaliser::{map_records, KeyCase};
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_with_and_without_fraction() {
        let with = parse_timestamp("2014-07-09T11:29:56.2Z").unwrap();
        let without = parse_timestamp("2014-07-09T11:29:56Z").unwrap();

        assert_eq!(with.timestamp(), without.timestamp());
        assert_eq!(with.timestamp_subsec_millis(), 200);
        assert_eq!(without.timestamp_subsec_millis(), 0);
        assert_eq!((with.year(), with.month(), with.day()), (2014, 7, 9));
        assert_eq!((with.hour(), with.minute(), with.second()), (11, 29, 56));
    }

    #[test]
    fn test_long_and_zero_fractions() {
        let a = parse_timestamp("2017-12-01T03:04:05.1234567Z").unwrap();
        let b = parse_timestamp("2017-12-01T03:04:05.000Z").unwrap();
        assert_eq!(a.timestamp(), b.timestamp());
        assert_eq!(a.timestamp_subsec_micros(), 123_456);
        assert_eq!(b.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_missing_designator_is_still_utc() {
        let a = parse_timestamp("2014-07-09T07:19:30.15").unwrap();
        let b = parse_timestamp("2014-07-09T07:19:30.15Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2014-07-09").is_err());
        assert!(parse_timestamp("09/07/2014 11:29:56").is_err());
        assert!(parse_timestamp("2014-07-09T11:29:56+02:00").is_err());
    }

    #[test]
    fn test_normalize_column_in_place() {
        let records = vec![
            json!({"MarketName": "BTC-LTC", "TimeStamp": "2014-07-09T11:29:56.2Z"}),
            json!({"MarketName": "BTC-ETH", "TimeStamp": null}),
        ];
        let mut table = map_records(&records, KeyCase::Snake);
        normalize_timestamp_column(&mut table, TIME_STAMP_COLUMN).unwrap();

        let first = table.get(0, TIME_STAMP_COLUMN).and_then(Cell::as_timestamp).unwrap();
        assert_eq!(first.timestamp(), 1_404_905_396);
        assert_eq!(table.get(1, TIME_STAMP_COLUMN), Some(&Cell::Null));
        assert_eq!(table.get(0, "market_name"), Some(&Cell::from("BTC-LTC")));
    }

    #[test]
    fn test_normalize_twice_is_harmless() {
        let mut table = map_records(&[json!({"Created": "2015-01-01T00:00:00"})], KeyCase::Snake);
        normalize_timestamp_column(&mut table, CREATED_COLUMN).unwrap();
        let once = table.clone();
        normalize_timestamp_column(&mut table, CREATED_COLUMN).unwrap();
        assert_eq!(table, once);
    }

    #[test]
    fn test_missing_column_is_a_no_op() {
        let mut table = map_records(&[], KeyCase::Snake);
        assert!(normalize_timestamp_column(&mut table, CREATED_COLUMN).is_ok());
    }

    #[test]
    fn test_bad_value_names_value_and_column() {
        let mut table = map_records(&[json!({"Created": "last tuesday"})], KeyCase::Snake);
        let err = normalize_timestamp_column(&mut table, CREATED_COLUMN).unwrap_err();
        assert_eq!(err.column(), "created");
        assert_eq!(err.value(), "last tuesday");

        let mut numeric = map_records(&[json!({"Created": 1404905396})], KeyCase::Snake);
        let err = normalize_timestamp_column(&mut numeric, CREATED_COLUMN).unwrap_err();
        assert_eq!(err.value(), "1404905396");
    }
}
