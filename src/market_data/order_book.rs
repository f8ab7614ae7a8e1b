//! Merges the exchange's split buy/sell order book lists into one tagged table.
//!
//! The payload keeps bids and asks in separate lists and drops a list entirely
//! when that side of the book is empty. Each leg is mapped on its own, tagged
//! with a constant `type` column, and an absent or empty leg is replaced by
//! [`empty_leg`] so concatenation always sees the same `quantity, rate, type`
//! schema.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::market_data::normaliser::{map_records, KeyCase};
use crate::market_data::table::{Cell, Row, Table};

pub const TYPE_COLUMN: &str = "type";

/// Schema of a leg that had nothing to map.
pub const FALLBACK_COLUMNS: [&str; 3] = ["quantity", "rate", TYPE_COLUMN];

/// Which legs of the book a query asks for. Doubles as the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBookSide {
    Buy,
    Sell,
    #[default]
    Both,
}

impl OrderBookSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderBookSide::Buy => "buy",
            OrderBookSide::Sell => "sell",
            OrderBookSide::Both => "both",
        }
    }
}

impl fmt::Display for OrderBookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order book side `{0}`, expected buy, sell or both")]
pub struct UnknownSide(pub String);

impl FromStr for OrderBookSide {
    type Err = UnknownSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderBookSide::Buy),
            "sell" => Ok(OrderBookSide::Sell),
            "both" => Ok(OrderBookSide::Both),
            _ => Err(UnknownSide(s.to_string())),
        }
    }
}

/// The leg a row came from; written to the `type` column as `BUY` / `SELL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookSide {
    Buy,
    Sell,
}

impl BookSide {
    pub fn tag(self) -> &'static str {
        match self {
            BookSide::Buy => "BUY",
            BookSide::Sell => "SELL",
        }
    }

    fn key(self) -> &'static str {
        match self {
            BookSide::Buy => "buy",
            BookSide::Sell => "sell",
        }
    }
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub fn empty_leg() -> Table {
    Table::with_columns(FALLBACK_COLUMNS)
}

fn map_leg(records: Option<&[Value]>, leg: BookSide) -> Table {
    match records {
        Some(records) if !records.is_empty() => {
            let mut table = map_records(records, KeyCase::Lower);
            table.push_constant_column(TYPE_COLUMN, Cell::from(leg.tag()));
            table
        }
        _ => {
            debug!(leg = %leg, "order book leg absent or empty, using fallback schema");
            empty_leg()
        }
    }
}

/// Merge the two legs according to `side`.
///
/// For [`OrderBookSide::Both`] the sell rows come first, then the buy rows. Rows
/// are not re-sorted by rate.
pub fn merge_order_book(buy: Option<&[Value]>, sell: Option<&[Value]>, side: OrderBookSide) -> Table {
    match side {
        OrderBookSide::Buy => map_leg(buy, BookSide::Buy),
        OrderBookSide::Sell => map_leg(sell, BookSide::Sell),
        OrderBookSide::Both => map_leg(sell, BookSide::Sell).concat(map_leg(buy, BookSide::Buy)),
    }
}

fn leg_records<'a>(book: &'a Map<String, Value>, leg: BookSide) -> Option<Cow<'a, [Value]>> {
    let (_, value) = book.iter().find(|(key, _)| key.eq_ignore_ascii_case(leg.key()))?;
    match value {
        Value::Array(records) => Some(Cow::Borrowed(records.as_slice())),
        // a leg holding a single level instead of a list
        Value::Object(_) => Some(Cow::Owned(vec![value.clone()])),
        _ => None,
    }
}

/// Build the order book table from an envelope's `result`.
///
/// Accepts `{"buy": [...], "sell": [...]}` with either key missing, and the bare
/// array the exchange sends back for one-sided queries.
pub fn order_book_from_result(result: &Value, side: OrderBookSide) -> Table {
    match result {
        Value::Object(book) => {
            let buy = leg_records(book, BookSide::Buy);
            let sell = leg_records(book, BookSide::Sell);
            // a leg key holding null still marks this as a book, not a level
            let has_leg_key = book
                .keys()
                .any(|key| key.eq_ignore_ascii_case(BookSide::Buy.key()) || key.eq_ignore_ascii_case(BookSide::Sell.key()));
            if !has_leg_key && !book.is_empty() && side != OrderBookSide::Both {
                // one-sided answer collapsed to a single level
                let single = std::slice::from_ref(result);
                return match side {
                    OrderBookSide::Buy => merge_order_book(Some(single), None, side),
                    _ => merge_order_book(None, Some(single), side),
                };
            }
            merge_order_book(buy.as_deref(), sell.as_deref(), side)
        }
        Value::Array(records) => match side {
            OrderBookSide::Buy => merge_order_book(Some(records.as_slice()), None, side),
            OrderBookSide::Sell => merge_order_book(None, Some(records.as_slice()), side),
            OrderBookSide::Both => {
                warn!(levels = records.len(), "untagged order book list for a two-sided query, dropping it");
                merge_order_book(None, None, side)
            }
        },
        _ => merge_order_book(None, None, side),
    }
}

/// Typed view of one merged order book row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderBookRow {
    pub quantity: f64,
    pub rate: f64,
    #[serde(rename = "type")]
    pub side: BookSide,
}

impl OrderBookRow {
    pub fn from_row(row: &Row<'_>) -> Option<Self> {
        let quantity = row.get("quantity")?.as_f64()?;
        let rate = row.get("rate")?.as_f64()?;
        let side = match row.get(TYPE_COLUMN)?.as_str()? {
            "BUY" => BookSide::Buy,
            "SELL" => BookSide::Sell,
            _ => return None,
        };
        Some(Self { quantity, rate, side })
    }
}

/// Rows that carry a numeric quantity, rate and a known tag; others are skipped.
pub fn order_book_rows(table: &Table) -> Vec<OrderBookRow> {
    table.rows().filter_map(|row| OrderBookRow::from_row(&row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn levels(n: usize, offset: f64) -> Vec<Value> {
        (0..n).map(|i| json!({"Quantity": i as f64 + 1.0, "Rate": offset + i as f64})).collect()
    }

    #[test]
    fn test_both_with_empty_sell_keeps_buy_rows() {
        let buy = vec![json!({"Quantity": 1, "Rate": 10})];
        let table = merge_order_book(Some(buy.as_slice()), Some(&[][..]), OrderBookSide::Both);

        assert_eq!(table.columns(), ["quantity", "rate", "type"]);
        assert_eq!(
            order_book_rows(&table),
            vec![OrderBookRow { quantity: 1.0, rate: 10.0, side: BookSide::Buy }]
        );
    }

    #[test]
    fn test_absent_buy_leg_yields_fallback_schema() {
        let sell = levels(3, 20.0);
        let table = merge_order_book(None, Some(sell.as_slice()), OrderBookSide::Buy);
        assert!(table.is_empty());
        assert_eq!(table.columns(), FALLBACK_COLUMNS);
    }

    #[test]
    fn test_both_puts_sell_rows_first() {
        let buy = levels(2, 10.0);
        let sell = levels(3, 20.0);
        let rows = order_book_rows(&merge_order_book(Some(buy.as_slice()), Some(sell.as_slice()), OrderBookSide::Both));

        let tags: Vec<BookSide> = rows.iter().map(|r| r.side).collect();
        assert_eq!(tags, [BookSide::Sell, BookSide::Sell, BookSide::Sell, BookSide::Buy, BookSide::Buy]);
        // no re-sorting: payload order within each leg survives
        assert_eq!(rows[0].rate, 20.0);
        assert_eq!(rows[3].rate, 10.0);
    }

    #[test]
    fn test_single_leg_queries_ignore_the_other_leg() {
        let buy = levels(2, 10.0);
        let sell = levels(1, 20.0);
        assert_eq!(merge_order_book(Some(buy.as_slice()), Some(sell.as_slice()), OrderBookSide::Sell).len(), 1);
        assert_eq!(merge_order_book(Some(buy.as_slice()), Some(sell.as_slice()), OrderBookSide::Buy).len(), 2);
    }

    #[test]
    fn test_mixed_case_keys_are_lowercased() {
        let buy = vec![json!({"quantity": 1.5, "RATE": "0.01"})];
        let table = merge_order_book(Some(buy.as_slice()), None, OrderBookSide::Both);
        assert_eq!(table.columns(), ["quantity", "rate", "type"]);
        let rows = order_book_rows(&table);
        assert_eq!(rows[0].rate, 0.01);
    }

    #[test]
    fn test_from_result_object_with_missing_key() {
        let result = json!({"sell": [{"Quantity": 2, "Rate": 3}]});
        let table = order_book_from_result(&result, OrderBookSide::Both);
        assert_eq!(order_book_rows(&table), vec![OrderBookRow { quantity: 2.0, rate: 3.0, side: BookSide::Sell }]);
    }

    #[test]
    fn test_from_result_bare_array_is_the_requested_leg() {
        let result = json!([{"Quantity": 4, "Rate": 5}]);
        let rows = order_book_rows(&order_book_from_result(&result, OrderBookSide::Sell));
        assert_eq!(rows, vec![OrderBookRow { quantity: 4.0, rate: 5.0, side: BookSide::Sell }]);

        let both = order_book_from_result(&result, OrderBookSide::Both);
        assert!(both.is_empty());
        assert_eq!(both.columns(), FALLBACK_COLUMNS);
    }

    #[test]
    fn test_from_result_single_level_object() {
        let result = json!({"Quantity": 1, "Rate": 2});
        let rows = order_book_from_result(&result, OrderBookSide::Buy);
        assert_eq!(order_book_rows(&rows), vec![OrderBookRow { quantity: 1.0, rate: 2.0, side: BookSide::Buy }]);
    }

    #[test]
    fn test_from_result_null() {
        let table = order_book_from_result(&Value::Null, OrderBookSide::Both);
        assert!(table.is_empty());
        assert_eq!(table.columns(), FALLBACK_COLUMNS);
    }

    #[test]
    fn test_from_result_null_legs_use_fallback_schema() {
        for side in [OrderBookSide::Buy, OrderBookSide::Sell, OrderBookSide::Both] {
            for result in [json!({"buy": null}), json!({"buy": null, "sell": null}), json!({"Sell": null})] {
                let table = order_book_from_result(&result, side);
                assert!(table.is_empty(), "{result} {side}");
                assert_eq!(table.columns(), FALLBACK_COLUMNS, "{result} {side}");
            }
        }
    }

    #[test]
    fn test_from_result_null_leg_beside_populated_leg() {
        let result = json!({"buy": [{"Quantity": 3, "Rate": 0.5}], "sell": null});
        let table = order_book_from_result(&result, OrderBookSide::Both);
        assert_eq!(table.columns(), FALLBACK_COLUMNS);
        assert_eq!(order_book_rows(&table), vec![OrderBookRow { quantity: 3.0, rate: 0.5, side: BookSide::Buy }]);
    }

    #[test]
    fn test_from_result_leg_keys_match_case_insensitively() {
        let result = json!({
            "Buy": [{"Quantity": 1, "Rate": 10}],
            "SELL": [{"Quantity": 2, "Rate": 11}]
        });
        let table = order_book_from_result(&result, OrderBookSide::Both);
        assert_eq!(
            order_book_rows(&table),
            vec![
                OrderBookRow { quantity: 2.0, rate: 11.0, side: BookSide::Sell },
                OrderBookRow { quantity: 1.0, rate: 10.0, side: BookSide::Buy },
            ]
        );

        let buy_only = order_book_from_result(&result, OrderBookSide::Buy);
        assert_eq!(order_book_rows(&buy_only), vec![OrderBookRow { quantity: 1.0, rate: 10.0, side: BookSide::Buy }]);
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("BOTH".parse::<OrderBookSide>(), Ok(OrderBookSide::Both));
        assert_eq!("sell".parse::<OrderBookSide>(), Ok(OrderBookSide::Sell));
        assert_eq!("bids".parse::<OrderBookSide>(), Err(UnknownSide("bids".into())));
        assert_eq!(OrderBookSide::Buy.to_string(), "buy");
    }

    proptest! {
        #[test]
        fn prop_both_is_sell_then_buy(n_buy in 0usize..15, n_sell in 0usize..15) {
            let buy = levels(n_buy, 100.0);
            let sell = levels(n_sell, 200.0);
            let table = merge_order_book(Some(buy.as_slice()), Some(sell.as_slice()), OrderBookSide::Both);

            prop_assert_eq!(table.len(), n_buy + n_sell);
            prop_assert_eq!(table.columns(), FALLBACK_COLUMNS);
            for (i, row) in order_book_rows(&table).iter().enumerate() {
                let expected = if i < n_sell { BookSide::Sell } else { BookSide::Buy };
                prop_assert_eq!(row.side, expected);
            }
        }
    }
}
