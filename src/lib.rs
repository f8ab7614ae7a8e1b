//! Client for the Bittrex public market-data REST API.
//!
//! Each call issues one GET and returns the exchange's `{success, message, result}`
//! envelope with `result` flattened into a [`Table`]: one row per record, columns
//! the ordered union of the record keys, absent fields as [`Cell::Null`].
//! Failed calls come back with the raw `result` untouched.

pub mod config;
pub mod error;
pub mod market_data;
pub mod telemetry;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ParseError};
pub use market_data::adapters::bittrex::BittrexClient;
pub use market_data::adapters::http::HttpTransport;
pub use market_data::adapters::{HttpReply, Transport};
pub use market_data::envelope::{Envelope, Payload, Response};
pub use market_data::normaliser::{map_records, map_result, map_single_record, KeyCase};
pub use market_data::order_book::{merge_order_book, order_book_rows, BookSide, OrderBookRow, OrderBookSide};
pub use market_data::router::{Dispatcher, ResultShape};
pub use market_data::table::{Cell, Row, Table};
pub use market_data::timestamp::{normalize_timestamp_column, parse_timestamp};
