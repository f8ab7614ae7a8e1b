//! Envelope dispatch: one GET, then route `result` through the right mapper.
//!
//! A failed envelope (`success == false`) is handed back untouched with its
//! `result` as sent. A successful one has its `result` replaced by a [`Table`],
//! built according to the endpoint's [`ResultShape`], with the named timestamp
//! columns normalized afterwards.

use metrics::counter;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::market_data::adapters::Transport;
use crate::market_data::envelope::{Envelope, Payload, Response};
use crate::market_data::normaliser::{map_result, KeyCase};
use crate::market_data::order_book::{order_book_from_result, OrderBookSide};
use crate::market_data::table::Table;
use crate::market_data::timestamp::normalize_timestamp_column;

/// How an endpoint's `result` becomes a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// An array of records.
    Sequence(KeyCase),
    /// One record; a one-element array is accepted too.
    Single(KeyCase),
    /// `{"buy": [...], "sell": [...]}`, filtered to the requested side.
    OrderBook(OrderBookSide),
}

impl ResultShape {
    pub fn apply(self, result: &Value) -> Table {
        match self {
            ResultShape::Sequence(case) => map_result(result, case),
            ResultShape::Single(case) => {
                if let Value::Array(records) = result {
                    if records.len() > 1 {
                        warn!(records = records.len(), "single-record endpoint returned several records");
                    }
                }
                map_result(result, case)
            }
            ResultShape::OrderBook(side) => order_book_from_result(result, side),
        }
    }
}

pub struct Dispatcher<T> {
    base_url: String,
    ping_path: String,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ping_path: config.ping_path.clone(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint_url(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<String> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let url = if query.is_empty() {
            reqwest::Url::parse(&raw)
        } else {
            reqwest::Url::parse_with_params(&raw, query)
        };
        url.map(|u| u.to_string()).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// One GET against `path`, mapped per `shape` on success.
    ///
    /// Transport failures and bodies that are not an envelope propagate as errors;
    /// `success == false` is not an error and comes back as [`Payload::Raw`].
    #[instrument(skip(self, query, timestamp_columns))]
    pub async fn call_endpoint(
        &self,
        path: &str,
        query: &[(&str, &str)],
        shape: ResultShape,
        timestamp_columns: &[&str],
    ) -> ClientResult<Response> {
        let url = self.endpoint_url(path, query)?;
        counter!("bittrex_requests_total", "endpoint" => path.to_string()).increment(1);
        debug!(url = %url, "GET");

        let reply = self.transport.get(&url).await?;
        if !reply.is_success() {
            debug!(status = reply.status, "non-success status, reading envelope anyway");
        }

        let envelope: Envelope<Value> = serde_json::from_str(&reply.body)?;
        if !envelope.success {
            counter!("bittrex_api_failures_total", "endpoint" => path.to_string()).increment(1);
            info!(message = %envelope.message, "exchange reported failure");
            return Ok(envelope.map(Payload::Raw));
        }

        let mut table = shape.apply(&envelope.result);
        for column in timestamp_columns {
            normalize_timestamp_column(&mut table, column)?;
        }
        debug!(rows = table.len(), columns = table.columns().len(), "mapped result");

        Ok(Envelope { success: true, message: envelope.message, result: Payload::Table(table) })
    }

    /// Best-effort connectivity check: `true` only on a 2xx status.
    ///
    /// The body is never parsed. Failures are logged and reported as `false`.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> bool {
        let url = match self.endpoint_url(&self.ping_path, &[]) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build connectivity check url");
                return false;
            }
        };

        match self.transport.get(&url).await {
            Ok(reply) if reply.is_success() => {
                debug!(status = reply.status, "exchange reachable");
                true
            }
            Ok(reply) => {
                counter!("bittrex_ping_failures_total").increment(1);
                warn!(status = reply.status, url = %url, "connectivity check returned non-success status");
                false
            }
            Err(e) => {
                counter!("bittrex_ping_failures_total").increment(1);
                warn!(error = %e, url = %url, "connectivity check failed");
                false
            }
        }
    }
}
