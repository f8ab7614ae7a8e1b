// Bittrex public v1.1 endpoints. Each one only picks a path, query and shape;
// the dispatcher does the rest.

use tracing::instrument;

use super::http::HttpTransport;
use super::Transport;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::market_data::envelope::Response;
use crate::market_data::normaliser::KeyCase;
use crate::market_data::order_book::OrderBookSide;
use crate::market_data::router::{Dispatcher, ResultShape};
use crate::market_data::timestamp::{CREATED_COLUMN, TIME_STAMP_COLUMN};

pub mod endpoints {
    pub const MARKETS: &str = "getmarkets";
    pub const CURRENCIES: &str = "getcurrencies";
    pub const TICKER: &str = "getticker";
    pub const MARKET_SUMMARIES: &str = "getmarketsummaries";
    pub const MARKET_SUMMARY: &str = "getmarketsummary";
    pub const ORDER_BOOK: &str = "getorderbook";
    pub const MARKET_HISTORY: &str = "getmarkethistory";
}

/// Keys on these endpoints are PascalCase; columns come out snake_case.
const COLUMNS: KeyCase = KeyCase::Snake;

pub struct BittrexClient<T = HttpTransport> {
    dispatcher: Dispatcher<T>,
}

impl BittrexClient<HttpTransport> {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::with_transport(config, HttpTransport::new(config)?))
    }
}

impl<T: Transport> BittrexClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        Self { dispatcher: Dispatcher::new(config, transport) }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// All markets with their listing metadata; `created` stays as sent.
    #[instrument(skip(self))]
    pub async fn get_markets(&self) -> ClientResult<Response> {
        self.dispatcher.call_endpoint(endpoints::MARKETS, &[], ResultShape::Sequence(COLUMNS), &[]).await
    }

    #[instrument(skip(self))]
    pub async fn get_currencies(&self) -> ClientResult<Response> {
        self.dispatcher.call_endpoint(endpoints::CURRENCIES, &[], ResultShape::Sequence(COLUMNS), &[]).await
    }

    /// Bid / ask / last for one market, as a one-row table.
    #[instrument(skip(self))]
    pub async fn get_ticker(&self, market: &str) -> ClientResult<Response> {
        self.dispatcher
            .call_endpoint(endpoints::TICKER, &[("market", market)], ResultShape::Single(COLUMNS), &[])
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_market_summaries(&self) -> ClientResult<Response> {
        self.dispatcher
            .call_endpoint(
                endpoints::MARKET_SUMMARIES,
                &[],
                ResultShape::Sequence(COLUMNS),
                &[TIME_STAMP_COLUMN, CREATED_COLUMN],
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_market_summary(&self, market: &str) -> ClientResult<Response> {
        self.dispatcher
            .call_endpoint(
                endpoints::MARKET_SUMMARY,
                &[("market", market)],
                ResultShape::Single(COLUMNS),
                &[TIME_STAMP_COLUMN, CREATED_COLUMN],
            )
            .await
    }

    /// Order book for `market`, sell rows before buy rows when `side` is both.
    #[instrument(skip(self))]
    pub async fn get_order_book(&self, market: &str, side: OrderBookSide) -> ClientResult<Response> {
        self.dispatcher
            .call_endpoint(
                endpoints::ORDER_BOOK,
                &[("market", market), ("type", side.as_str())],
                ResultShape::OrderBook(side),
                &[],
            )
            .await
    }

    /// Latest trades for `market`.
    #[instrument(skip(self))]
    pub async fn get_market_history(&self, market: &str) -> ClientResult<Response> {
        self.dispatcher
            .call_endpoint(
                endpoints::MARKET_HISTORY,
                &[("market", market)],
                ResultShape::Sequence(COLUMNS),
                &[TIME_STAMP_COLUMN],
            )
            .await
    }

    pub async fn ping(&self) -> bool {
        self.dispatcher.ping().await
    }
}
