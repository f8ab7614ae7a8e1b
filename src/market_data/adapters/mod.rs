// Transport boundary + venue-specific endpoint functions

use async_trait::async_trait;

use crate::error::ClientResult;

/// Status line and raw body of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the actual GET. Timeouts, pooling and TLS live behind this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> ClientResult<HttpReply>;
}

pub mod bittrex;
pub mod http;
