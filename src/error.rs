use thiserror::Error;

/// A timestamp cell the exchange sent in a shape we cannot read.
///
/// Kept separate from [`ClientError::Json`] so callers can tell "the exchange
/// returned malformed data" apart from "the body was not an envelope at all".
#[derive(Debug, Error)]
#[error("malformed timestamp {value:?} in column `{column}`")]
pub struct ParseError {
    column: String,
    value: String,
    #[source]
    source: Option<chrono::ParseError>,
}

impl ParseError {
    pub fn new(column: impl Into<String>, value: impl Into<String>, source: Option<chrono::ParseError>) -> Self {
        Self { column: column.into(), value: value.into(), source }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timeout, TLS failure... passed through from reqwest untouched.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    /// Body was not a JSON envelope.
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Timestamp(#[from] ParseError),
}

pub type ClientResult<T> = Result<T, ClientError>;
