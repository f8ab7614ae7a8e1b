// Every API call answers {"success": bool, "message": string, "result": ...}.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::market_data::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T> {
    pub success: bool,
    /// Non-empty only when `success` is false; the exchange's own error text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub result: T,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> Envelope<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope { success: self.success, message: self.message, result: f(self.result) }
    }
}

/// What a dispatched call hands back in `result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Failed call: the result exactly as the exchange sent it.
    Raw(Value),
    Table(Table),
}

impl Payload {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Payload::Table(table) => Some(table),
            Payload::Raw(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Payload::Table(table) => Some(table),
            Payload::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Payload::Raw(value) => Some(value),
            Payload::Table(_) => None,
        }
    }
}

pub type Response = Envelope<Payload>;

impl Response {
    pub fn table(&self) -> Option<&Table> {
        self.result.as_table()
    }
}
