// Converts raw JSON records into uniform tables.
// Column set = ordered union of keys, first-seen order; absent keys become nulls.

use ahash::AHashMap;
use serde_json::Value;
use tracing::{instrument, trace, warn};

use crate::market_data::table::{Cell, Table};

/// How raw keys are renamed before they become column names.
///
/// The exchange is inconsistent about casing across endpoints, so the choice is
/// made once per endpoint here rather than patched up afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    #[default]
    Preserve,
    Lower,
    /// `TimeStamp` -> `time_stamp`, `TxFee` -> `tx_fee`
    Snake,
}

impl KeyCase {
    pub fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Preserve => key.to_string(),
            KeyCase::Lower => key.to_lowercase(),
            KeyCase::Snake => to_snake_case(key),
        }
    }
}

fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                // word boundary: "eS" in TimeStamp, or "LTx" where an acronym ends
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Map a sequence of records into one table, one row per record, input order kept.
#[instrument(level = "trace", skip(records), fields(count = records.len()))]
pub fn map_records(records: &[Value], case: KeyCase) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut sparse: Vec<Vec<(usize, Cell)>> = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            warn!(position, record = %record, "record is not a JSON object, emitting a null row");
            sparse.push(Vec::new());
            continue;
        };

        let mut cells = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let name = case.apply(key);
            let slot = match index.get(&name) {
                Some(&slot) => slot,
                None => {
                    let slot = columns.len();
                    index.insert(name.clone(), slot);
                    columns.push(name);
                    slot
                }
            };
            cells.push((slot, Cell::from(value)));
        }
        sparse.push(cells);
    }

    let width = columns.len();
    let rows: Vec<Vec<Cell>> = sparse
        .into_iter()
        .map(|cells| {
            let mut row = vec![Cell::Null; width];
            // later duplicates (keys equal after renaming) win
            for (slot, cell) in cells {
                row[slot] = cell;
            }
            row
        })
        .collect();

    trace!(rows = rows.len(), columns = width, "mapped records");
    Table::from_parts(columns, rows)
}

pub fn map_single_record(record: &Value, case: KeyCase) -> Table {
    map_records(std::slice::from_ref(record), case)
}

/// Object -> one row, array -> one row per element, null -> empty table.
///
/// Single-object endpoints sometimes answer with a one-element array instead.
pub fn map_result(result: &Value, case: KeyCase) -> Table {
    match result {
        Value::Array(records) => map_records(records, case),
        Value::Null => Table::new(),
        other => map_single_record(other, case),
    }
}
