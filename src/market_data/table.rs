//! Uniform tables: rectangular, null-padded rows with a fixed column order.
//!
//! Every row holds exactly one [`Cell`] per column. A field that was absent from
//! the raw record is [`Cell::Null`], never a missing slot.

use std::fmt;
use std::io;

use ahash::AHashMap;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Nested JSON carried through as-is; the mapper does not flatten it.
    Opaque(Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numbers arrive either as JSON numbers or as numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Booleans arrive either as JSON booleans or as 0/1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Number(n) if *n == 0.0 => Some(false),
            Cell::Number(n) if *n == 1.0 => Some(true),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_else(|| Cell::Opaque(value.clone())),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Cell::Opaque(value.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Cell::Opaque(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Cell::Opaque(v) => v.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// No columns, no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero rows with an explicit schema, for callers that need stable columns
    /// even when there is nothing to map.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()), "ragged table");
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<impl Iterator<Item = &mut Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter_mut().map(move |row| &mut row[idx]))
    }

    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        self.rows.get(idx).map(|cells| Row { columns: &self.columns, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(|cells| Row { columns: &self.columns, cells })
    }

    /// Set `name` to `cell` on every row, appending the column if it is new.
    pub fn push_constant_column(&mut self, name: impl Into<String>, cell: Cell) {
        let name = name.into();
        match self.column_index(&name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = cell.clone();
                }
            }
            None => {
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(cell.clone());
                }
            }
        }
    }

    /// Rows of `self` followed by rows of `other`.
    ///
    /// Columns are the ordered union (ours first); cells a side did not have are null.
    pub fn concat(mut self, other: Table) -> Table {
        let mut index: AHashMap<String, usize> =
            self.columns.iter().enumerate().map(|(i, c)| (c.clone(), i)).collect();

        let mut targets = Vec::with_capacity(other.columns.len());
        for column in other.columns {
            let slot = match index.get(&column) {
                Some(&slot) => slot,
                None => {
                    let slot = self.columns.len();
                    index.insert(column.clone(), slot);
                    self.columns.push(column);
                    slot
                }
            };
            targets.push(slot);
        }

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Null);
        }
        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut cells = vec![Cell::Null; width];
            for (cell, &slot) in row.into_iter().zip(&targets) {
                cells[slot] = cell;
            }
            self.rows.push(cells);
        }
        self
    }

    /// Header plus one record per row. Nulls are empty fields, timestamps RFC 3339.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.cells.get(idx)
    }

    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        self.columns.iter().map(String::as_str).zip(self.cells.iter())
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, cell) in self.iter() {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
