//! Store abstractions: the wire row types and the reader/writer seams.
//!
//! The physical database engine is an external collaborator; the pipeline
//! only depends on these two traits. The crate ships an NDJSON-file-backed
//! implementation for runnable end-to-end use and an in-memory one for
//! tests.

mod memory;
mod ndjson;

pub use memory::{MemorySource, MemoryWarehouse};
pub use ndjson::{NdjsonSource, NdjsonWarehouse};

use async_trait::async_trait;
use serde::ser::{Serialize, Serializer};

use crate::error::StoreError;
use crate::record::FlightRecord;

/// A single cell in a warehouse row.
///
/// Non-finite floats collapse to `Null` on construction: invalid numeric
/// values must never reach persisted storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Build a float cell, coercing NaN and infinities to `Null`.
    pub fn float(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Value::Float(v),
            _ => Value::Null,
        }
    }

    /// Build an integer cell.
    pub fn int<T: Into<i64>>(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Int(v.into()),
            None => Value::Null,
        }
    }

    /// Build a text cell.
    pub fn text<T: Into<String>>(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Text(v.into()),
            None => Value::Null,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
        }
    }
}

/// One warehouse row, positionally aligned with a table's column list.
pub type Row = Vec<Value>;

/// Reader over the normalized per-period source tables.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Fetch every record for one period.
    async fn fetch_period(&self, period: &str) -> Result<Vec<FlightRecord>, StoreError>;
}

/// Writer into the warehouse target tables.
///
/// Each `insert_batch` call is atomic: either the whole batch commits or
/// the store surfaces an error and commits nothing.
#[async_trait]
pub trait WarehouseWriter: Send + Sync {
    /// Atomically insert one batch of rows into a table.
    async fn insert_batch(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_coerces_non_finite_to_null() {
        assert_eq!(Value::float(Some(12.5)), Value::Float(12.5));
        assert_eq!(Value::float(Some(f64::NAN)), Value::Null);
        assert_eq!(Value::float(Some(f64::INFINITY)), Value::Null);
        assert_eq!(Value::float(Some(f64::NEG_INFINITY)), Value::Null);
        assert_eq!(Value::float(None), Value::Null);
    }

    #[test]
    fn test_value_serialization() {
        let row: Row = vec![
            Value::Null,
            Value::Int(42),
            Value::Float(1.5),
            Value::Text("ATL".to_string()),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,42,1.5,"ATL"]"#);
    }
}
