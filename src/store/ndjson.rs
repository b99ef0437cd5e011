//! NDJSON-file-backed store.
//!
//! The reference backend for running the pipeline without a database:
//! the source directory holds one `<period>.ndjson` file of raw records,
//! and the warehouse directory gets one `<table>.ndjson` file per target
//! table. Each batch is serialized fully before a single append, so a batch
//! either lands whole or not at all.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Map;
use tokio::io::AsyncWriteExt;

use super::{Row, SourceReader, Value, WarehouseWriter};
use crate::error::StoreError;
use crate::record::FlightRecord;

/// Source reader over per-period NDJSON files.
#[derive(Debug, Clone)]
pub struct NdjsonSource {
    dir: PathBuf,
}

impl NdjsonSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SourceReader for NdjsonSource {
    async fn fetch_period(&self, period: &str) -> Result<Vec<FlightRecord>, StoreError> {
        let path = self.dir.join(format!("{period}.ndjson"));
        if !path.exists() {
            return Err(StoreError::UnknownPeriod {
                period: period.to_string(),
            });
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io { source })?;

        let mut records = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: FlightRecord =
                serde_json::from_str(line).map_err(|source| StoreError::ParseRecord {
                    period: period.to_string(),
                    source,
                })?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Warehouse writer appending to per-table NDJSON files.
#[derive(Debug, Clone)]
pub struct NdjsonWarehouse {
    dir: PathBuf,
}

impl NdjsonWarehouse {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.ndjson"))
    }

    /// Serialize one row as a column-name-keyed JSON object.
    fn row_to_line(columns: &[&str], row: &Row) -> Result<String, StoreError> {
        let mut object = Map::new();
        for (column, value) in columns.iter().zip(row.iter()) {
            let json = match value {
                Value::Null => serde_json::Value::Null,
                Value::Int(v) => serde_json::Value::from(*v),
                Value::Float(v) => serde_json::Value::from(*v),
                Value::Text(v) => serde_json::Value::from(v.as_str()),
            };
            object.insert((*column).to_string(), json);
        }
        serde_json::to_string(&serde_json::Value::Object(object))
            .map_err(|source| StoreError::Serialize { source })
    }
}

#[async_trait]
impl WarehouseWriter for NdjsonWarehouse {
    async fn insert_batch(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<(), StoreError> {
        let mut payload = String::new();
        for row in rows {
            payload.push_str(&Self::row_to_line(columns, row)?);
            payload.push('\n');
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io { source })?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.table_path(table))
            .await
            .map_err(|source| StoreError::Io { source })?;
        file.write_all(payload.as_bytes())
            .await
            .map_err(|source| StoreError::Io { source })?;
        file.flush()
            .await
            .map_err(|source| StoreError::Io { source })?;
        Ok(())
    }
}
