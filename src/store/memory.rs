//! In-memory store backends.
//!
//! `MemorySource` serves fixture batches; `MemoryWarehouse` collects rows
//! per table and can be told to fail the next N inserts into a table, which
//! is how the bulk-loader retry path is exercised.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Row, SourceReader, WarehouseWriter};
use crate::error::StoreError;
use crate::record::FlightRecord;

/// Source backend serving records from memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    periods: HashMap<String, Vec<FlightRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a period batch.
    pub fn with_period(mut self, period: &str, records: Vec<FlightRecord>) -> Self {
        self.periods.insert(period.to_string(), records);
        self
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn fetch_period(&self, period: &str) -> Result<Vec<FlightRecord>, StoreError> {
        self.periods
            .get(period)
            .cloned()
            .ok_or_else(|| StoreError::UnknownPeriod {
                period: period.to_string(),
            })
    }
}

/// Warehouse backend collecting rows in memory.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    // table -> number of upcoming insert attempts to reject
    failures: Mutex<HashMap<String, u32>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` insert attempts into `table`.
    pub fn fail_next(&self, table: &str, count: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(table.to_string(), count);
    }

    /// Number of rows committed to a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Snapshot of a table's committed rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl WarehouseWriter for MemoryWarehouse {
    async fn insert_batch(
        &self,
        table: &str,
        _columns: &[&str],
        rows: &[Row],
    ) -> Result<(), StoreError> {
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(table) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Rejected {
                        table: table.to_string(),
                        message: "injected failure".to_string(),
                    });
                }
            }
        }

        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[tokio::test]
    async fn test_memory_source_unknown_period() {
        let source = MemorySource::new().with_period("Q1", vec![FlightRecord::default()]);
        assert_eq!(source.fetch_period("Q1").await.unwrap().len(), 1);
        assert!(matches!(
            source.fetch_period("Q9").await,
            Err(StoreError::UnknownPeriod { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_warehouse_failure_injection() {
        let warehouse = MemoryWarehouse::new();
        warehouse.fail_next("Fact_Delays", 2);

        let row: Row = vec![Value::Int(1)];

        assert!(warehouse
            .insert_batch("Fact_Delays", &["x"], &[row.clone()])
            .await
            .is_err());
        assert!(warehouse
            .insert_batch("Fact_Delays", &["x"], &[row.clone()])
            .await
            .is_err());
        // Third attempt goes through
        warehouse
            .insert_batch("Fact_Delays", &["x"], &[row])
            .await
            .unwrap();
        assert_eq!(warehouse.row_count("Fact_Delays"), 1);
    }
}
