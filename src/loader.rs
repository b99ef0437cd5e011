//! Bulk persistence into warehouse tables.
//!
//! Rows go in fixed-size batches; each batch is attempted up to the
//! configured number of times and retried verbatim, with no partial-batch
//! narrowing. A batch commits before the next one starts, so exhausting the
//! retry budget aborts the load with earlier batches already committed.

use tracing::{error, info, warn};

use crate::config::LoadConfig;
use crate::emit;
use crate::error::LoadError;
use crate::metrics::{BatchRetried, RowsLoaded};
use crate::store::{Row, WarehouseWriter};

/// Writes row sets into target tables in batches with bounded retry.
pub struct BulkLoader<'a, W: WarehouseWriter> {
    writer: &'a W,
    config: LoadConfig,
}

impl<'a, W: WarehouseWriter> BulkLoader<'a, W> {
    pub fn new(writer: &'a W, config: LoadConfig) -> Self {
        Self { writer, config }
    }

    /// Insert all rows into `table`.
    ///
    /// Returns the number of rows committed (always `rows.len()` on
    /// success).
    pub async fn insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<usize, LoadError> {
        let total = rows.len();
        info!(table = %table, rows = total, "Starting bulk insert");

        let mut inserted = 0usize;
        let mut last_report = 0usize;
        for batch in rows.chunks(self.config.batch_size) {
            self.insert_batch_with_retry(table, columns, batch).await?;
            inserted += batch.len();

            if inserted == total || inserted - last_report >= self.config.progress_interval {
                info!(
                    table = %table,
                    progress = format!("{inserted}/{total}"),
                    "Bulk insert progress"
                );
                last_report = inserted;
            }
        }

        emit!(RowsLoaded {
            table: table.to_string(),
            count: inserted as u64,
        });
        info!(table = %table, rows = inserted, "Bulk insert completed");
        Ok(inserted)
    }

    /// Attempt one batch up to `max_attempts` times, verbatim each time.
    async fn insert_batch_with_retry(
        &self,
        table: &str,
        columns: &[&str],
        batch: &[Row],
    ) -> Result<(), LoadError> {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.writer.insert_batch(table, columns, batch).await {
                Ok(()) => return Ok(()),
                Err(source) if attempt < max_attempts => {
                    warn!(
                        table = %table,
                        attempt,
                        max_attempts,
                        error = %source,
                        "Batch failed, retrying"
                    );
                    emit!(BatchRetried {
                        table: table.to_string(),
                    });
                }
                Err(source) => {
                    error!(
                        table = %table,
                        attempts = max_attempts,
                        error = %source,
                        "Batch failed after exhausting retries"
                    );
                    return Err(LoadError::RetriesExhausted {
                        table: table.to_string(),
                        attempts: max_attempts,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryWarehouse, Value};

    fn rows(count: usize) -> Vec<Row> {
        (0..count).map(|i| vec![Value::Int(i as i64)]).collect()
    }

    fn config(batch_size: usize) -> LoadConfig {
        LoadConfig {
            batch_size,
            max_attempts: 3,
            progress_interval: 50_000,
        }
    }

    #[tokio::test]
    async fn test_inserts_in_batches() {
        let warehouse = MemoryWarehouse::new();
        let loader = BulkLoader::new(&warehouse, config(10));

        let inserted = loader.insert("t", &["v"], &rows(25)).await.unwrap();
        assert_eq!(inserted, 25);
        assert_eq!(warehouse.row_count("t"), 25);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let warehouse = MemoryWarehouse::new();
        // First two attempts fail; the third within the budget succeeds.
        warehouse.fail_next("t", 2);
        let loader = BulkLoader::new(&warehouse, config(100));

        let inserted = loader.insert("t", &["v"], &rows(5)).await.unwrap();
        assert_eq!(inserted, 5);
        assert_eq!(warehouse.row_count("t"), 5);
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_the_load() {
        let warehouse = MemoryWarehouse::new();
        warehouse.fail_next("t", 3);
        let loader = BulkLoader::new(&warehouse, config(100));

        match loader.insert("t", &["v"], &rows(5)).await {
            Err(LoadError::RetriesExhausted {
                table, attempts, ..
            }) => {
                assert_eq!(table, "t");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
        assert_eq!(warehouse.row_count("t"), 0);
    }

    #[tokio::test]
    async fn test_earlier_batches_stay_committed_on_failure() {
        let warehouse = MemoryWarehouse::new();
        let loader = BulkLoader::new(&warehouse, config(10));

        // First batch commits cleanly, then every attempt at the second
        // batch fails.
        let all = rows(20);
        loader.insert("t", &["v"], &all[..10]).await.unwrap();
        warehouse.fail_next("t", 3);
        assert!(loader.insert("t", &["v"], &all[10..]).await.is_err());

        assert_eq!(warehouse.row_count("t"), 10);
    }
}
