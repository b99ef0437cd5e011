//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the pipeline.
//! Events implement the `InternalEvent` trait which emits the corresponding
//! counter metric.

use metrics::counter;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Emit an internal event.
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::InternalEvent::emit($event)
    };
}

/// Event emitted when records are extracted from a source period.
pub struct RecordsExtracted {
    pub period: String,
    pub count: u64,
}

impl InternalEvent for RecordsExtracted {
    fn emit(self) {
        trace!(period = %self.period, count = self.count, "Records extracted");
        counter!("contrail_records_extracted_total", "period" => self.period)
            .increment(self.count);
    }
}

/// Violation class attached to a quarantined record.
#[derive(Debug, Clone, Copy)]
pub enum ViolationClass {
    NullField,
    Duplicate,
}

impl ViolationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationClass::NullField => "null_field",
            ViolationClass::Duplicate => "duplicate",
        }
    }
}

/// Event emitted when records are routed to quarantine.
pub struct RecordsQuarantined {
    pub class: ViolationClass,
    pub count: u64,
}

impl InternalEvent for RecordsQuarantined {
    fn emit(self) {
        trace!(class = self.class.as_str(), count = self.count, "Records quarantined");
        counter!("contrail_records_quarantined_total", "class" => self.class.as_str())
            .increment(self.count);
    }
}

/// Event emitted when cancelled flights are excluded from fact resolution.
pub struct CancelledExcluded {
    pub count: u64,
}

impl InternalEvent for CancelledExcluded {
    fn emit(self) {
        trace!(count = self.count, "Cancelled flights excluded");
        counter!("contrail_cancelled_excluded_total").increment(self.count);
    }
}

/// Event emitted when records are dropped for unresolvable dimension keys.
pub struct FkMissesDropped {
    pub count: u64,
}

impl InternalEvent for FkMissesDropped {
    fn emit(self) {
        trace!(count = self.count, "Records dropped on FK miss");
        counter!("contrail_fk_misses_total").increment(self.count);
    }
}

/// Event emitted when rows are committed to a warehouse table.
pub struct RowsLoaded {
    pub table: String,
    pub count: u64,
}

impl InternalEvent for RowsLoaded {
    fn emit(self) {
        trace!(table = %self.table, count = self.count, "Rows loaded");
        counter!("contrail_rows_loaded_total", "table" => self.table).increment(self.count);
    }
}

/// Event emitted when an insert batch is retried after a failure.
pub struct BatchRetried {
    pub table: String,
}

impl InternalEvent for BatchRetried {
    fn emit(self) {
        trace!(table = %self.table, "Batch retried");
        counter!("contrail_batch_retries_total", "table" => self.table).increment(1);
    }
}
