//! Record-level quality gate.
//!
//! Applies validation then batch-local dedup to one period's records,
//! partitions the batch into clean and quarantine sets, and enforces the
//! minimum-clean-percentage policy. A breach is fatal for the run: loading a
//! majority-corrupt period would silently skew every downstream aggregate.

pub mod dedup;
pub mod types;
pub mod validate;

use chrono::Utc;
use tracing::{error, info};

use crate::emit;
use crate::error::QualityError;
use crate::metrics::{RecordsQuarantined, ViolationClass};
use crate::record::FlightRecord;

use dedup::mark_duplicates;
use types::{QualityStats, QuarantineRecord, ValidatedRecord};
use validate::validate_record;

/// Result of gating one period's batch.
#[derive(Debug)]
pub struct GateOutcome {
    pub clean: Vec<FlightRecord>,
    pub quarantine: Vec<QuarantineRecord>,
    pub stats: QualityStats,
}

/// The quality gate for per-period batches.
#[derive(Debug, Clone)]
pub struct QualityGate {
    min_clean_percent: f64,
}

impl QualityGate {
    pub fn new(min_clean_percent: f64) -> Self {
        Self { min_clean_percent }
    }

    /// Gate one period's batch.
    ///
    /// The batch must be non-empty; an empty batch is a precondition
    /// violation upstream and is rejected here rather than reported as a
    /// 0% clean ratio.
    pub fn apply(
        &self,
        period: &str,
        records: Vec<FlightRecord>,
    ) -> Result<GateOutcome, QualityError> {
        if records.is_empty() {
            return Err(QualityError::EmptyBatch {
                period: period.to_string(),
            });
        }

        let total = records.len();
        info!(period = %period, records = total, "Applying quality checks");

        let mut batch: Vec<ValidatedRecord> = records
            .into_iter()
            .map(|record| {
                let outcome = validate_record(&record);
                ValidatedRecord { record, outcome }
            })
            .collect();

        let null_violations = batch.iter().filter(|v| !v.outcome.is_valid).count();
        let duplicate_violations = mark_duplicates(&mut batch);

        let now = Utc::now();
        let mut clean = Vec::new();
        let mut quarantine = Vec::new();
        for validated in batch {
            if validated.outcome.is_valid {
                clean.push(validated.record);
            } else {
                quarantine.push(QuarantineRecord::from_rejected(period, &validated, now));
            }
        }

        let clean_pct = clean.len() as f64 * 100.0 / total as f64;
        info!(
            period = %period,
            clean = clean.len(),
            quarantined = quarantine.len(),
            clean_pct = format!("{clean_pct:.2}"),
            "Quality check results"
        );

        let duplicates_quarantined = quarantine
            .iter()
            .filter(|q| q.rejection_reason == dedup::REASON_DUPLICATE)
            .count();
        emit!(RecordsQuarantined {
            class: ViolationClass::NullField,
            count: (quarantine.len() - duplicates_quarantined) as u64,
        });
        emit!(RecordsQuarantined {
            class: ViolationClass::Duplicate,
            count: duplicates_quarantined as u64,
        });

        if clean_pct < self.min_clean_percent {
            error!(
                period = %period,
                clean_pct = format!("{clean_pct:.2}"),
                required = format!("{:.2}", self.min_clean_percent),
                "Quality threshold violation"
            );
            return Err(QualityError::ThresholdBreached {
                period: period.to_string(),
                clean_pct,
                required_pct: self.min_clean_percent,
            });
        }

        let stats = QualityStats {
            total_records: total,
            records_passed: clean.len(),
            records_quarantined: quarantine.len(),
            null_violations,
            duplicate_violations,
            range_violations: 0,
            format_violations: 0,
        };

        Ok(GateOutcome {
            clean,
            quarantine,
            stats,
        })
    }
}
