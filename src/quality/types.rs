//! Record-level quality types: validation outcomes, quarantine records and
//! per-period audit counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::FlightRecord;
use crate::store::{Row, Value};

/// Outcome of validating (and deduplicating) one record.
///
/// `reason` accumulates every failing check, semicolon-joined, in check
/// order. A duplicate flagged after validation carries exactly
/// `Duplicate record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: String) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason),
        }
    }
}

/// A raw record annotated with its validation outcome.
///
/// The raw record itself stays untouched; outcomes live on this wrapper so
/// validation can run in parallel without aliasing the input batch.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub record: FlightRecord,
    pub outcome: ValidationOutcome,
}

/// Summary projection of a rejected record, persisted for audit.
///
/// The full raw payload is not retained; this mirrors the natural key plus
/// enough context to investigate the rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub source_period: String,
    pub quarantined_at: DateTime<Utc>,
    pub rejection_reason: String,
    pub fl_date: Option<chrono::NaiveDate>,
    pub op_unique_carrier: Option<String>,
    pub op_carrier_fl_num: Option<String>,
    pub origin: Option<String>,
    pub dest: Option<String>,
}

impl QuarantineRecord {
    pub const COLUMNS: [&'static str; 8] = [
        "source_quarter",
        "quarantine_date",
        "rejection_reason",
        "fl_date",
        "op_unique_carrier",
        "op_carrier_fl_num",
        "origin",
        "dest",
    ];

    pub fn from_rejected(period: &str, rejected: &ValidatedRecord, now: DateTime<Utc>) -> Self {
        let record = &rejected.record;
        Self {
            source_period: period.to_string(),
            quarantined_at: now,
            rejection_reason: rejected
                .outcome
                .reason
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            fl_date: record.fl_date,
            op_unique_carrier: record.op_unique_carrier.clone(),
            op_carrier_fl_num: record.op_carrier_fl_num.clone(),
            origin: record.origin.clone(),
            dest: record.dest.clone(),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            Value::Text(self.source_period.clone()),
            Value::Text(self.quarantined_at.to_rfc3339()),
            Value::Text(self.rejection_reason.clone()),
            Value::text(self.fl_date.map(|d| d.to_string())),
            Value::text(self.op_unique_carrier.clone()),
            Value::text(self.op_carrier_fl_num.clone()),
            Value::text(self.origin.clone()),
            Value::text(self.dest.clone()),
        ]
    }
}

/// Per-period data-quality counters.
///
/// Range and format counters are reserved for future checks and always zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityStats {
    pub total_records: usize,
    pub records_passed: usize,
    pub records_quarantined: usize,
    pub null_violations: usize,
    pub duplicate_violations: usize,
    pub range_violations: usize,
    pub format_violations: usize,
}

impl QualityStats {
    pub const COLUMNS: [&'static str; 8] = [
        "source_quarter",
        "total_records_processed",
        "records_passed",
        "records_quarantined",
        "null_violations_count",
        "duplicate_violations_count",
        "range_violations_count",
        "format_violations_count",
    ];

    pub fn to_row(&self, period: &str) -> Row {
        vec![
            Value::Text(period.to_string()),
            Value::Int(self.total_records as i64),
            Value::Int(self.records_passed as i64),
            Value::Int(self.records_quarantined as i64),
            Value::Int(self.null_violations as i64),
            Value::Int(self.duplicate_violations as i64),
            Value::Int(self.range_violations as i64),
            Value::Int(self.format_violations as i64),
        ]
    }
}
