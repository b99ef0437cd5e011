//! Batch-local duplicate detection on the natural flight key.

use std::collections::HashMap;

use crate::record::FlightRecord;

use super::types::{ValidatedRecord, ValidationOutcome};

pub const REASON_DUPLICATE: &str = "Duplicate record";

/// Token substituted for any absent field inside the natural key, so that
/// absences never collide with present-but-empty values.
const MISSING_TOKEN: &str = "NULL";

/// Natural key: date, carrier, flight number, origin and destination in
/// their display forms, underscore-joined.
pub fn natural_key(record: &FlightRecord) -> String {
    let date = record
        .fl_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| MISSING_TOKEN.to_string());
    fn part(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or(MISSING_TOKEN)
    }

    format!(
        "{}_{}_{}_{}_{}",
        date,
        part(&record.op_unique_carrier),
        part(&record.op_carrier_fl_num),
        part(&record.origin),
        part(&record.dest),
    )
}

/// Flag duplicates within one batch.
///
/// Any record sharing its natural key with at least one other record in the
/// batch counts as a duplicate violation. Only records that are still valid
/// get relabeled `Duplicate record`; a record that already failed validation
/// keeps its original reason. Returns the number of records in duplicated
/// keys (valid or not), matching the audit counter semantics.
pub fn mark_duplicates(batch: &mut [ValidatedRecord]) -> usize {
    let keys: Vec<String> = batch
        .iter()
        .map(|validated| natural_key(&validated.record))
        .collect();
    let mut key_counts: HashMap<&str, usize> = HashMap::new();
    for key in &keys {
        *key_counts.entry(key).or_insert(0) += 1;
    }

    let mut violations = 0;
    for (validated, key) in batch.iter_mut().zip(&keys) {
        if key_counts[key.as_str()] > 1 {
            violations += 1;
            if validated.outcome.is_valid {
                validated.outcome = ValidationOutcome::invalid(REASON_DUPLICATE.to_string());
            }
        }
    }
    violations
}
