//! Per-record mandatory-field validation.
//!
//! All six checks run on every record; failures accumulate rather than
//! short-circuiting, so a record missing three fields reports all three.

use crate::record::FlightRecord;

use super::types::ValidationOutcome;

pub const REASON_NULL_FL_DATE: &str = "NULL fl_date";
pub const REASON_NULL_ORIGIN: &str = "NULL origin";
pub const REASON_NULL_DEST: &str = "NULL dest";
pub const REASON_NULL_CARRIER: &str = "NULL carrier";
pub const REASON_NULL_DEP_TIME: &str = "NULL dep_time";
pub const REASON_NULL_ARR_TIME: &str = "NULL arr_time";

/// A string field is present when it is non-blank after trimming.
fn text_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// A clock-time field is present when it holds a value that is not NaN.
/// (Infinities count as present here; they are nulled later, at the fact
/// boundary.)
fn time_present(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}

/// Validate one record against the six mandatory fields.
///
/// Pure function: no side effects, deterministic, evaluates every check.
pub fn validate_record(record: &FlightRecord) -> ValidationOutcome {
    let mut reasons: Vec<&str> = Vec::new();

    if record.fl_date.is_none() {
        reasons.push(REASON_NULL_FL_DATE);
    }
    if !text_present(&record.origin) {
        reasons.push(REASON_NULL_ORIGIN);
    }
    if !text_present(&record.dest) {
        reasons.push(REASON_NULL_DEST);
    }
    if !text_present(&record.op_unique_carrier) {
        reasons.push(REASON_NULL_CARRIER);
    }
    if !time_present(record.dep_time) {
        reasons.push(REASON_NULL_DEP_TIME);
    }
    if !time_present(record.arr_time) {
        reasons.push(REASON_NULL_ARR_TIME);
    }

    if reasons.is_empty() {
        ValidationOutcome::valid()
    } else {
        ValidationOutcome::invalid(reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn complete_record() -> FlightRecord {
        FlightRecord {
            fl_date: NaiveDate::from_ymd_opt(2023, 6, 1),
            op_unique_carrier: Some("UA".to_string()),
            op_carrier_fl_num: Some("100".to_string()),
            origin: Some("SFO".to_string()),
            dest: Some("EWR".to_string()),
            dep_time: Some(700.0),
            arr_time: Some(1522.0),
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_complete_record_is_valid() {
        let outcome = validate_record(&complete_record());
        assert!(outcome.is_valid);
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn test_all_checks_accumulate() {
        let outcome = validate_record(&FlightRecord::default());
        assert!(!outcome.is_valid);
        assert_eq!(
            outcome.reason.as_deref(),
            Some(
                "NULL fl_date; NULL origin; NULL dest; NULL carrier; \
                 NULL dep_time; NULL arr_time"
            )
        );
    }

    #[test]
    fn test_blank_after_trim_is_missing() {
        let mut record = complete_record();
        record.origin = Some("   ".to_string());
        let outcome = validate_record(&record);
        assert_eq!(outcome.reason.as_deref(), Some("NULL origin"));
    }

    #[test]
    fn test_nan_time_is_missing_but_infinity_is_present() {
        let mut record = complete_record();
        record.dep_time = Some(f64::NAN);
        let outcome = validate_record(&record);
        assert_eq!(outcome.reason.as_deref(), Some("NULL dep_time"));

        record.dep_time = Some(f64::INFINITY);
        assert!(validate_record(&record).is_valid);
    }

    #[test]
    fn test_validator_is_deterministic() {
        let mut record = complete_record();
        record.dest = None;
        record.arr_time = None;
        let first = validate_record(&record);
        let second = validate_record(&record);
        assert_eq!(first, second);
        assert_eq!(first.reason.as_deref(), Some("NULL dest; NULL arr_time"));
    }
}
