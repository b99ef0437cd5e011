//! Fact resolution: dimension-key joins and the two fact projections.
//!
//! Cancelled flights are excluded from both projections; they are valid
//! records, just out of scope for delay and performance analysis, so they
//! are counted and logged rather than quarantined. Records whose date,
//! carrier, origin or destination fails to resolve to a surrogate key are a
//! distinct drop class, also counted but never persisted.

use tracing::{info, warn};

use crate::dimensions::DimensionLookups;
use crate::emit;
use crate::error::ResolveError;
use crate::metrics::{CancelledExcluded, FkMissesDropped};
use crate::record::FlightRecord;
use crate::store::{Row, Value};

/// Arrival-delay classification, binned on whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayCategory {
    OnTime,
    Minor,
    Moderate,
    Severe,
}

impl DelayCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelayCategory::OnTime => "On-Time",
            DelayCategory::Minor => "Minor",
            DelayCategory::Moderate => "Moderate",
            DelayCategory::Severe => "Severe",
        }
    }
}

/// Classify an arrival delay.
///
/// Missing and non-finite delays classify as On-Time.
pub fn delay_category(arrival_delay: Option<f64>) -> DelayCategory {
    match arrival_delay {
        Some(delay) if delay.is_finite() && delay > 0.0 => {
            if delay <= 60.0 {
                DelayCategory::Minor
            } else if delay <= 180.0 {
                DelayCategory::Moderate
            } else {
                DelayCategory::Severe
            }
        }
        _ => DelayCategory::OnTime,
    }
}

/// Sum of the five delay-cause measures, treating non-finite and missing
/// values as absent. Null when all five are absent.
pub fn total_delay_minutes(causes: [Option<f64>; 5]) -> Option<f64> {
    let mut sum = None;
    for value in causes.into_iter().flatten() {
        if value.is_finite() {
            sum = Some(sum.unwrap_or(0.0) + value);
        }
    }
    sum
}

/// Delay indicator: 1 iff the arrival delay is present, finite and over 15
/// minutes.
pub fn is_delayed(arrival_delay: Option<f64>) -> i16 {
    match arrival_delay {
        Some(delay) if delay.is_finite() && delay > 15.0 => 1,
        _ => 0,
    }
}

/// Flight-performance fact row: schedule, duration and distance measures.
#[derive(Debug, Clone)]
pub struct PerformanceFact {
    pub date_key: i64,
    pub airline_key: i64,
    pub origin_airport_key: i64,
    pub dest_airport_key: i64,
    pub flight_number: Option<String>,
    pub scheduled_dep_time: Option<f64>,
    pub actual_dep_time: Option<f64>,
    pub scheduled_arr_time: Option<f64>,
    pub actual_arr_time: Option<f64>,
    pub scheduled_elapsed_time: Option<f64>,
    pub actual_elapsed_time: Option<f64>,
    pub air_time: Option<f64>,
    pub taxi_out: Option<f64>,
    pub taxi_in: Option<f64>,
    pub distance: Option<f64>,
    pub cancelled: Option<i16>,
    pub cancellation_code: Option<String>,
    pub diverted: Option<i16>,
}

impl PerformanceFact {
    pub const COLUMNS: [&'static str; 18] = [
        "date_key",
        "airline_key",
        "origin_airport_key",
        "dest_airport_key",
        "flight_number",
        "scheduled_dep_time",
        "actual_dep_time",
        "scheduled_arr_time",
        "actual_arr_time",
        "scheduled_elapsed_time",
        "actual_elapsed_time",
        "air_time",
        "taxi_out",
        "taxi_in",
        "distance",
        "cancelled",
        "cancellation_code",
        "diverted",
    ];

    pub fn to_row(&self) -> Row {
        vec![
            Value::Int(self.date_key),
            Value::Int(self.airline_key),
            Value::Int(self.origin_airport_key),
            Value::Int(self.dest_airport_key),
            Value::text(self.flight_number.clone()),
            Value::float(self.scheduled_dep_time),
            Value::float(self.actual_dep_time),
            Value::float(self.scheduled_arr_time),
            Value::float(self.actual_arr_time),
            Value::float(self.scheduled_elapsed_time),
            Value::float(self.actual_elapsed_time),
            Value::float(self.air_time),
            Value::float(self.taxi_out),
            Value::float(self.taxi_in),
            Value::float(self.distance),
            Value::int(self.cancelled),
            Value::text(self.cancellation_code.clone()),
            Value::int(self.diverted),
        ]
    }
}

/// Delay fact row: delay measures plus the derived total, indicator and
/// category.
#[derive(Debug, Clone)]
pub struct DelayFact {
    pub date_key: i64,
    pub airline_key: i64,
    pub origin_airport_key: i64,
    pub dest_airport_key: i64,
    pub flight_number: Option<String>,
    pub departure_delay: Option<f64>,
    pub arrival_delay: Option<f64>,
    pub carrier_delay: Option<f64>,
    pub weather_delay: Option<f64>,
    pub nas_delay: Option<f64>,
    pub security_delay: Option<f64>,
    pub late_aircraft_delay: Option<f64>,
    pub total_delay_minutes: Option<f64>,
    pub is_delayed: i16,
    pub delay_category: DelayCategory,
}

impl DelayFact {
    pub const COLUMNS: [&'static str; 15] = [
        "date_key",
        "airline_key",
        "origin_airport_key",
        "dest_airport_key",
        "flight_number",
        "departure_delay",
        "arrival_delay",
        "carrier_delay",
        "weather_delay",
        "nas_delay",
        "security_delay",
        "late_aircraft_delay",
        "total_delay_minutes",
        "is_delayed",
        "delay_category",
    ];

    pub fn to_row(&self) -> Row {
        vec![
            Value::Int(self.date_key),
            Value::Int(self.airline_key),
            Value::Int(self.origin_airport_key),
            Value::Int(self.dest_airport_key),
            Value::text(self.flight_number.clone()),
            Value::float(self.departure_delay),
            Value::float(self.arrival_delay),
            Value::float(self.carrier_delay),
            Value::float(self.weather_delay),
            Value::float(self.nas_delay),
            Value::float(self.security_delay),
            Value::float(self.late_aircraft_delay),
            Value::float(self.total_delay_minutes),
            Value::Int(self.is_delayed as i64),
            Value::Text(self.delay_category.as_str().to_string()),
        ]
    }
}

/// Result of resolving one period's clean records.
#[derive(Debug, Default)]
pub struct ResolvedFacts {
    pub performance: Vec<PerformanceFact>,
    pub delays: Vec<DelayFact>,
    pub cancelled_excluded: usize,
    pub fk_misses: usize,
}

/// Resolves clean records against the dimension key lookups and shapes the
/// two fact projections.
#[derive(Debug)]
pub struct FactResolver<'a> {
    lookups: &'a DimensionLookups,
}

struct ResolvedKeys {
    date_key: i64,
    airline_key: i64,
    origin_airport_key: i64,
    dest_airport_key: i64,
}

impl<'a> FactResolver<'a> {
    pub fn new(lookups: &'a DimensionLookups) -> Self {
        Self { lookups }
    }

    fn resolve_keys(&self, record: &FlightRecord) -> Option<ResolvedKeys> {
        let date_key = *self.lookups.date_keys.get(&record.fl_date?)?;
        let airline_key = *self
            .lookups
            .carrier_keys
            .get(record.op_unique_carrier.as_deref()?)?;
        let origin_airport_key = *self.lookups.airport_keys.get(record.origin.as_deref()?)?;
        let dest_airport_key = *self.lookups.airport_keys.get(record.dest.as_deref()?)?;
        Some(ResolvedKeys {
            date_key,
            airline_key,
            origin_airport_key,
            dest_airport_key,
        })
    }

    /// Resolve one period's clean records into the two fact projections.
    ///
    /// Fatal when nothing survives cancellation exclusion or key
    /// resolution: an empty fact load for a period aborts the run.
    pub fn resolve(
        &self,
        period: &str,
        clean: Vec<FlightRecord>,
    ) -> Result<ResolvedFacts, ResolveError> {
        let original_count = clean.len();
        let survivors: Vec<FlightRecord> =
            clean.into_iter().filter(|r| !r.is_cancelled()).collect();
        let cancelled_excluded = original_count - survivors.len();

        info!(
            period = %period,
            excluded = cancelled_excluded,
            remaining = survivors.len(),
            "Excluded cancelled flights"
        );
        emit!(CancelledExcluded {
            count: cancelled_excluded as u64,
        });

        if survivors.is_empty() {
            return Err(ResolveError::AllCancelled {
                period: period.to_string(),
            });
        }

        let mut resolved = ResolvedFacts {
            cancelled_excluded,
            ..ResolvedFacts::default()
        };

        for record in survivors {
            let Some(keys) = self.resolve_keys(&record) else {
                resolved.fk_misses += 1;
                continue;
            };

            resolved.performance.push(PerformanceFact {
                date_key: keys.date_key,
                airline_key: keys.airline_key,
                origin_airport_key: keys.origin_airport_key,
                dest_airport_key: keys.dest_airport_key,
                flight_number: record.op_carrier_fl_num.clone(),
                scheduled_dep_time: record.crs_dep_time,
                actual_dep_time: record.dep_time,
                scheduled_arr_time: record.crs_arr_time,
                actual_arr_time: record.arr_time,
                scheduled_elapsed_time: record.crs_elapsed_time,
                actual_elapsed_time: record.actual_elapsed_time,
                air_time: record.air_time,
                taxi_out: record.taxi_out,
                taxi_in: record.taxi_in,
                distance: record.distance,
                cancelled: record.cancelled,
                cancellation_code: record.cancellation_code.clone(),
                diverted: record.diverted,
            });

            resolved.delays.push(DelayFact {
                date_key: keys.date_key,
                airline_key: keys.airline_key,
                origin_airport_key: keys.origin_airport_key,
                dest_airport_key: keys.dest_airport_key,
                flight_number: record.op_carrier_fl_num.clone(),
                departure_delay: record.dep_delay,
                arrival_delay: record.arr_delay,
                carrier_delay: record.carrier_delay,
                weather_delay: record.weather_delay,
                nas_delay: record.nas_delay,
                security_delay: record.security_delay,
                late_aircraft_delay: record.late_aircraft_delay,
                total_delay_minutes: total_delay_minutes([
                    record.carrier_delay,
                    record.weather_delay,
                    record.nas_delay,
                    record.security_delay,
                    record.late_aircraft_delay,
                ]),
                is_delayed: is_delayed(record.arr_delay),
                delay_category: delay_category(record.arr_delay),
            });
        }

        if resolved.fk_misses > 0 {
            warn!(
                period = %period,
                dropped = resolved.fk_misses,
                "Dropped records with unresolvable dimension keys"
            );
        }
        emit!(FkMissesDropped {
            count: resolved.fk_misses as u64,
        });

        if resolved.performance.is_empty() {
            return Err(ResolveError::NoResolvedRecords {
                period: period.to_string(),
            });
        }

        info!(
            period = %period,
            records = resolved.performance.len(),
            "Records with valid dimension keys"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_carrier_names;
    use crate::dimensions::DimensionBuilder;
    use chrono::NaiveDate;

    fn record(carrier: &str, origin: &str, dest: &str) -> FlightRecord {
        FlightRecord {
            fl_date: NaiveDate::from_ymd_opt(2023, 8, 20),
            op_unique_carrier: Some(carrier.to_string()),
            op_carrier_fl_num: Some("42".to_string()),
            origin: Some(origin.to_string()),
            dest: Some(dest.to_string()),
            dep_time: Some(900.0),
            arr_time: Some(1100.0),
            ..FlightRecord::default()
        }
    }

    fn lookups_for(records: &[FlightRecord]) -> DimensionLookups {
        DimensionBuilder::new(default_carrier_names())
            .build(&[records.to_vec()])
            .lookups
    }

    #[test]
    fn test_delay_category_boundaries() {
        assert_eq!(delay_category(Some(0.0)), DelayCategory::OnTime);
        assert_eq!(delay_category(Some(-10.0)), DelayCategory::OnTime);
        assert_eq!(delay_category(Some(1.0)), DelayCategory::Minor);
        assert_eq!(delay_category(Some(60.0)), DelayCategory::Minor);
        assert_eq!(delay_category(Some(61.0)), DelayCategory::Moderate);
        assert_eq!(delay_category(Some(180.0)), DelayCategory::Moderate);
        assert_eq!(delay_category(Some(181.0)), DelayCategory::Severe);
        assert_eq!(delay_category(None), DelayCategory::OnTime);
        assert_eq!(delay_category(Some(f64::NAN)), DelayCategory::OnTime);
        assert_eq!(delay_category(Some(f64::INFINITY)), DelayCategory::OnTime);
    }

    #[test]
    fn test_total_delay_minutes() {
        // All absent: null.
        assert_eq!(total_delay_minutes([None; 5]), None);
        assert_eq!(
            total_delay_minutes([Some(f64::NAN), None, Some(f64::INFINITY), None, None]),
            None
        );
        // Present finite values sum; absences are skipped.
        assert_eq!(
            total_delay_minutes([Some(10.0), None, Some(5.0), Some(f64::NAN), None]),
            Some(15.0)
        );
        assert_eq!(
            total_delay_minutes([Some(0.0), None, None, None, None]),
            Some(0.0)
        );
    }

    #[test]
    fn test_is_delayed_threshold() {
        assert_eq!(is_delayed(Some(15.0)), 0);
        assert_eq!(is_delayed(Some(15.1)), 1);
        assert_eq!(is_delayed(Some(16.0)), 1);
        assert_eq!(is_delayed(None), 0);
        assert_eq!(is_delayed(Some(f64::INFINITY)), 0);
    }

    #[test]
    fn test_cancelled_flights_never_reach_facts() {
        let mut cancelled = record("DL", "ATL", "JFK");
        cancelled.cancelled = Some(1);
        cancelled.cancellation_code = Some("B".to_string());
        let kept = record("DL", "JFK", "ATL");

        let records = vec![cancelled, kept];
        let lookups = lookups_for(&records);
        let resolver = FactResolver::new(&lookups);

        let resolved = resolver.resolve("Q3", records).unwrap();
        assert_eq!(resolved.cancelled_excluded, 1);
        assert_eq!(resolved.performance.len(), 1);
        assert_eq!(resolved.delays.len(), 1);
        // The surviving fact is the non-cancelled leg.
        assert!(resolved.performance[0].cancellation_code.is_none());
    }

    #[test]
    fn test_all_cancelled_is_fatal() {
        let mut cancelled = record("DL", "ATL", "JFK");
        cancelled.cancelled = Some(1);
        let records = vec![cancelled];
        let lookups = lookups_for(&records);
        let resolver = FactResolver::new(&lookups);

        assert!(matches!(
            resolver.resolve("Q3", records),
            Err(ResolveError::AllCancelled { .. })
        ));
    }

    #[test]
    fn test_fk_miss_drops_record() {
        let known = record("DL", "ATL", "JFK");
        let lookups = lookups_for(std::slice::from_ref(&known));
        let resolver = FactResolver::new(&lookups);

        // Second record's airport never entered the dimension.
        let stranger = record("DL", "XXX", "JFK");
        let resolved = resolver.resolve("Q1", vec![known, stranger]).unwrap();
        assert_eq!(resolved.fk_misses, 1);
        assert_eq!(resolved.performance.len(), 1);
    }

    #[test]
    fn test_zero_resolved_is_fatal() {
        let known = record("DL", "ATL", "JFK");
        let lookups = lookups_for(std::slice::from_ref(&known));
        let resolver = FactResolver::new(&lookups);

        let stranger = record("UA", "XXX", "YYY");
        assert!(matches!(
            resolver.resolve("Q1", vec![stranger]),
            Err(ResolveError::NoResolvedRecords { .. })
        ));
    }

    #[test]
    fn test_non_finite_measures_null_out_in_rows() {
        let mut rec = record("DL", "ATL", "JFK");
        rec.distance = Some(f64::INFINITY);
        rec.arr_delay = Some(f64::NAN);
        let lookups = lookups_for(std::slice::from_ref(&rec));
        let resolver = FactResolver::new(&lookups);

        let resolved = resolver.resolve("Q1", vec![rec]).unwrap();
        let perf_row = resolved.performance[0].to_row();
        // distance is the 15th column (index 14).
        assert_eq!(perf_row[14], Value::Null);

        let delay_row = resolved.delays[0].to_row();
        // arrival_delay is index 6; category falls back to On-Time.
        assert_eq!(delay_row[6], Value::Null);
        assert_eq!(delay_row[14], Value::Text("On-Time".to_string()));
    }
}
