//! Dimension construction: distinct-value extraction across all input
//! periods, surrogate-key assignment and derived attributes.
//!
//! Dimensions are built from the union of every period before any fact
//! load, so facts for a later period can always resolve values first seen
//! in an earlier one. The build is rebuild-from-scratch: re-running against
//! a non-empty target is the operator's responsibility to truncate first.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use tracing::info;

use crate::record::FlightRecord;
use crate::store::{Row, Value};

/// One row of the date dimension. All derived fields are pure functions of
/// the date; weekday numbering is Sunday=1 through Saturday=7.
#[derive(Debug, Clone, PartialEq)]
pub struct DateDimension {
    pub date_key: i64,
    pub full_date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub month_name: String,
    pub day_of_month: u32,
    pub day_of_week: u32,
    pub day_name: String,
    pub is_weekend: bool,
}

impl DateDimension {
    pub const COLUMNS: [&'static str; 10] = [
        "date_key",
        "full_date",
        "year",
        "quarter",
        "month",
        "month_name",
        "day_of_month",
        "day_of_week",
        "day_name",
        "is_weekend",
    ];

    /// Derive the full dimension row for one calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_sunday() + 1;
        Self {
            date_key: date_key(date),
            full_date: date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            month_name: date.format("%B").to_string(),
            day_of_month: date.day(),
            day_of_week,
            day_name: date.format("%A").to_string(),
            is_weekend: day_of_week == 1 || day_of_week == 7,
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            Value::Int(self.date_key),
            Value::Text(self.full_date.to_string()),
            Value::Int(self.year as i64),
            Value::Int(self.quarter as i64),
            Value::Int(self.month as i64),
            Value::Text(self.month_name.clone()),
            Value::Int(self.day_of_month as i64),
            Value::Int(self.day_of_week as i64),
            Value::Text(self.day_name.clone()),
            Value::Int(self.is_weekend as i64),
        ]
    }
}

/// Surrogate key for a date: the `yyyymmdd` integer form.
pub fn date_key(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

/// One row of the carrier dimension. Codes absent from the injected name
/// map keep a null name; that never aborts a load.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierDimension {
    pub carrier_key: i64,
    pub carrier_code: String,
    pub carrier_name: Option<String>,
}

impl CarrierDimension {
    pub const COLUMNS: [&'static str; 3] = ["airline_key", "carrier_code", "carrier_name"];

    pub fn to_row(&self) -> Row {
        vec![
            Value::Int(self.carrier_key),
            Value::Text(self.carrier_code.clone()),
            Value::text(self.carrier_name.clone()),
        ]
    }
}

/// One row of the airport dimension. City and state are intentionally
/// unset in this version: the source layout no longer carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportDimension {
    pub airport_key: i64,
    pub airport_code: String,
    pub city_name: Option<String>,
    pub state_name: Option<String>,
}

impl AirportDimension {
    pub const COLUMNS: [&'static str; 4] =
        ["airport_key", "airport_code", "city_name", "state_name"];

    pub fn to_row(&self) -> Row {
        vec![
            Value::Int(self.airport_key),
            Value::Text(self.airport_code.clone()),
            Value::text(self.city_name.clone()),
            Value::text(self.state_name.clone()),
        ]
    }
}

/// Natural-value to surrogate-key lookups for fact resolution.
#[derive(Debug, Clone, Default)]
pub struct DimensionLookups {
    pub date_keys: HashMap<NaiveDate, i64>,
    pub carrier_keys: HashMap<String, i64>,
    pub airport_keys: HashMap<String, i64>,
}

/// The three built dimensions plus their key lookups.
#[derive(Debug, Clone)]
pub struct Dimensions {
    pub dates: Vec<DateDimension>,
    pub carriers: Vec<CarrierDimension>,
    pub airports: Vec<AirportDimension>,
    pub lookups: DimensionLookups,
}

/// Builds dimensions from the distinct values observed across all periods.
#[derive(Debug, Clone)]
pub struct DimensionBuilder {
    carrier_names: IndexMap<String, String>,
}

impl DimensionBuilder {
    /// The carrier-name mapping is injected rather than baked in, so it can
    /// be replaced in tests and configuration.
    pub fn new(carrier_names: IndexMap<String, String>) -> Self {
        Self { carrier_names }
    }

    /// Build all three dimensions from the union of the given period
    /// batches. Surrogate keys for carriers and airports are assigned 1..N
    /// over the sorted distinct codes, so repeat runs over the same input
    /// produce identical keys.
    pub fn build<B: AsRef<[FlightRecord]>>(&self, batches: &[B]) -> Dimensions {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut carrier_codes: BTreeSet<String> = BTreeSet::new();
        let mut airport_codes: BTreeSet<String> = BTreeSet::new();

        for batch in batches {
            for record in batch.as_ref() {
                if let Some(date) = record.fl_date {
                    dates.insert(date);
                }
                if let Some(carrier) = &record.op_unique_carrier {
                    carrier_codes.insert(carrier.clone());
                }
                if let Some(origin) = &record.origin {
                    airport_codes.insert(origin.clone());
                }
                if let Some(dest) = &record.dest {
                    airport_codes.insert(dest.clone());
                }
            }
        }

        let mut lookups = DimensionLookups::default();

        let dates: Vec<DateDimension> = dates
            .into_iter()
            .map(|date| {
                let row = DateDimension::from_date(date);
                lookups.date_keys.insert(date, row.date_key);
                row
            })
            .collect();

        let carriers: Vec<CarrierDimension> = carrier_codes
            .into_iter()
            .enumerate()
            .map(|(i, code)| {
                let key = i as i64 + 1;
                lookups.carrier_keys.insert(code.clone(), key);
                CarrierDimension {
                    carrier_key: key,
                    carrier_name: self.carrier_names.get(&code).cloned(),
                    carrier_code: code,
                }
            })
            .collect();

        let airports: Vec<AirportDimension> = airport_codes
            .into_iter()
            .enumerate()
            .map(|(i, code)| {
                let key = i as i64 + 1;
                lookups.airport_keys.insert(code.clone(), key);
                AirportDimension {
                    airport_key: key,
                    airport_code: code,
                    city_name: None,
                    state_name: None,
                }
            })
            .collect();

        info!(
            dates = dates.len(),
            carriers = carriers.len(),
            airports = airports.len(),
            "Dimensions built"
        );

        Dimensions {
            dates,
            carriers,
            airports,
            lookups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_carrier_names;

    fn record(date: (i32, u32, u32), carrier: &str, origin: &str, dest: &str) -> FlightRecord {
        FlightRecord {
            fl_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            op_unique_carrier: Some(carrier.to_string()),
            origin: Some(origin.to_string()),
            dest: Some(dest.to_string()),
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_date_attributes() {
        // 2023-01-01 was a Sunday.
        let row = DateDimension::from_date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(row.date_key, 20230101);
        assert_eq!(row.year, 2023);
        assert_eq!(row.quarter, 1);
        assert_eq!(row.month, 1);
        assert_eq!(row.month_name, "January");
        assert_eq!(row.day_of_month, 1);
        assert_eq!(row.day_of_week, 1);
        assert_eq!(row.day_name, "Sunday");
        assert!(row.is_weekend);

        // 2023-11-15 was a Wednesday in Q4.
        let row = DateDimension::from_date(NaiveDate::from_ymd_opt(2023, 11, 15).unwrap());
        assert_eq!(row.date_key, 20231115);
        assert_eq!(row.quarter, 4);
        assert_eq!(row.day_of_week, 4);
        assert_eq!(row.day_name, "Wednesday");
        assert!(!row.is_weekend);

        // Saturday is the other weekend day.
        let row = DateDimension::from_date(NaiveDate::from_ymd_opt(2023, 11, 18).unwrap());
        assert_eq!(row.day_of_week, 7);
        assert!(row.is_weekend);
    }

    #[test]
    fn test_distinct_values_span_all_periods() {
        let builder = DimensionBuilder::new(default_carrier_names());
        let q1 = vec![record((2023, 1, 5), "AA", "DFW", "ORD")];
        let q3 = vec![
            record((2023, 7, 9), "DL", "ATL", "DFW"),
            record((2023, 7, 9), "DL", "ATL", "MCO"),
        ];

        let dims = builder.build(&[q1, q3]);
        assert_eq!(dims.dates.len(), 2);
        assert_eq!(dims.carriers.len(), 2);
        // Airports union origins and destinations: ATL, DFW, MCO, ORD.
        assert_eq!(dims.airports.len(), 4);
        assert!(dims.lookups.airport_keys.contains_key("MCO"));
        assert!(dims.lookups.airport_keys.contains_key("DFW"));
    }

    #[test]
    fn test_unknown_carrier_gets_null_name() {
        let builder = DimensionBuilder::new(default_carrier_names());
        let batch = vec![
            record((2023, 5, 1), "DL", "ATL", "JFK"),
            record((2023, 5, 1), "ZZ", "ATL", "JFK"),
        ];

        let dims = builder.build(&[batch]);
        let by_code: HashMap<_, _> = dims
            .carriers
            .iter()
            .map(|c| (c.carrier_code.as_str(), c))
            .collect();
        assert_eq!(
            by_code["DL"].carrier_name.as_deref(),
            Some("Delta Air Lines")
        );
        assert!(by_code["ZZ"].carrier_name.is_none());
    }

    #[test]
    fn test_surrogate_keys_are_deterministic() {
        let builder = DimensionBuilder::new(default_carrier_names());
        let batch = vec![
            record((2023, 5, 1), "UA", "SFO", "DEN"),
            record((2023, 5, 2), "AA", "DFW", "DEN"),
        ];

        let first = builder.build(&[batch.clone()]);
        let second = builder.build(&[batch]);
        assert_eq!(first.carriers, second.carriers);
        assert_eq!(first.airports, second.airports);
        // Sorted assignment: AA before UA.
        assert_eq!(first.lookups.carrier_keys["AA"], 1);
        assert_eq!(first.lookups.carrier_keys["UA"], 2);
    }
}
