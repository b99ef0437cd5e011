//! Raw flight-operations records as read from the normalized source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One flight leg as stored in a per-period source table.
///
/// Every field is optional: the source layout permits nulls everywhere and
/// the quality gate decides what is acceptable. Records are never mutated
/// after extraction; validation attaches its outcome to a wrapper instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub fl_date: Option<NaiveDate>,
    pub op_unique_carrier: Option<String>,
    pub op_carrier_fl_num: Option<String>,
    pub origin: Option<String>,
    pub dest: Option<String>,

    pub crs_dep_time: Option<f64>,
    pub dep_time: Option<f64>,
    pub crs_arr_time: Option<f64>,
    pub arr_time: Option<f64>,

    pub dep_delay: Option<f64>,
    pub arr_delay: Option<f64>,

    pub taxi_out: Option<f64>,
    pub taxi_in: Option<f64>,

    pub crs_elapsed_time: Option<f64>,
    pub actual_elapsed_time: Option<f64>,
    pub air_time: Option<f64>,

    pub distance: Option<f64>,

    pub cancelled: Option<i16>,
    pub cancellation_code: Option<String>,
    pub diverted: Option<i16>,

    pub carrier_delay: Option<f64>,
    pub weather_delay: Option<f64>,
    pub nas_delay: Option<f64>,
    pub security_delay: Option<f64>,
    pub late_aircraft_delay: Option<f64>,
}

impl FlightRecord {
    /// Whether this record is a cancelled flight.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled == Some(1)
    }
}
