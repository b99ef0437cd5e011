//! Contrail: ETL pipeline and query translation for flight on-time data.
//!
//! This crate handles:
//! - Extracting per-quarter flight records from an NDJSON source
//! - Validating, deduplicating and quality-gating each quarter's batch
//! - Building date, airline and airport dimensions with surrogate keys
//! - Resolving and bulk-loading performance and delay fact tables
//! - Quarantining rejected records with their rejection reasons
//! - Rewriting star-schema SQL into normalized per-period queries

pub mod config;
pub mod dimensions;
pub mod error;
pub mod facts;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod record;
pub mod store;
pub mod translate;

// Re-export commonly used items
pub use config::Config;
pub use error::PipelineError;
pub use logging::init_tracing;
pub use pipeline::{PeriodStats, Pipeline, PipelineStats};
pub use record::FlightRecord;
pub use translate::Translator;
