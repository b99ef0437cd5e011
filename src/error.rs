//! Error types for the contrail warehouse loader.

use snafu::prelude::*;

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadFile { source: std::io::Error },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// No source periods configured.
    #[snafu(display("At least one source period must be configured"))]
    NoPeriods,

    /// Clean-data threshold out of range.
    #[snafu(display("min_clean_percent must be in (0, 100], got {value}"))]
    InvalidCleanThreshold { value: f64 },

    /// Batch size of zero.
    #[snafu(display("batch_size must be greater than zero"))]
    InvalidBatchSize,

    /// Retry budget of zero.
    #[snafu(display("max_attempts must be greater than zero"))]
    InvalidRetryBudget,
}

/// Errors surfaced by store backends.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// IO error while reading or writing store files.
    #[snafu(display("Store IO error: {source}"))]
    Io { source: std::io::Error },

    /// Failed to serialize a row or record.
    #[snafu(display("Failed to serialize store record: {source}"))]
    Serialize { source: serde_json::Error },

    /// Failed to parse a source record.
    #[snafu(display("Failed to parse source record in {period}: {source}"))]
    ParseRecord {
        period: String,
        source: serde_json::Error,
    },

    /// Period has no backing data.
    #[snafu(display("Unknown source period: {period}"))]
    UnknownPeriod { period: String },

    /// The writer rejected a batch (constraint violation or equivalent).
    #[snafu(display("Insert into {table} rejected: {message}"))]
    Rejected { table: String, message: String },
}

/// Errors raised by the quality gate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QualityError {
    /// An empty batch reached the gate; callers must never let this happen.
    #[snafu(display("Empty batch for period {period} reached the quality gate"))]
    EmptyBatch { period: String },

    /// Clean ratio below the configured threshold.
    #[snafu(display(
        "Data quality below acceptable threshold for {period}: {clean_pct:.2}% < {required_pct:.2}%"
    ))]
    ThresholdBreached {
        period: String,
        clean_pct: f64,
        required_pct: f64,
    },
}

/// Errors raised during fact resolution.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResolveError {
    /// Every clean record in the period was a cancelled flight.
    #[snafu(display("No non-cancelled records in {period}"))]
    AllCancelled { period: String },

    /// No record survived dimension-key resolution.
    #[snafu(display("No valid dimension-key matches in {period}"))]
    NoResolvedRecords { period: String },
}

/// Errors raised by the bulk loader.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LoadError {
    /// A batch kept failing after every retry.
    #[snafu(display("Batch insert into {table} failed after {attempts} attempts: {source}"))]
    RetriesExhausted {
        table: String,
        attempts: u32,
        source: StoreError,
    },
}

/// Errors raised while persisting the run checkpoint.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CheckpointError {
    /// Failed to read or write the checkpoint file.
    #[snafu(display("Checkpoint IO error: {source}"))]
    CheckpointIo { source: std::io::Error },

    /// Failed to serialize or parse checkpoint state.
    #[snafu(display("Checkpoint serialization error: {source}"))]
    CheckpointSerde { source: serde_json::Error },
}

/// Top-level pipeline errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Store error.
    #[snafu(display("Store error: {source}"))]
    Store { source: StoreError },

    /// Quality-gate failure.
    #[snafu(display("Quality gate error: {source}"))]
    Quality { source: QualityError },

    /// Zero clean records after quarantine.
    #[snafu(display("No clean records in {period} - cannot continue"))]
    NoCleanRecords { period: String },

    /// Fact-resolution failure.
    #[snafu(display("Fact resolution error: {source}"))]
    Resolve { source: ResolveError },

    /// Bulk-load failure.
    #[snafu(display("Load error: {source}"))]
    Load { source: LoadError },

    /// Checkpoint failure.
    #[snafu(display("Checkpoint error: {source}"))]
    Checkpoint { source: CheckpointError },
}

impl From<ConfigError> for PipelineError {
    fn from(source: ConfigError) -> Self {
        PipelineError::Config { source }
    }
}

impl From<StoreError> for PipelineError {
    fn from(source: StoreError) -> Self {
        PipelineError::Store { source }
    }
}

impl From<QualityError> for PipelineError {
    fn from(source: QualityError) -> Self {
        PipelineError::Quality { source }
    }
}

impl From<ResolveError> for PipelineError {
    fn from(source: ResolveError) -> Self {
        PipelineError::Resolve { source }
    }
}

impl From<LoadError> for PipelineError {
    fn from(source: LoadError) -> Self {
        PipelineError::Load { source }
    }
}

impl From<CheckpointError> for PipelineError {
    fn from(source: CheckpointError) -> Self {
        PipelineError::Checkpoint { source }
    }
}
