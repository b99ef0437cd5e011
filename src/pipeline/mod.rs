//! Pipeline orchestration.
//!
//! A run is strictly sequential: load the three dimensions (built from the
//! union of every period), then load facts period by period in configured
//! order, then summarize. Any fatal condition anywhere halts the whole run;
//! there is no per-period isolation, and batches already committed stay
//! committed (the target may be left partially loaded on abort).

pub mod checkpoint;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::dimensions::{DimensionBuilder, Dimensions};
use crate::emit;
use crate::error::PipelineError;
use crate::facts::{DelayFact, FactResolver, PerformanceFact};
use crate::loader::BulkLoader;
use crate::metrics::RecordsExtracted;
use crate::quality::types::{QualityStats, QuarantineRecord};
use crate::quality::QualityGate;
use crate::record::FlightRecord;
use crate::store::{SourceReader, WarehouseWriter};

use checkpoint::RunCheckpoint;

pub const DIM_DATE: &str = "Dim_Date";
pub const DIM_AIRLINE: &str = "Dim_Airline";
pub const DIM_AIRPORT: &str = "Dim_Airport";
pub const FACT_PERFORMANCE: &str = "Fact_FlightPerformance";
pub const FACT_DELAYS: &str = "Fact_Delays";
pub const QUARANTINE_TABLE: &str = "FlightData_Quarantine";
pub const DQ_METRICS: &str = "DQ_Metrics";

/// Counts for one loaded period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodStats {
    pub period: String,
    pub records_processed: usize,
    pub records_quarantined: usize,
    pub cancelled_excluded: usize,
    pub fk_misses: usize,
    pub performance_facts: usize,
    pub delay_facts: usize,
}

/// Aggregate counts for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub dates: usize,
    pub carriers: usize,
    pub airports: usize,
    pub performance_facts: usize,
    pub delay_facts: usize,
    pub records_processed: usize,
    pub records_quarantined: usize,
    pub cancelled_excluded: usize,
    pub fk_misses: usize,
    pub periods: Vec<PeriodStats>,
}

/// The transform-and-load pipeline.
pub struct Pipeline<'a, R, W> {
    config: &'a Config,
    reader: &'a R,
    writer: &'a W,
}

impl<'a, R: SourceReader, W: WarehouseWriter> Pipeline<'a, R, W> {
    pub fn new(config: &'a Config, reader: &'a R, writer: &'a W) -> Self {
        Self {
            config,
            reader,
            writer,
        }
    }

    /// Run the full dimension and fact load.
    pub async fn run(&self) -> Result<PipelineStats, PipelineError> {
        let mut checkpoint = self.init_checkpoint()?;
        let loader = BulkLoader::new(self.writer, self.config.load.clone());
        let gate = QualityGate::new(self.config.quality.min_clean_percent);

        // Extract every period up front: dimensions must cover the union of
        // all periods before the first fact load.
        let mut batches: Vec<(String, Vec<FlightRecord>)> = Vec::new();
        for period in &self.config.source.periods {
            let records = self.reader.fetch_period(period).await?;
            info!(period = %period, records = records.len(), "Extracted period");
            emit!(RecordsExtracted {
                period: period.clone(),
                count: records.len() as u64,
            });
            batches.push((period.clone(), records));
        }

        info!("Loading dimension tables");
        let record_sets: Vec<&[FlightRecord]> = batches
            .iter()
            .map(|(_, records)| records.as_slice())
            .collect();
        let dimensions = DimensionBuilder::new(self.config.carriers.clone()).build(&record_sets);
        self.load_dimensions(&loader, &dimensions).await?;
        self.save_checkpoint(&mut checkpoint, |c| c.mark_dimensions_loaded())?;

        info!("Loading fact tables");
        let mut stats = PipelineStats {
            dates: dimensions.dates.len(),
            carriers: dimensions.carriers.len(),
            airports: dimensions.airports.len(),
            ..PipelineStats::default()
        };
        let resolver = FactResolver::new(&dimensions.lookups);
        for (period, records) in batches {
            self.load_period(&loader, &gate, &resolver, &period, records, &mut stats)
                .await?;
            self.save_checkpoint(&mut checkpoint, |c| c.mark_period_loaded(&period))?;
        }

        info!(
            dates = stats.dates,
            carriers = stats.carriers,
            airports = stats.airports,
            performance_facts = stats.performance_facts,
            delay_facts = stats.delay_facts,
            processed = stats.records_processed,
            quarantined = stats.records_quarantined,
            "Pipeline completed"
        );
        Ok(stats)
    }

    /// Load all three dimension tables, date then carrier then airport.
    async fn load_dimensions(
        &self,
        loader: &BulkLoader<'a, W>,
        dimensions: &Dimensions,
    ) -> Result<(), PipelineError> {
        let date_rows: Vec<_> = dimensions.dates.iter().map(|d| d.to_row()).collect();
        loader
            .insert(DIM_DATE, &crate::dimensions::DateDimension::COLUMNS, &date_rows)
            .await?;

        let carrier_rows: Vec<_> = dimensions.carriers.iter().map(|c| c.to_row()).collect();
        loader
            .insert(
                DIM_AIRLINE,
                &crate::dimensions::CarrierDimension::COLUMNS,
                &carrier_rows,
            )
            .await?;

        let airport_rows: Vec<_> = dimensions.airports.iter().map(|a| a.to_row()).collect();
        loader
            .insert(
                DIM_AIRPORT,
                &crate::dimensions::AirportDimension::COLUMNS,
                &airport_rows,
            )
            .await?;
        Ok(())
    }

    /// Quality-gate, resolve and load one period.
    async fn load_period(
        &self,
        loader: &BulkLoader<'a, W>,
        gate: &QualityGate,
        resolver: &FactResolver<'_>,
        period: &str,
        records: Vec<FlightRecord>,
        stats: &mut PipelineStats,
    ) -> Result<(), PipelineError> {
        info!(period = %period, "Processing period");

        let outcome = gate.apply(period, records)?;

        if !outcome.quarantine.is_empty() {
            let rows: Vec<_> = outcome.quarantine.iter().map(|q| q.to_row()).collect();
            loader
                .insert(QUARANTINE_TABLE, &QuarantineRecord::COLUMNS, &rows)
                .await?;
        }

        if outcome.clean.is_empty() {
            return Err(PipelineError::NoCleanRecords {
                period: period.to_string(),
            });
        }

        let resolved = resolver.resolve(period, outcome.clean)?;

        let perf_rows: Vec<_> = resolved.performance.iter().map(|f| f.to_row()).collect();
        loader
            .insert(FACT_PERFORMANCE, &PerformanceFact::COLUMNS, &perf_rows)
            .await?;

        let delay_rows: Vec<_> = resolved.delays.iter().map(|f| f.to_row()).collect();
        loader
            .insert(FACT_DELAYS, &DelayFact::COLUMNS, &delay_rows)
            .await?;

        loader
            .insert(
                DQ_METRICS,
                &QualityStats::COLUMNS,
                &[outcome.stats.to_row(period)],
            )
            .await?;

        let period_stats = PeriodStats {
            period: period.to_string(),
            records_processed: outcome.stats.total_records,
            records_quarantined: outcome.stats.records_quarantined,
            cancelled_excluded: resolved.cancelled_excluded,
            fk_misses: resolved.fk_misses,
            performance_facts: resolved.performance.len(),
            delay_facts: resolved.delays.len(),
        };
        stats.performance_facts += period_stats.performance_facts;
        stats.delay_facts += period_stats.delay_facts;
        stats.records_processed += period_stats.records_processed;
        stats.records_quarantined += period_stats.records_quarantined;
        stats.cancelled_excluded += period_stats.cancelled_excluded;
        stats.fk_misses += period_stats.fk_misses;

        info!(
            period = %period,
            loaded = period_stats.performance_facts,
            quarantined = period_stats.records_quarantined,
            "Period completed"
        );
        stats.periods.push(period_stats);
        Ok(())
    }

    /// Load any prior checkpoint for visibility, then start a fresh one.
    fn init_checkpoint(&self) -> Result<Option<(PathBuf, RunCheckpoint)>, PipelineError> {
        let Some(path) = &self.config.checkpoint_path else {
            return Ok(None);
        };
        let path = PathBuf::from(path);

        if let Some(previous) = RunCheckpoint::load(&path)? {
            warn!(
                dimensions_loaded = previous.dimensions_loaded,
                completed_periods = ?previous.completed_periods,
                "Previous run checkpoint found; the target may already hold \
                 committed batches"
            );
        }

        let state = RunCheckpoint::new();
        state.save(&path)?;
        Ok(Some((path, state)))
    }

    fn save_checkpoint<F>(
        &self,
        checkpoint: &mut Option<(PathBuf, RunCheckpoint)>,
        update: F,
    ) -> Result<(), PipelineError>
    where
        F: FnOnce(&mut RunCheckpoint),
    {
        if let Some((path, state)) = checkpoint {
            update(state);
            state.save(path)?;
        }
        Ok(())
    }
}
