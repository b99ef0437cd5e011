//! Per-stage run checkpoint.
//!
//! Records which pipeline stages have committed (dimensions, each period)
//! so that after a fatal abort an operator can see exactly how far the run
//! got. The checkpoint is informational: dimension loads are
//! rebuild-from-scratch, so re-runs never skip stages based on it.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CheckpointError;

fn default_schema_version() -> u32 {
    1
}

/// Checkpoint state for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    /// Schema version for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Whether all three dimension tables have committed.
    #[serde(default)]
    pub dimensions_loaded: bool,
    /// Periods whose fact load has fully committed, in load order.
    #[serde(default)]
    pub completed_periods: Vec<String>,
    /// Unix timestamp of the last checkpoint update.
    #[serde(default)]
    pub last_update_ts: i64,
}

impl RunCheckpoint {
    pub fn new() -> Self {
        Self {
            schema_version: default_schema_version(),
            ..Self::default()
        }
    }

    /// Record that the dimension stage committed.
    pub fn mark_dimensions_loaded(&mut self) {
        self.dimensions_loaded = true;
        self.touch();
    }

    /// Record that one period's fact load committed.
    pub fn mark_period_loaded(&mut self, period: &str) {
        if !self.completed_periods.iter().any(|p| p == period) {
            self.completed_periods.push(period.to_string());
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.last_update_ts = Utc::now().timestamp();
    }

    /// Load a checkpoint file if one exists.
    pub fn load(path: &Path) -> Result<Option<Self>, CheckpointError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(path).map_err(|source| CheckpointError::CheckpointIo { source })?;
        let state = serde_json::from_str(&contents)
            .map_err(|source| CheckpointError::CheckpointSerde { source })?;
        debug!(path = %path.display(), "Loaded run checkpoint");
        Ok(Some(state))
    }

    /// Persist the checkpoint.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|source| CheckpointError::CheckpointSerde { source })?;
        std::fs::write(path, contents).map_err(|source| CheckpointError::CheckpointIo { source })?;
        debug!(path = %path.display(), "Saved run checkpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = RunCheckpoint::new();
        checkpoint.mark_dimensions_loaded();
        checkpoint.mark_period_loaded("Q1");
        checkpoint.mark_period_loaded("Q2");
        checkpoint.save(&path).unwrap();

        let restored = RunCheckpoint::load(&path).unwrap().unwrap();
        assert_eq!(restored.schema_version, 1);
        assert!(restored.dimensions_loaded);
        assert_eq!(restored.completed_periods, vec!["Q1", "Q2"]);
        assert!(restored.last_update_ts > 0);
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(RunCheckpoint::load(&path).unwrap(), None);
    }

    #[test]
    fn test_marking_a_period_twice_records_it_once() {
        let mut checkpoint = RunCheckpoint::new();
        checkpoint.mark_period_loaded("Q1");
        checkpoint.mark_period_loaded("Q1");
        assert_eq!(checkpoint.completed_periods, vec!["Q1"]);
    }
}
