//! Per-day storage of issued forecasts and their evaluations.
//!
//! Records are held in memory and optionally mirrored to flat JSON files,
//! one file per day and kind: `forecasts_YYYYMMDD.json` and
//! `evaluations_YYYYMMDD.json`.

use crate::types::{EvaluationRecord, ForecastRecord};
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const FORECASTS_PREFIX: &str = "forecasts";
const EVALUATIONS_PREFIX: &str = "evaluations";

/// Forecast store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No {kind} stored for {date}")]
    NotFound { kind: &'static str, date: NaiveDate },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Store for daily forecasts and evaluations.
#[derive(Default)]
pub struct ForecastStore {
    forecasts: DashMap<NaiveDate, Vec<ForecastRecord>>,
    evaluations: DashMap<NaiveDate, Vec<EvaluationRecord>>,
    /// Persistence directory; memory-only when None.
    dir: Option<PathBuf>,
}

impl ForecastStore {
    /// Memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store persisting to `dir`, created if missing.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir: Some(dir),
            ..Self::default()
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Record a day's forecasts, replacing any previous set for that day.
    pub fn save_forecasts(
        &self,
        date: NaiveDate,
        forecasts: Vec<ForecastRecord>,
    ) -> Result<(), StoreError> {
        if let Some(path) = self.file_path(FORECASTS_PREFIX, date) {
            write_json(&path, &forecasts)?;
            info!("Saved {} forecasts to {}", forecasts.len(), path.display());
        }
        self.forecasts.insert(date, forecasts);
        Ok(())
    }

    /// Forecasts for a day, falling back to disk when not in memory.
    pub fn forecasts(&self, date: NaiveDate) -> Result<Vec<ForecastRecord>, StoreError> {
        if let Some(records) = self.forecasts.get(&date) {
            return Ok(records.clone());
        }

        let records: Vec<ForecastRecord> = self.load(FORECASTS_PREFIX, date)?;
        self.forecasts.insert(date, records.clone());
        Ok(records)
    }

    /// Record a day's evaluations, replacing any previous set for that day.
    pub fn save_evaluations(
        &self,
        date: NaiveDate,
        evaluations: Vec<EvaluationRecord>,
    ) -> Result<(), StoreError> {
        if let Some(path) = self.file_path(EVALUATIONS_PREFIX, date) {
            write_json(&path, &evaluations)?;
            info!("Saved {} evaluations to {}", evaluations.len(), path.display());
        }
        self.evaluations.insert(date, evaluations);
        Ok(())
    }

    /// Evaluations for a day, falling back to disk when not in memory.
    pub fn evaluations(&self, date: NaiveDate) -> Result<Vec<EvaluationRecord>, StoreError> {
        if let Some(records) = self.evaluations.get(&date) {
            return Ok(records.clone());
        }

        let records: Vec<EvaluationRecord> = self.load(EVALUATIONS_PREFIX, date)?;
        self.evaluations.insert(date, records.clone());
        Ok(records)
    }

    /// Days with forecasts held in memory, oldest first.
    pub fn forecast_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.forecasts.iter().map(|e| *e.key()).collect();
        dates.sort();
        dates
    }

    fn file_path(&self, prefix: &str, date: NaiveDate) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}_{}.json", prefix, date.format("%Y%m%d"))))
    }

    fn load<T: DeserializeOwned>(
        &self,
        prefix: &'static str,
        date: NaiveDate,
    ) -> Result<T, StoreError> {
        let not_found = StoreError::NotFound { kind: prefix, date };
        let Some(path) = self.file_path(prefix, date) else {
            return Err(not_found);
        };
        if !path.exists() {
            return Err(not_found);
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded {} from {}", prefix, path.display());
        serde_json::from_str(&content).map_err(|source| StoreError::Json { path, source })
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(data).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
