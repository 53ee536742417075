//! Forecast generation runs and the queries served from their results
//!
//! Historical data is loaded once and never changes. Each generation run
//! builds a complete [`ForecastSnapshot`] off to the side and then swaps it in
//! under a write lock, so readers see either the previous run or the new one.

use crate::backtest::BacktestEvaluator;
use crate::config::ForecastConfig;
use crate::data::{DataSummary, TimeSeriesStore};
use crate::error::{ForecastError, Result};
use crate::export;
use crate::metrics::AccuracyReport;
use crate::pipeline::{self, ForecastPoint, LineupForecast};
use crate::query::{self, FilteredView, Hierarchy, HierarchyFilter, HierarchyOptions, PeriodSummary};
use crate::reconcile::{self, UnifiedRecord};
use crate::seasonal::SyntheticActual;
use crate::utils;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Derived state of one successful generation run
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub forecast_year: i32,
    pub points: Vec<ForecastPoint>,
    pub reports: Vec<AccuracyReport>,
    pub synthetic: Vec<SyntheticActual>,
    pub unified: Vec<UnifiedRecord>,
}

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub total_forecast_points: usize,
    pub lineups_forecast: usize,
    pub lineups_skipped: usize,
    pub forecast_period: String,
}

/// Owns the historical store and the latest forecast snapshot
#[derive(Debug)]
pub struct ForecastService {
    store: Arc<TimeSeriesStore>,
    config: ForecastConfig,
    snapshot: RwLock<Option<Arc<ForecastSnapshot>>>,
}

impl ForecastService {
    /// Create a service over a loaded store
    pub fn new(store: TimeSeriesStore, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(store),
            config,
            snapshot: RwLock::new(None),
        })
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast every lineup and replace the current snapshot
    pub fn generate(&self) -> Result<GenerationSummary> {
        let started = Instant::now();
        let evaluator = BacktestEvaluator::from_config(&self.config)?;
        let year = pipeline::resolve_forecast_year(&self.store, self.config.forecast_year)?;
        let months = utils::forecast_months(year, self.config.horizon)?;
        pipeline::ensure_future_months(&self.store, &months)?;

        let lineups: Vec<&str> = self
            .store
            .entities()
            .iter()
            .map(|attrs| attrs.lineup.as_str())
            .collect();

        let run = |lineup: &&str| {
            pipeline::forecast_lineup(&self.store, &evaluator, lineup, &months)
                .map_err(|err| (lineup.to_string(), err))
        };
        let results: Vec<std::result::Result<LineupForecast, (String, ForecastError)>> =
            if self.config.parallel {
                lineups.par_iter().map(run).collect()
            } else {
                lineups.iter().map(run).collect()
            };

        let mut points = Vec::new();
        let mut reports = Vec::new();
        let mut synthetic = Vec::new();
        let mut skipped = 0usize;

        for result in results {
            match result {
                Ok(forecast) => {
                    points.extend(forecast.points);
                    reports.push(forecast.report);
                    synthetic.extend(forecast.synthetic);
                }
                Err((lineup, err)) => {
                    warn!(%lineup, error = %err, "lineup skipped");
                    skipped += 1;
                }
            }
        }

        if reports.is_empty() {
            return Err(ForecastError::NoForecastsProduced {
                attempted: lineups.len(),
            });
        }

        let unified = reconcile::reconcile(&self.store, &points, &synthetic);
        let summary = GenerationSummary {
            total_forecast_points: points.len(),
            lineups_forecast: reports.len(),
            lineups_skipped: skipped,
            forecast_period: period_label(&months),
        };

        *self.snapshot.write() = Some(Arc::new(ForecastSnapshot {
            forecast_year: year,
            points,
            reports,
            synthetic,
            unified,
        }));

        info!(
            lineups = summary.lineups_forecast,
            skipped = summary.lineups_skipped,
            points = summary.total_forecast_points,
            period = %summary.forecast_period,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast generation complete"
        );
        Ok(summary)
    }

    /// Latest snapshot; fails until a generation run has succeeded
    pub fn snapshot(&self) -> Result<Arc<ForecastSnapshot>> {
        self.snapshot
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(ForecastError::StateNotReady)
    }

    /// Whether a generation run has succeeded
    pub fn is_ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn unified_data(&self) -> Result<Vec<UnifiedRecord>> {
        Ok(self.snapshot()?.unified.clone())
    }

    /// Unified records of one lineup
    pub fn lineup_data(&self, lineup: &str) -> Result<Vec<UnifiedRecord>> {
        let snapshot = self.snapshot()?;
        let records: Vec<UnifiedRecord> = snapshot
            .unified
            .iter()
            .filter(|r| r.lineup() == lineup)
            .cloned()
            .collect();

        if records.is_empty() {
            return Err(ForecastError::EntityNotFound(lineup.to_string()));
        }
        Ok(records)
    }

    pub fn filtered(&self, filter: &HierarchyFilter) -> Result<FilteredView> {
        Ok(query::filter(&self.snapshot()?.unified, filter))
    }

    pub fn yearly_summary(&self) -> Result<Vec<PeriodSummary>> {
        Ok(query::yearly_summary(&self.snapshot()?.unified))
    }

    /// Hierarchy of the historical data; needs no generation run
    pub fn hierarchy(&self) -> Hierarchy {
        query::hierarchy(&self.store)
    }

    pub fn hierarchy_options(&self) -> Result<HierarchyOptions> {
        Ok(query::hierarchy_options(&self.snapshot()?.unified))
    }

    pub fn accuracy_reports(&self) -> Result<Vec<AccuracyReport>> {
        Ok(self.snapshot()?.reports.clone())
    }

    /// Backtest diagnostics of one lineup
    pub fn accuracy_report(&self, lineup: &str) -> Result<AccuracyReport> {
        self.snapshot()?
            .reports
            .iter()
            .find(|r| r.lineup == lineup)
            .cloned()
            .ok_or_else(|| ForecastError::EntityNotFound(lineup.to_string()))
    }

    pub fn data_summary(&self) -> DataSummary {
        self.store.summary()
    }

    /// Write the unified data as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        export::write_csv(&self.snapshot()?.unified, writer)
    }

    /// Write the unified data as CSV to a file
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export::export_csv(&self.snapshot()?.unified, path)
    }
}

fn period_label(months: &[NaiveDate]) -> String {
    match (months.first(), months.last()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format("%Y-%m"),
            last.format("%Y-%m")
        ),
        _ => String::new(),
    }
}
