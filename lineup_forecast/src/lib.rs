//! # Lineup Forecast
//!
//! Monthly forecasting of budget lineups from sparse historical actuals,
//! reconciled with planned figures and seasonal synthetic actuals.
//!
//! ## Features
//!
//! - In-memory store of actual and plan observations (CSV loading included)
//! - Model fallback chain: exponential smoothing, ARIMA(1,1,1), trailing mean
//! - Hold-out backtesting with RMSE/MAPE and a risk bucket per lineup
//! - Approximate 95% confidence bounds
//! - Seasonal synthetic actuals from historical monthly means
//! - One unified long-format series per lineup and month, with filtering,
//!   calendar aggregation, hierarchy listings and CSV export
//!
//! ## Quick Start
//!
//! ```no_run
//! use lineup_forecast::{DataLoader, ForecastConfig, ForecastService, HierarchyFilter};
//!
//! let store = DataLoader::load_store("sample_data.csv", "plan_data.csv")?;
//! let service = ForecastService::new(store, ForecastConfig::default())?;
//!
//! let summary = service.generate()?;
//! println!("{} forecast points", summary.total_forecast_points);
//!
//! let view = service.filtered(&HierarchyFilter::new().profile("Operations"))?;
//! for record in &view.records {
//!     println!("{} {} {:?}", record.lineup(), record.date, record.forecast);
//! }
//! # Ok::<(), lineup_forecast::ForecastError>(())
//! ```

pub mod backtest;
pub mod confidence;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod reconcile;
pub mod seasonal;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::backtest::{BacktestEvaluator, BacktestOutcome};
pub use crate::config::ForecastConfig;
pub use crate::data::{
    DataLoader, DataSummary, EntityAttributes, MeasureKind, ObservationRow, TimeSeriesStore,
};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{AccuracyReport, RiskLevel};
pub use crate::models::{ModelChain, ModelType};
pub use crate::pipeline::ForecastPoint;
pub use crate::query::{FilteredView, HierarchyFilter, HierarchyOptions, PeriodSummary};
pub use crate::reconcile::UnifiedRecord;
pub use crate::seasonal::SyntheticActual;
pub use crate::service::{ForecastService, ForecastSnapshot, GenerationSummary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
