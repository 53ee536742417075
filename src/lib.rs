//! # Lineup Forecast Workspace
//!
//! Facade over the workspace crates:
//!
//! - [`forecast_math`]: descriptive statistics, Holt linear smoothing and ARIMA
//! - [`lineup_forecast`]: the forecasting and reconciliation pipeline
//!
//! ## Example
//!
//! ```
//! use lineup_forecast_workspace::lineup_forecast::{
//!     utils, EntityAttributes, ForecastConfig, ForecastService, ObservationRow, TimeSeriesStore,
//! };
//!
//! let attrs = EntityAttributes::new("Ops", "Staffing", "Site1", "L1");
//! let date = utils::parse_month("01-03-2024").unwrap();
//! let store = TimeSeriesStore::from_rows(vec![ObservationRow::new(attrs, date, 50.0)], vec![]);
//!
//! let service = ForecastService::new(store, ForecastConfig::default()).unwrap();
//! let summary = service.generate().unwrap();
//! assert_eq!(summary.total_forecast_points, 12);
//! ```

pub use forecast_math;
pub use lineup_forecast;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        assert_eq!(lineup_forecast::NAME, "lineup_forecast");
        let model = forecast_math::HoltLinear::new();
        assert_eq!(forecast_math::ForecastModel::name(&model), "Holt Linear (additive trend)");
    }
}
