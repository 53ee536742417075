//! Merge of actual, plan, forecast and synthetic-actual series
//!
//! The output has exactly one record per (lineup, month). Lineups keep the
//! order in which the store first saw them and months ascend within a lineup.
//! A measure that does not apply to a record is `None`, never zero.

use crate::data::{EntityAttributes, MeasureKind, TimeSeriesStore};
use crate::pipeline::ForecastPoint;
use crate::seasonal::SyntheticActual;
use crate::utils;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

/// One month of one lineup with every measure that applies to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    #[serde(flatten)]
    pub attributes: Arc<EntityAttributes>,
    #[serde(rename = "DATE")]
    pub date: NaiveDate,
    #[serde(rename = "Actual")]
    pub actual: Option<f64>,
    #[serde(rename = "Plan")]
    pub plan: Option<f64>,
    #[serde(rename = "Forecast")]
    pub forecast: Option<f64>,
    #[serde(rename = "Synthetic_Actual")]
    pub synthetic_actual: Option<f64>,
}

impl UnifiedRecord {
    fn empty(attributes: Arc<EntityAttributes>, date: NaiveDate) -> Self {
        Self {
            attributes,
            date,
            actual: None,
            plan: None,
            forecast: None,
            synthetic_actual: None,
        }
    }

    /// Lineup the record belongs to
    pub fn lineup(&self) -> &str {
        &self.attributes.lineup
    }

    /// Whether the record is a generated forecast month
    pub fn is_forecast(&self) -> bool {
        self.forecast.is_some()
    }

    /// Calendar year of the record
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Calendar month of the record, 1 = January
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Merge historical observations with a forecast run into one series
pub fn reconcile(
    store: &TimeSeriesStore,
    forecasts: &[ForecastPoint],
    synthetic: &[SyntheticActual],
) -> Vec<UnifiedRecord> {
    let positions: HashMap<&str, usize> = store
        .entities()
        .iter()
        .enumerate()
        .map(|(i, attrs)| (attrs.lineup.as_str(), i))
        .collect();

    let mut rows: Vec<BTreeMap<NaiveDate, UnifiedRecord>> =
        vec![BTreeMap::new(); store.entities().len()];

    for obs in store.observations() {
        let Some(&entity) = positions.get(obs.lineup.as_str()) else {
            continue;
        };
        let record = slot(&mut rows, store, entity, obs.date);
        match obs.kind {
            MeasureKind::Actual => record.actual = Some(obs.value),
            MeasureKind::Plan => record.plan = Some(obs.value),
        }
    }

    let seasonal: HashMap<(&str, u32), f64> = synthetic
        .iter()
        .map(|s| ((s.lineup.as_str(), s.month), s.value))
        .collect();

    for point in forecasts {
        let Some(&entity) = positions.get(point.lineup.as_str()) else {
            warn!(lineup = %point.lineup, "forecast for unknown lineup dropped");
            continue;
        };
        let date = utils::first_of_month(point.date);
        let record = slot(&mut rows, store, entity, date);
        record.forecast = Some(point.forecast_value);
        record.synthetic_actual = seasonal
            .get(&(point.lineup.as_str(), date.month()))
            .copied();
    }

    rows.into_iter().flat_map(BTreeMap::into_values).collect()
}

/// Record of an entity for a month, created empty on first use
fn slot<'a>(
    rows: &'a mut [BTreeMap<NaiveDate, UnifiedRecord>],
    store: &TimeSeriesStore,
    entity: usize,
    date: NaiveDate,
) -> &'a mut UnifiedRecord {
    let attributes = &store.entities()[entity];
    rows[entity]
        .entry(date)
        .or_insert_with(|| UnifiedRecord::empty(Arc::clone(attributes), date))
}
