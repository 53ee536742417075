//! Historical observation storage and loading

use crate::error::{ForecastError, Result};
use crate::utils;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which historical measure an observation carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureKind {
    Actual,
    Plan,
}

impl MeasureKind {
    /// Name of the value column in input files
    pub fn column(&self) -> &'static str {
        match self {
            MeasureKind::Actual => "Actual",
            MeasureKind::Plan => "Plan",
        }
    }
}

/// Hierarchy path and descriptive attributes of a lineup.
///
/// Profile, Line_Item, Site and Lineup form the hierarchy; the optional
/// fields are carried along for display only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EntityAttributes {
    #[serde(rename = "Profile")]
    pub profile: String,
    #[serde(rename = "Line_Item")]
    pub line_item: String,
    #[serde(rename = "Budget Unit")]
    pub budget_unit: Option<String>,
    #[serde(rename = "Token")]
    pub token: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "Site")]
    pub site: String,
    #[serde(rename = "Lineup")]
    pub lineup: String,
    #[serde(rename = "Institutions")]
    pub institutions: Option<String>,
}

impl EntityAttributes {
    /// Attributes with only the hierarchy path set
    pub fn new(profile: &str, line_item: &str, site: &str, lineup: &str) -> Self {
        Self {
            profile: profile.to_string(),
            line_item: line_item.to_string(),
            site: site.to_string(),
            lineup: lineup.to_string(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the body
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// A validated input row as supplied by ingestion: attributes, month and value
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub attributes: EntityAttributes,
    pub date: NaiveDate,
    pub value: f64,
}

impl ObservationRow {
    /// Create a row, normalising the date to the first of its month
    pub fn new(attributes: EntityAttributes, date: NaiveDate, value: f64) -> Self {
        Self {
            attributes,
            date: utils::first_of_month(date),
            value,
        }
    }
}

/// A single historical observation of one lineup
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub lineup: String,
    pub date: NaiveDate,
    pub kind: MeasureKind,
    pub value: f64,
}

/// Inclusive date range of a set of observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Row counts and coverage of one measure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureSummary {
    pub rows: usize,
    pub date_range: Option<DateRange>,
    pub unique_lineups: usize,
    pub unique_profiles: usize,
}

/// Summary of the loaded historical data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub sample_data: MeasureSummary,
    pub plan_data: MeasureSummary,
}

/// In-memory store of historical actual and plan observations.
///
/// Lineups keep the order in which they first appear (actuals before plans)
/// and a single attribute set taken from their first row. The store is
/// read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    entities: Vec<Arc<EntityAttributes>>,
    index: HashMap<String, usize>,
    observations: Vec<Observation>,
    /// Observation indices per entity, in load order
    by_entity: Vec<Vec<usize>>,
}

impl TimeSeriesStore {
    /// Build a store from actual and plan rows
    pub fn from_rows(actuals: Vec<ObservationRow>, plans: Vec<ObservationRow>) -> Self {
        let mut store = Self::default();
        let mut seen: HashSet<(usize, MeasureKind, NaiveDate)> = HashSet::new();

        let tagged = actuals
            .into_iter()
            .map(|row| (MeasureKind::Actual, row))
            .chain(plans.into_iter().map(|row| (MeasureKind::Plan, row)));

        for (kind, row) in tagged {
            let entity = store.intern(row.attributes);
            let date = utils::first_of_month(row.date);

            if !seen.insert((entity, kind, date)) {
                warn!(
                    lineup = %store.entities[entity].lineup,
                    %date,
                    measure = kind.column(),
                    "duplicate observation ignored"
                );
                continue;
            }

            store.by_entity[entity].push(store.observations.len());
            store.observations.push(Observation {
                lineup: store.entities[entity].lineup.clone(),
                date,
                kind,
                value: row.value,
            });
        }

        info!(
            lineups = store.entities.len(),
            observations = store.observations.len(),
            "time series store built"
        );
        store
    }

    fn intern(&mut self, attributes: EntityAttributes) -> usize {
        if let Some(&idx) = self.index.get(&attributes.lineup) {
            if *self.entities[idx] != attributes {
                debug!(lineup = %attributes.lineup, "attributes differ from first row; keeping first");
            }
            return idx;
        }

        let idx = self.entities.len();
        self.index.insert(attributes.lineup.clone(), idx);
        self.entities.push(Arc::new(attributes));
        self.by_entity.push(Vec::new());
        idx
    }

    /// Lineup attributes in first-appearance order
    pub fn entities(&self) -> &[Arc<EntityAttributes>] {
        &self.entities
    }

    /// Attributes of one lineup
    pub fn entity(&self, lineup: &str) -> Option<&Arc<EntityAttributes>> {
        self.index.get(lineup).map(|&idx| &self.entities[idx])
    }

    /// All observations in load order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Observations of one lineup in load order
    pub fn entity_observations<'a>(&'a self, lineup: &str) -> impl Iterator<Item = &'a Observation> + 'a {
        let indices: &'a [usize] = self
            .index
            .get(lineup)
            .map(|&idx| self.by_entity[idx].as_slice())
            .unwrap_or(&[]);
        indices.iter().map(move |&i| &self.observations[i])
    }

    /// One measure of one lineup as a date-ordered series
    pub fn series(&self, lineup: &str, kind: MeasureKind) -> Vec<(NaiveDate, f64)> {
        let mut series: Vec<(NaiveDate, f64)> = self
            .entity_observations(lineup)
            .filter(|obs| obs.kind == kind)
            .map(|obs| (obs.date, obs.value))
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    }

    /// Latest observation date across both measures
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|obs| obs.date).max()
    }

    /// Number of stored observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the store holds no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Row counts, date ranges and distinct lineups per measure
    pub fn summary(&self) -> DataSummary {
        DataSummary {
            sample_data: self.measure_summary(MeasureKind::Actual),
            plan_data: self.measure_summary(MeasureKind::Plan),
        }
    }

    fn measure_summary(&self, kind: MeasureKind) -> MeasureSummary {
        let rows: Vec<&Observation> = self.observations.iter().filter(|o| o.kind == kind).collect();

        let date_range = rows
            .iter()
            .map(|o| o.date)
            .min()
            .zip(rows.iter().map(|o| o.date).max())
            .map(|(start, end)| DateRange { start, end });

        let lineups: HashSet<&str> = rows.iter().map(|o| o.lineup.as_str()).collect();
        let profiles: HashSet<&str> = lineups
            .iter()
            .filter_map(|lineup| self.entity(lineup))
            .map(|attrs| attrs.profile.as_str())
            .collect();

        MeasureSummary {
            rows: rows.len(),
            date_range,
            unique_lineups: lineups.len(),
            unique_profiles: profiles.len(),
        }
    }
}

/// Row as it appears in the historical CSV files
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Profile", default)]
    profile: Option<String>,
    #[serde(rename = "Line_Item", default)]
    line_item: Option<String>,
    #[serde(rename = "Budget Unit", default)]
    budget_unit: Option<String>,
    #[serde(rename = "Token", default)]
    token: Option<String>,
    #[serde(rename = "Body", default)]
    body: Option<String>,
    #[serde(rename = "Site", default)]
    site: Option<String>,
    #[serde(rename = "Lineup", default)]
    lineup: Option<String>,
    #[serde(rename = "Institutions", default)]
    institutions: Option<String>,
    #[serde(rename = "DATE", default)]
    date: Option<String>,
    #[serde(
        rename = "Actual",
        alias = "Plan",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    value: Option<f64>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl CsvRow {
    /// Convert to a validated row; `None` when lineup, date or value is missing
    fn into_observation(self) -> Option<ObservationRow> {
        let lineup = non_empty(self.lineup)?;
        let value = self.value.filter(|v| v.is_finite())?;
        let date = match non_empty(self.date).map(|d| utils::parse_month(&d)) {
            Some(Ok(date)) => date,
            Some(Err(err)) => {
                warn!(%lineup, error = %err, "row skipped");
                return None;
            }
            None => return None,
        };

        let attributes = EntityAttributes {
            profile: non_empty(self.profile).unwrap_or_default(),
            line_item: non_empty(self.line_item).unwrap_or_default(),
            budget_unit: non_empty(self.budget_unit),
            token: non_empty(self.token),
            body: non_empty(self.body),
            site: non_empty(self.site).unwrap_or_default(),
            lineup,
            institutions: non_empty(self.institutions),
        };

        Some(ObservationRow::new(attributes, date, value))
    }
}

/// Data loader for the historical actual and plan files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load rows of one measure from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, kind: MeasureKind) -> Result<Vec<ObservationRow>> {
        let file = File::open(path)?;
        Self::from_reader(file, kind)
    }

    /// Load rows of one measure from any CSV source
    pub fn from_reader<R: Read>(reader: R, kind: MeasureKind) -> Result<Vec<ObservationRow>> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for required in ["Lineup", "DATE", kind.column()] {
            if !headers.iter().any(|h| h == required) {
                return Err(ForecastError::DataError(format!(
                    "Missing required column: {}",
                    required
                )));
            }
        }

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.deserialize::<CsvRow>() {
            match record?.into_observation() {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        debug!(measure = kind.column(), rows = rows.len(), skipped, "csv loaded");
        Ok(rows)
    }

    /// Load both historical files into a store
    pub fn load_store<P: AsRef<Path>, Q: AsRef<Path>>(
        actuals: P,
        plans: Q,
    ) -> Result<TimeSeriesStore> {
        let actual_rows = Self::from_csv(actuals, MeasureKind::Actual)?;
        let plan_rows = Self::from_csv(plans, MeasureKind::Plan)?;
        Ok(TimeSeriesStore::from_rows(actual_rows, plan_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn row(lineup: &str, profile: &str, d: NaiveDate, value: f64) -> ObservationRow {
        ObservationRow::new(EntityAttributes::new(profile, "LI", "S1", lineup), d, value)
    }

    #[test]
    fn test_first_row_attributes_win() {
        let store = TimeSeriesStore::from_rows(
            vec![row("L1", "P1", date(2023, 1), 1.0), row("L1", "P2", date(2023, 2), 2.0)],
            vec![],
        );
        assert_eq!(store.entities().len(), 1);
        assert_eq!(store.entity("L1").unwrap().profile, "P1");
    }

    #[test]
    fn test_series_sorted_and_split_by_measure() {
        let store = TimeSeriesStore::from_rows(
            vec![row("L1", "P", date(2023, 3), 3.0), row("L1", "P", date(2023, 1), 1.0)],
            vec![row("L1", "P", date(2023, 2), 20.0)],
        );

        let actual = store.series("L1", MeasureKind::Actual);
        assert_eq!(actual, vec![(date(2023, 1), 1.0), (date(2023, 3), 3.0)]);
        assert_eq!(store.series("L1", MeasureKind::Plan), vec![(date(2023, 2), 20.0)]);
        assert!(store.series("missing", MeasureKind::Actual).is_empty());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 17).unwrap();
        let store = TimeSeriesStore::from_rows(
            vec![row("L1", "P", date(2023, 1), 1.0), row("L1", "P", d, 9.0)],
            vec![],
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.observations()[0].value, 1.0);
    }

    #[test]
    fn test_summary() {
        let store = TimeSeriesStore::from_rows(
            vec![
                row("L1", "P1", date(2022, 5), 1.0),
                row("L2", "P2", date(2023, 7), 2.0),
            ],
            vec![row("L1", "P1", date(2024, 1), 3.0)],
        );

        let summary = store.summary();
        assert_eq!(summary.sample_data.rows, 2);
        assert_eq!(summary.sample_data.unique_lineups, 2);
        assert_eq!(summary.sample_data.unique_profiles, 2);
        assert_eq!(
            summary.sample_data.date_range,
            Some(DateRange { start: date(2022, 5), end: date(2023, 7) })
        );
        assert_eq!(summary.plan_data.rows, 1);
        assert_eq!(store.latest_date(), Some(date(2024, 1)));
    }

    #[test]
    fn test_loader_skips_incomplete_rows() {
        let csv = "\
Profile,Line_Item,Budget Unit,Token,Body,Site,Lineup,Institutions,DATE,Actual
P1,LI1,BU,7,B1,S1,L1,Inst,01-01-2023,100
P1,LI1,BU,7,B1,S1,L1,Inst,01-02-2023,
P1,LI1,BU,7,B1,S1,,Inst,01-03-2023,5
P1,LI1,BU,7,B1,S1,L1,Inst,,5
P1,LI1,,7,,S1,L2,,2023-04-15,42.5
";
        let rows = DataLoader::from_reader(csv.as_bytes(), MeasureKind::Actual).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].attributes.token.as_deref(), Some("7"));
        assert_eq!(rows[1].date, date(2023, 4));
        assert_eq!(rows[1].attributes.body, None);
        assert_eq!(rows[1].value, 42.5);
    }

    #[test]
    fn test_loader_requires_columns() {
        let csv = "Lineup,DATE,Plan\nL1,01-01-2023,4\n";
        let result = DataLoader::from_reader(csv.as_bytes(), MeasureKind::Actual);
        assert!(matches!(result, Err(ForecastError::DataError(_))));

        let plans = DataLoader::from_reader(csv.as_bytes(), MeasureKind::Plan).unwrap();
        assert_eq!(plans.len(), 1);
    }
}
