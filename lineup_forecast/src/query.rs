//! Filtering, calendar aggregation and hierarchy listings over the unified series

use crate::data::TimeSeriesStore;
use crate::reconcile::UnifiedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Equality predicates over the hierarchy fields; `None` leaves a field unconstrained
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyFilter {
    pub profile: Option<String>,
    pub line_item: Option<String>,
    pub body: Option<String>,
    pub site: Option<String>,
    pub lineup: Option<String>,
}

impl HierarchyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    pub fn line_item(mut self, line_item: &str) -> Self {
        self.line_item = Some(line_item.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn site(mut self, site: &str) -> Self {
        self.site = Some(site.to_string());
        self
    }

    pub fn lineup(mut self, lineup: &str) -> Self {
        self.lineup = Some(lineup.to_string());
        self
    }

    /// Whether no predicate is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether a record satisfies every supplied predicate
    pub fn matches(&self, record: &UnifiedRecord) -> bool {
        let attrs = &record.attributes;
        field_matches(&self.profile, Some(&attrs.profile))
            && field_matches(&self.line_item, Some(&attrs.line_item))
            && field_matches(&self.body, attrs.body.as_ref())
            && field_matches(&self.site, Some(&attrs.site))
            && field_matches(&self.lineup, Some(&attrs.lineup))
    }
}

fn field_matches(wanted: &Option<String>, actual: Option<&String>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

/// Filtered records together with the filter that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    pub applied: HierarchyFilter,
    pub records: Vec<UnifiedRecord>,
}

/// Records matching all predicates of `filter`, in their original order
pub fn filter(records: &[UnifiedRecord], filter: &HierarchyFilter) -> FilteredView {
    FilteredView {
        applied: filter.clone(),
        records: records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect(),
    }
}

/// Measure totals of one calendar month across all lineups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub year: i32,
    pub month: u32,
    pub actual: Option<f64>,
    pub plan: Option<f64>,
    pub forecast: Option<f64>,
    pub synthetic_actual: Option<f64>,
}

impl PeriodSummary {
    fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            actual: None,
            plan: None,
            forecast: None,
            synthetic_actual: None,
        }
    }

    fn add(&mut self, record: &UnifiedRecord) {
        accumulate(&mut self.actual, record.actual);
        accumulate(&mut self.plan, record.plan);
        accumulate(&mut self.forecast, record.forecast);
        accumulate(&mut self.synthetic_actual, record.synthetic_actual);
    }
}

/// Absent values are skipped; the total stays `None` until one value is present
fn accumulate(total: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *total = Some(total.unwrap_or(0.0) + v);
    }
}

/// Totals per (year, month), chronologically ordered
pub fn yearly_summary(records: &[UnifiedRecord]) -> Vec<PeriodSummary> {
    let mut cells: BTreeMap<(i32, u32), PeriodSummary> = BTreeMap::new();
    for record in records {
        let key = (record.year(), record.month());
        cells
            .entry(key)
            .or_insert_with(|| PeriodSummary::new(key.0, key.1))
            .add(record);
    }
    cells.into_values().collect()
}

/// Profile → Line_Item → Site → lineups in first-seen order
pub type Hierarchy = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

/// Hierarchy of every lineup with historical observations
pub fn hierarchy(store: &TimeSeriesStore) -> Hierarchy {
    let mut tree = Hierarchy::new();
    for attrs in store.entities() {
        let lineups = tree
            .entry(attrs.profile.clone())
            .or_default()
            .entry(attrs.line_item.clone())
            .or_default()
            .entry(attrs.site.clone())
            .or_default();
        if !lineups.contains(&attrs.lineup) {
            lineups.push(attrs.lineup.clone());
        }
    }
    tree
}

/// Distinct values of each hierarchy field, for populating filter choices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyOptions {
    pub profiles: Vec<String>,
    pub line_items: Vec<String>,
    pub bodies: Vec<String>,
    pub sites: Vec<String>,
    pub lineups: Vec<String>,
}

/// Sorted distinct non-empty values of each hierarchy field
pub fn hierarchy_options(records: &[UnifiedRecord]) -> HierarchyOptions {
    let mut profiles = BTreeSet::new();
    let mut line_items = BTreeSet::new();
    let mut bodies = BTreeSet::new();
    let mut sites = BTreeSet::new();
    let mut lineups = BTreeSet::new();

    for record in records {
        let attrs = &record.attributes;
        insert_present(&mut profiles, Some(&attrs.profile));
        insert_present(&mut line_items, Some(&attrs.line_item));
        insert_present(&mut bodies, attrs.body.as_ref());
        insert_present(&mut sites, Some(&attrs.site));
        insert_present(&mut lineups, Some(&attrs.lineup));
    }

    HierarchyOptions {
        profiles: profiles.into_iter().collect(),
        line_items: line_items.into_iter().collect(),
        bodies: bodies.into_iter().collect(),
        sites: sites.into_iter().collect(),
        lineups: lineups.into_iter().collect(),
    }
}

fn insert_present(set: &mut BTreeSet<String>, value: Option<&String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        set.insert(v.clone());
    }
}
