use approx::assert_abs_diff_eq;
use lineup_forecast::{
    DataLoader, ForecastConfig, ForecastError, ForecastService, HierarchyFilter, ModelType,
    RiskLevel, UnifiedRecord,
};
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "Profile,Line_Item,Budget Unit,Token,Body,Site,Lineup,Institutions,DATE";

// 24 months of rising actuals for TREND, a single observation for SOLO
fn create_actuals() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{},Actual", HEADER).unwrap();
    for i in 0..24 {
        let year = 2023 + i / 12;
        let month = i % 12 + 1;
        writeln!(
            file,
            "Ops,Staffing,BU1,11,North,Site1,TREND,Inst,01-{:02}-{},{}",
            month,
            year,
            100 + i
        )
        .unwrap();
    }
    writeln!(file, "Ops,Staffing,BU1,12,South,Site2,SOLO,Inst,01-06-2024,50").unwrap();
    file
}

fn create_plans() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{},Plan", HEADER).unwrap();
    writeln!(file, "Ops,Staffing,BU1,11,North,Site1,TREND,Inst,01-03-2024,140").unwrap();
    writeln!(file, "Fin,Audit,BU2,13,,Site3,PLANONLY,Inst,01-01-2024,75").unwrap();
    file
}

fn service() -> ForecastService {
    let actuals = create_actuals();
    let plans = create_plans();
    let store = DataLoader::load_store(actuals.path(), plans.path()).unwrap();
    ForecastService::new(store, ForecastConfig::default()).unwrap()
}

fn forecast_rows(records: &[UnifiedRecord]) -> Vec<&UnifiedRecord> {
    records.iter().filter(|r| r.is_forecast()).collect()
}

#[test]
fn test_trend_lineup_end_to_end() {
    let svc = service();
    let summary = svc.generate().unwrap();
    assert_eq!(summary.lineups_forecast, 2);
    assert_eq!(summary.lineups_skipped, 1);
    assert_eq!(summary.total_forecast_points, 24);
    assert_eq!(summary.forecast_period, "2025-01 to 2025-12");

    let records = svc.lineup_data("TREND").unwrap();
    let forecasts = forecast_rows(&records);
    assert_eq!(forecasts.len(), 12);

    for (m, record) in forecasts.iter().enumerate() {
        assert_eq!(record.year(), 2025);
        assert_eq!(record.month(), m as u32 + 1);
        assert!(record.forecast.unwrap() >= 123.0);
        // mean of the two historical observations of this calendar month
        assert_abs_diff_eq!(
            record.synthetic_actual.unwrap(),
            106.0 + m as f64,
            epsilon = 1e-2
        );
        assert_eq!(record.actual, None);
        assert_eq!(record.plan, None);
    }

    let report = svc.accuracy_report("TREND").unwrap();
    assert!(report.is_measured);
    assert_eq!(report.risk_level, RiskLevel::Low);
    assert_eq!(report.test_point_count, 5);
}

#[test]
fn test_single_observation_lineup() {
    let svc = service();
    svc.generate().unwrap();

    let snapshot = svc.snapshot().unwrap();
    let points: Vec<_> = snapshot.points.iter().filter(|p| p.lineup == "SOLO").collect();
    assert_eq!(points.len(), 12);
    for p in &points {
        assert_eq!(p.forecast_value, 50.0);
        assert_eq!(p.model_type, ModelType::SimpleMean);
        assert_eq!(p.risk_level, RiskLevel::High);
    }

    let synthetic: Vec<f64> = snapshot
        .synthetic
        .iter()
        .filter(|s| s.lineup == "SOLO")
        .map(|s| s.value)
        .collect();
    assert_eq!(synthetic, vec![50.0; 12]);

    let report = svc.accuracy_report("SOLO").unwrap();
    assert_eq!(report.model_type, ModelType::SimpleMean);
    assert_eq!(report.mape, 0.1);
    assert!(!report.is_measured);
}

#[test]
fn test_queries_before_generation() {
    let svc = service();

    assert!(matches!(svc.unified_data(), Err(ForecastError::StateNotReady)));
    assert!(matches!(svc.lineup_data("TREND"), Err(ForecastError::StateNotReady)));
    assert!(matches!(
        svc.filtered(&HierarchyFilter::default()),
        Err(ForecastError::StateNotReady)
    ));
    assert!(matches!(svc.hierarchy_options(), Err(ForecastError::StateNotReady)));
    assert!(matches!(svc.accuracy_reports(), Err(ForecastError::StateNotReady)));

    // store-backed queries work without a run
    assert_eq!(svc.data_summary().sample_data.rows, 25);
    assert_eq!(svc.data_summary().plan_data.rows, 2);
    let tree = svc.hierarchy();
    assert_eq!(tree["Ops"]["Staffing"]["Site1"], vec!["TREND".to_string()]);
    assert_eq!(tree["Fin"]["Audit"]["Site3"], vec!["PLANONLY".to_string()]);
}

#[test]
fn test_unknown_lineup_after_generation() {
    let svc = service();
    svc.generate().unwrap();
    assert!(matches!(
        svc.lineup_data("MISSING"),
        Err(ForecastError::EntityNotFound(l)) if l == "MISSING"
    ));
}

#[test]
fn test_unified_invariants() {
    let svc = service();
    svc.generate().unwrap();
    let records = svc.unified_data().unwrap();

    let keys: HashSet<(String, chrono::NaiveDate)> = records
        .iter()
        .map(|r| (r.lineup().to_string(), r.date))
        .collect();
    assert_eq!(keys.len(), records.len());

    // lineups in first-appearance order, dates ascending within each
    let order: Vec<&str> = records.iter().map(|r| r.lineup()).fold(Vec::new(), |mut acc, l| {
        if acc.last() != Some(&l) {
            acc.push(l);
        }
        acc
    });
    assert_eq!(order, vec!["TREND", "SOLO", "PLANONLY"]);
    for pair in records.windows(2) {
        if pair[0].lineup() == pair[1].lineup() {
            assert!(pair[0].date < pair[1].date);
        }
    }

    // the plan row in March 2024 merges with the actual of the same month
    let march = records
        .iter()
        .find(|r| r.lineup() == "TREND" && r.year() == 2024 && r.month() == 3)
        .unwrap();
    assert_eq!(march.actual, Some(114.0));
    assert_eq!(march.plan, Some(140.0));
    assert_eq!(march.forecast, None);

    let plan_only: Vec<_> = records.iter().filter(|r| r.lineup() == "PLANONLY").collect();
    assert_eq!(plan_only.len(), 1);
    assert_eq!(plan_only[0].actual, None);
    assert_eq!(plan_only[0].plan, Some(75.0));

    for r in forecast_rows(&records) {
        assert!(r.forecast.unwrap() >= 0.0);
    }
}

#[test]
fn test_empty_filter_is_identity() {
    let svc = service();
    svc.generate().unwrap();

    let all = svc.unified_data().unwrap();
    let view = svc.filtered(&HierarchyFilter::default()).unwrap();
    assert_eq!(view.records.len(), all.len());
    for record in &all {
        assert!(view.records.contains(record));
    }

    let south = svc.filtered(&HierarchyFilter::new().body("South")).unwrap();
    assert_eq!(south.applied.body.as_deref(), Some("South"));
    assert!(south.records.iter().all(|r| r.lineup() == "SOLO"));
    assert_eq!(south.records.len(), 13);
}

#[test]
fn test_yearly_summary_totals() {
    let svc = service();
    svc.generate().unwrap();
    let summary = svc.yearly_summary().unwrap();

    let jan_2024 = summary
        .iter()
        .find(|s| s.year == 2024 && s.month == 1)
        .unwrap();
    assert_eq!(jan_2024.actual, Some(112.0));
    assert_eq!(jan_2024.plan, Some(75.0));
    assert_eq!(jan_2024.forecast, None);

    let jan_2025 = summary
        .iter()
        .find(|s| s.year == 2025 && s.month == 1)
        .unwrap();
    assert_eq!(jan_2025.actual, None);
    assert!(jan_2025.forecast.unwrap() >= 123.0 + 50.0);
    assert_abs_diff_eq!(jan_2025.synthetic_actual.unwrap(), 106.0 + 50.0, epsilon = 1e-2);
}

#[test]
fn test_hierarchy_options() {
    let svc = service();
    svc.generate().unwrap();
    let options = svc.hierarchy_options().unwrap();

    assert_eq!(options.profiles, vec!["Fin", "Ops"]);
    assert_eq!(options.bodies, vec!["North", "South"]);
    assert_eq!(options.lineups, vec!["PLANONLY", "SOLO", "TREND"]);
}

#[test]
fn test_regeneration_replaces_state() {
    let svc = service();
    svc.generate().unwrap();
    let first = svc.snapshot().unwrap();

    svc.generate().unwrap();
    let second = svc.snapshot().unwrap();

    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.unified, second.unified);
    assert_eq!(second.points.len(), 24);
}

#[test]
fn test_configured_year_and_horizon() {
    let actuals = create_actuals();
    let plans = create_plans();
    let store = DataLoader::load_store(actuals.path(), plans.path()).unwrap();
    let config = ForecastConfig::default()
        .with_horizon(6)
        .with_forecast_year(2030);
    let svc = ForecastService::new(store, config).unwrap();

    let summary = svc.generate().unwrap();
    assert_eq!(summary.total_forecast_points, 12);
    assert_eq!(summary.forecast_period, "2030-01 to 2030-06");
}

#[test]
fn test_no_forecasts_produced() {
    let mut plans = NamedTempFile::new().unwrap();
    writeln!(plans, "{},Plan", HEADER).unwrap();
    writeln!(plans, "Fin,Audit,BU2,13,,Site3,PLANONLY,Inst,01-01-2024,75").unwrap();
    let mut actuals = NamedTempFile::new().unwrap();
    writeln!(actuals, "{},Actual", HEADER).unwrap();

    let store = DataLoader::load_store(actuals.path(), plans.path()).unwrap();
    let svc = ForecastService::new(store, ForecastConfig::default()).unwrap();

    assert!(matches!(
        svc.generate(),
        Err(ForecastError::NoForecastsProduced { attempted: 1 })
    ));
    assert!(!svc.is_ready());
}

#[test]
fn test_forecast_rows_never_carry_history() {
    let svc = service();
    svc.generate().unwrap();

    for record in svc.unified_data().unwrap() {
        if record.is_forecast() {
            assert_eq!((record.actual, record.plan), (None, None));
            assert_eq!(record.year(), 2025);
        }
    }
}

#[test]
fn test_forecast_year_inside_history_is_rejected() {
    let actuals = create_actuals();
    let plans = create_plans();
    let store = DataLoader::load_store(actuals.path(), plans.path()).unwrap();
    let config = ForecastConfig::default().with_forecast_year(2024);
    let svc = ForecastService::new(store, config).unwrap();

    assert!(matches!(
        svc.generate(),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(svc.unified_data(), Err(ForecastError::StateNotReady)));
}
