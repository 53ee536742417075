use chrono::NaiveDate;
use lineup_forecast::export::{self, EXPORT_COLUMNS};
use lineup_forecast::{
    DataLoader, EntityAttributes, ForecastConfig, ForecastError, ForecastService, MeasureKind,
    ObservationRow, TimeSeriesStore,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Profile,Line_Item,Budget Unit,Token,Body,Site,Lineup,Institutions,DATE,Actual").unwrap();
    writeln!(file, "P1,LI1,BU1,1,B1,S1,L1,I1,01-01-2023,10.5").unwrap();
    writeln!(file, "P1,LI1,BU1,1,B1,S1,L1,I1,15-02-2023,11").unwrap();
    writeln!(file, "P1,LI1,BU1,1,B1,S1,L1,I1,not-a-date,12").unwrap();
    writeln!(file, "P1,LI1,BU1,1,B1,S1,L1,I1,01-04-2023,n/a").unwrap();

    let rows = DataLoader::from_csv(file.path(), MeasureKind::Actual).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].date, d(2023, 2));
    assert_eq!(rows[0].attributes.institutions.as_deref(), Some("I1"));
}

#[test]
fn test_missing_file() {
    let result = DataLoader::from_csv("/definitely/not/here.csv", MeasureKind::Plan);
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_store_keeps_first_attributes() {
    let first = EntityAttributes::new("P1", "LI", "S1", "L1");
    let later = EntityAttributes::new("P9", "LI", "S9", "L1");
    let store = TimeSeriesStore::from_rows(
        vec![ObservationRow::new(first, d(2023, 1), 1.0)],
        vec![ObservationRow::new(later, d(2023, 2), 2.0)],
    );

    let attrs = store.entity("L1").unwrap();
    assert_eq!(attrs.profile, "P1");
    assert_eq!(attrs.site, "S1");
    assert_eq!(store.series("L1", MeasureKind::Plan), vec![(d(2023, 2), 2.0)]);
}

#[test]
fn test_export_round_trip() {
    let attrs = EntityAttributes::new("P1", "LI", "S1", "L1");
    let rows: Vec<ObservationRow> = (1..=6)
        .map(|m| ObservationRow::new(attrs.clone(), d(2024, m), 10.0 * m as f64))
        .collect();
    let store = TimeSeriesStore::from_rows(rows, vec![]);
    let svc = ForecastService::new(store, ForecastConfig::default().with_horizon(3)).unwrap();
    svc.generate().unwrap();

    let out = NamedTempFile::new().unwrap();
    svc.export_csv(out.path()).unwrap();

    let mut rdr = csv::Reader::from_path(out.path()).unwrap();
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, EXPORT_COLUMNS);

    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 9);

    let first = &records[0];
    assert_eq!(&first[6], "L1");
    assert_eq!(&first[8], "2024-01-01");
    assert_eq!(&first[9], "10");
    assert_eq!(&first[11], "");

    let forecast = &records[6];
    assert_eq!(&forecast[8], "2025-01-01");
    assert_eq!(&forecast[9], "");
    assert!(forecast[11].parse::<f64>().unwrap() >= 0.0);
    assert!(!forecast[12].is_empty());
}

#[test]
fn test_write_csv_to_buffer_matches_unified_len() {
    let attrs = EntityAttributes::new("P1", "LI", "S1", "L1");
    let store = TimeSeriesStore::from_rows(
        vec![ObservationRow::new(attrs, d(2024, 1), 5.0)],
        vec![],
    );
    let svc = ForecastService::new(store, ForecastConfig::default()).unwrap();
    svc.generate().unwrap();

    let mut buf = Vec::new();
    svc.write_csv(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1 + svc.unified_data().unwrap().len());

    let mut direct = Vec::new();
    export::write_csv(&svc.unified_data().unwrap(), &mut direct).unwrap();
    assert_eq!(text.as_bytes(), direct.as_slice());
}
