//! Flat-file export of the unified series

use crate::error::Result;
use crate::reconcile::UnifiedRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Column order of exported files
pub const EXPORT_COLUMNS: [&str; 13] = [
    "Profile",
    "Line_Item",
    "Budget Unit",
    "Token",
    "Body",
    "Site",
    "Lineup",
    "Institutions",
    "DATE",
    "Actual",
    "Plan",
    "Forecast",
    "Synthetic_Actual",
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn to_row(record: &UnifiedRecord) -> [String; 13] {
    let attrs = &record.attributes;
    [
        attrs.profile.clone(),
        attrs.line_item.clone(),
        text(&attrs.budget_unit),
        text(&attrs.token),
        text(&attrs.body),
        attrs.site.clone(),
        attrs.lineup.clone(),
        text(&attrs.institutions),
        record.date.format("%Y-%m-%d").to_string(),
        number(record.actual),
        number(record.plan),
        number(record.forecast),
        number(record.synthetic_actual),
    ]
}

/// Write records as CSV; absent measures become empty cells
pub fn write_csv<W: Write>(records: &[UnifiedRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for record in records {
        wtr.write_record(to_row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records as CSV to a file, replacing any existing content
pub fn export_csv<P: AsRef<Path>>(records: &[UnifiedRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    write_csv(records, File::create(path)?)?;
    info!(path = %path.display(), rows = records.len(), "unified data exported");
    Ok(())
}
