//! Utility functions for the lineup_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};

/// Date formats accepted in input files, tried in order
const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// Parse a date in any supported format and move it to the first of its month
pub fn parse_month(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(first_of_month)
        .ok_or_else(|| ForecastError::DataError(format!("Unrecognised date: {:?}", text)))
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First-of-month dates for `horizon` consecutive months starting in January of `year`
pub fn forecast_months(year: i32, horizon: usize) -> Result<Vec<NaiveDate>> {
    (0..horizon)
        .map(|i| {
            let y = year + (i / 12) as i32;
            let m = (i % 12) as u32 + 1;
            NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| {
                ForecastError::InvalidParameter(format!("Forecast month {}-{} is out of range", y, m))
            })
        })
        .collect()
}

/// Zero-based calendar month index (January == 0)
pub fn month_index(date: NaiveDate) -> usize {
    date.month0() as usize
}
