//! Data loading: raw rows (or CSV) into a strictly date-ordered [`Dataset`].
//!
//! Coercion rules:
//! - any interest field that is absent, empty or not a finite number becomes
//!   *missing* (`None`), never zero;
//! - rows whose date cannot be parsed or whose price is not finite are dropped;
//! - duplicate dates keep the first row seen;
//! - zero surviving rows is [`TrendError::EmptyDataset`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::sample::{Dataset, Sample};
use crate::data::series::SeriesDefinition;
use crate::error::{Result, TrendError};

/// A raw cell value as handed over by a CSV reader or any other row source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl RawValue {
    /// Finite numeric value, if any.
    pub fn as_finite(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(v) => *v,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawValue::Text(s) => parse_date(s),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            RawValue::Null
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

/// Column name → raw value.
pub type RawRow = HashMap<String, RawValue>;

/// Which columns carry the date and the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderColumns {
    pub date: String,
    /// Price column candidates in priority order (first present and finite wins).
    pub price: Vec<String>,
}

impl Default for LoaderColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            price: vec!["close".to_string(), "price".to_string()],
        }
    }
}

/// Parse an ISO-8601-ish calendar date; time-of-day parts are discarded.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Turn raw rows into a sorted, de-duplicated dataset.
pub fn load_rows<I>(
    rows: I,
    columns: &LoaderColumns,
    series: &[SeriesDefinition],
) -> Result<Dataset>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut samples: Vec<Sample> = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        match sample_from_row(&row, columns, series) {
            Some(s) => samples.push(s),
            None => dropped += 1,
        }
    }

    // Stable sort keeps file order among equal dates, so "first wins" below.
    samples.sort_by_key(|s| s.date);
    let before = samples.len();
    samples.dedup_by(|later, earlier| later.date == earlier.date);
    let duplicates = before - samples.len();
    if duplicates > 0 {
        debug!(duplicates, "dropped rows with duplicate dates");
    }

    if samples.is_empty() {
        return Err(TrendError::EmptyDataset);
    }
    info!(kept = samples.len(), dropped = dropped + duplicates, "dataset loaded");
    Ok(Dataset::from_sorted(samples))
}

fn sample_from_row(
    row: &RawRow,
    columns: &LoaderColumns,
    series: &[SeriesDefinition],
) -> Option<Sample> {
    let date = row.get(&columns.date)?.as_date()?;
    let price = columns
        .price
        .iter()
        .find_map(|c| row.get(c).and_then(RawValue::as_finite))?;

    let mut sample = Sample::new(date, price);
    for def in series {
        let value = row
            .get(def.key.as_str())
            .and_then(RawValue::as_finite)
            .map(|v| match def.scale_divisor {
                Some(div) if div != 0.0 => v / div,
                _ => v,
            });
        sample.interest.insert(def.key.clone(), value);
    }
    Some(sample)
}

/// Read CSV (header row required) from any reader.
pub fn load_csv_reader<R: Read>(
    reader: R,
    columns: &LoaderColumns,
    series: &[SeriesDefinition],
) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows: Vec<RawRow> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), RawValue::from(v)))
            .collect();
        rows.push(row);
    }
    load_rows(rows, columns, series)
}

pub fn load_csv_path<P: AsRef<Path>>(
    path: P,
    columns: &LoaderColumns,
    series: &[SeriesDefinition],
) -> Result<Dataset> {
    let path = path.as_ref();
    debug!(?path, "opening csv");
    let file = std::fs::File::open(path)?;
    load_csv_reader(std::io::BufReader::new(file), columns, series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, RawValue)]) -> RawRow {
        cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn nft() -> Vec<SeriesDefinition> {
        vec![SeriesDefinition::new("nft", "nft", 0)]
    }

    #[test]
    fn unparsable_interest_becomes_missing_not_zero() {
        let rows = vec![row(&[
            ("date", "2020-01-01".into()),
            ("close", 7200.0.into()),
            ("nft", "n/a".into()),
        ])];
        let ds = load_rows(rows, &LoaderColumns::default(), &nft()).unwrap();
        let s = &ds.samples()[0];
        assert_eq!(s.interest(&"nft".into()), None);
        assert!(s.interest.contains_key(&"nft".into()));
    }

    #[test]
    fn rows_without_price_or_date_are_dropped() {
        let rows = vec![
            row(&[("date", "2020-01-02".into()), ("close", RawValue::Null)]),
            row(&[("date", "garbage".into()), ("close", 1.0.into())]),
            row(&[("date", "2020-01-01".into()), ("close", f64::NAN.into())]),
            row(&[("date", "2020-01-03".into()), ("close", "7000".into())]),
        ];
        let ds = load_rows(rows, &LoaderColumns::default(), &[]).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.first_date(), NaiveDate::from_ymd_opt(2020, 1, 3).unwrap());
    }

    #[test]
    fn price_column_falls_back_to_second_candidate() {
        let rows = vec![row(&[("date", "2020-01-01".into()), ("price", 5.0.into())])];
        let ds = load_rows(rows, &LoaderColumns::default(), &[]).unwrap();
        assert_eq!(ds.samples()[0].price, 5.0);
    }

    #[test]
    fn sorts_and_keeps_first_duplicate() {
        let rows = vec![
            row(&[("date", "2020-01-02".into()), ("close", 2.0.into())]),
            row(&[("date", "2020-01-01".into()), ("close", 1.0.into())]),
            row(&[("date", "2020-01-02".into()), ("close", 99.0.into())]),
        ];
        let ds = load_rows(rows, &LoaderColumns::default(), &[]).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.samples()[0].price, 1.0);
        assert_eq!(ds.samples()[1].price, 2.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = load_rows(Vec::<RawRow>::new(), &LoaderColumns::default(), &[]).unwrap_err();
        assert!(matches!(err, TrendError::EmptyDataset));
    }

    #[test]
    fn scale_divisor_is_applied() {
        let series = vec![SeriesDefinition::new("nft", "nft", 0).with_scale_divisor(2.0)];
        let rows = vec![row(&[
            ("date", "2021-03-11".into()),
            ("close", 57000.0.into()),
            ("nft", "50".into()),
        ])];
        let ds = load_rows(rows, &LoaderColumns::default(), &series).unwrap();
        assert_eq!(ds.samples()[0].interest(&"nft".into()), Some(25.0));
    }

    #[test]
    fn parses_timestamp_dates() {
        assert_eq!(parse_date("2016-05-25T00:00:00Z"), NaiveDate::from_ymd_opt(2016, 5, 25));
        assert_eq!(parse_date("2016-05-25 13:00:00"), NaiveDate::from_ymd_opt(2016, 5, 25));
        assert_eq!(parse_date("25/05/2016"), None);
    }
}
