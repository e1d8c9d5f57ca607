use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::error::ForecastError;

/// Placeholder shown for a metric the API did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// A user-supplied place name, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn parse(input: &str) -> Result<Self, ForecastError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ForecastError::EmptyLocation);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The upstream JSON body, kept verbatim for archiving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawForecast(Value);

impl RawForecast {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The `days` list, if present and actually a list.
    pub fn days(&self) -> Option<&Vec<Value>> {
        self.0.get("days")?.as_array()
    }

    /// `datetime` of the first day entry.
    pub fn first_date(&self) -> Option<&str> {
        self.days()?.first()?.get("datetime")?.as_str()
    }
}

/// A single daily measurement, or the "not available" sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
}

impl Metric {
    /// Numbers become values; absent, null and non-numeric fields become the sentinel.
    pub fn from_json(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_f64)
            .map_or(Metric::NotAvailable, Metric::Value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{}", v),
            Metric::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// One day of a normalized forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    /// `YYYY-MM-DD`, as sent by the API
    pub date: String,
    pub temp_max: Metric,
    pub temp_min: Metric,
    pub humidity: Metric,
}

/// Date-keyed daily forecast in API order.
///
/// Behaves like an insertion-ordered map: inserting a date that is already
/// present replaces its values without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedForecast {
    days: Vec<DayRecord>,
}

impl NormalizedForecast {
    pub fn insert(&mut self, record: DayRecord) {
        match self.days.iter_mut().find(|d| d.date == record.date) {
            Some(existing) => *existing = record,
            None => self.days.push(record),
        }
    }

    pub fn get(&self, date: &str) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayRecord> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn start_date(&self) -> Option<&str> {
        self.days.first().map(|d| d.date.as_str())
    }

    pub fn end_date(&self) -> Option<&str> {
        self.days.last().map(|d| d.date.as_str())
    }
}

impl<'a> IntoIterator for &'a NormalizedForecast {
    type Item = &'a DayRecord;
    type IntoIter = std::slice::Iter<'a, DayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

/// Where a served forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Cache,
    Upstream,
}

/// Everything the results page needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub forecast: NormalizedForecast,
    pub source: ForecastSource,
    /// Set when this request wrote an archive file
    pub archive_path: Option<PathBuf>,
}

impl ForecastView {
    pub fn new(
        location: &LocationQuery,
        forecast: NormalizedForecast,
        source: ForecastSource,
        archive_path: Option<PathBuf>,
    ) -> Self {
        Self {
            title: location.to_string(),
            start_time: forecast.start_date().unwrap_or_default().to_string(),
            end_time: forecast.end_date().unwrap_or_default().to_string(),
            forecast,
            source,
            archive_path,
        }
    }
}
