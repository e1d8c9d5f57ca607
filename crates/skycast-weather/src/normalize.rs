//! Raw timeline response -> `NormalizedForecast`.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::types::{DayRecord, Metric, NormalizedForecast, RawForecast};

/// Build the per-day forecast from a raw response.
///
/// Days are taken in the order the API lists them. A day without a string
/// `datetime` aborts the whole conversion; missing metrics become
/// `Metric::NotAvailable`.
pub fn normalize(raw: &RawForecast) -> Result<NormalizedForecast, NormalizeError> {
    let days = raw.days().ok_or(NormalizeError::MissingDays)?;

    let mut forecast = NormalizedForecast::default();
    for (index, day) in days.iter().enumerate() {
        forecast.insert(day_record(index, day)?);
    }

    if forecast.is_empty() {
        return Err(NormalizeError::EmptyResult);
    }

    Ok(forecast)
}

fn day_record(index: usize, day: &Value) -> Result<DayRecord, NormalizeError> {
    let date = day
        .get("datetime")
        .and_then(Value::as_str)
        .ok_or(NormalizeError::MissingDate { index })?;

    Ok(DayRecord {
        date: date.to_string(),
        temp_max: Metric::from_json(day.get("tempmax")),
        temp_min: Metric::from_json(day.get("tempmin")),
        humidity: Metric::from_json(day.get("humidity")),
    })
}
