//! Per-session forecast cache.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::types::NormalizedForecast;

/// Key-value store of normalized forecasts, keyed by location query.
///
/// Methods take `&self` so a cache can be shared with an in-flight request.
pub trait ForecastCache: Send + Sync {
    fn get(&self, location: &str) -> Option<NormalizedForecast>;
    fn set(&self, location: &str, forecast: NormalizedForecast);
    fn delete(&self, location: &str);
}

/// In-memory cache for a single user session.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: Mutex<HashMap<String, NormalizedForecast>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ForecastCache for SessionCache {
    fn get(&self, location: &str) -> Option<NormalizedForecast> {
        self.entries.lock().get(location).cloned()
    }

    fn set(&self, location: &str, forecast: NormalizedForecast) {
        self.entries.lock().insert(location.to_string(), forecast);
    }

    fn delete(&self, location: &str) {
        self.entries.lock().remove(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DayRecord, Metric};

    fn forecast(date: &str) -> NormalizedForecast {
        let mut forecast = NormalizedForecast::default();
        forecast.insert(DayRecord {
            date: date.to_string(),
            temp_max: Metric::Value(1.0),
            temp_min: Metric::Value(0.0),
            humidity: Metric::NotAvailable,
        });
        forecast
    }

    #[test]
    fn test_get_set_delete() {
        let cache = SessionCache::new();
        assert!(cache.get("Berlin").is_none());

        cache.set("Berlin", forecast("2024-01-01"));
        assert_eq!(cache.get("Berlin"), Some(forecast("2024-01-01")));
        assert_eq!(cache.len(), 1);

        cache.set("Berlin", forecast("2024-01-02"));
        assert_eq!(cache.get("Berlin"), Some(forecast("2024-01-02")));

        cache.delete("Berlin");
        assert!(cache.get("Berlin").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_are_exact() {
        let cache = SessionCache::new();
        cache.set("Paris", forecast("2024-01-01"));
        assert!(cache.get("paris").is_none());
    }
}
