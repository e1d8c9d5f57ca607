//! Weather forecasts for SkyCast.
//!
//! Fetches 7-day forecasts from the Visual Crossing timeline API, normalizes
//! them into per-day records, archives raw responses on disk and caches
//! normalized results per session.

pub mod archive;
pub mod cache;
pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod service;
pub mod types;

pub use archive::{Archive, ArchiveEntry};
pub use cache::{ForecastCache, SessionCache};
pub use client::WeatherClient;
pub use error::{ArchiveError, FetchError, ForecastError, NormalizeError};
pub use normalize::normalize;
pub use retry::RetryConfig;
pub use service::ForecastService;
pub use types::*;
