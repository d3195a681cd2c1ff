//! Clients for the third-party HTTP APIs the tools consume.
//!
//! Each service sits behind a small trait so tools can be exercised
//! without network access.

mod geocoding;
mod tavily;
mod weather;

pub use geocoding::NominatimGeocoder;
pub use tavily::TavilyClient;
pub use weather::OpenMeteoClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sentinel used for weather fields the upstream service did not report.
pub const MISSING_READING: f64 = -1.0;

/// A resolved geographic position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Place name as reported by the geocoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Current weather conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// WMO weather interpretation code.
    pub weather_code: f64,
}

impl WeatherReading {
    /// Human description of the WMO weather code.
    pub fn describe(&self) -> &'static str {
        if self.weather_code < 0.0 {
            return "Unknown conditions";
        }
        match self.weather_code as u32 {
            0 => "Clear skies",
            1..=3 => "Partly cloudy",
            45 | 48 => "Foggy",
            51..=57 => "Drizzle",
            61..=67 | 80..=82 => "Rainy",
            71..=77 | 85 | 86 => "Snowy",
            95..=99 => "Thunderstorms",
            _ => "Clear skies",
        }
    }
}

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Name to coordinates lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name. `Ok(None)` means the name is unknown.
    async fn locate(&self, place: &str) -> Result<Option<Coordinates>>;
}

/// Coordinates to current conditions lookup.
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, coordinates: &Coordinates) -> Result<WeatherReading>;
}

/// Web search execution.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a query and return at most `max_results` ranked hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}
