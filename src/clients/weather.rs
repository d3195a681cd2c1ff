//! Open-Meteo current conditions client.

use super::{Coordinates, WeatherReading, WeatherService, MISSING_READING};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Weather service backed by the Open-Meteo forecast endpoint.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Option<CurrentConditions>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    weather_code: Option<f64>,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn current(&self, coordinates: &Coordinates) -> Result<WeatherReading> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code".to_string(),
                ),
            ],
        )?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SporError::Weather(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await?;
        let reading = parse_forecast(&body)?;
        debug!("Weather reading: {:?}", reading);
        Ok(reading)
    }
}

/// Parse a forecast response, substituting the sentinel for missing fields.
fn parse_forecast(body: &str) -> Result<WeatherReading> {
    let forecast: ForecastResponse = serde_json::from_str(body)?;
    let current = forecast.current.unwrap_or_default();

    Ok(WeatherReading {
        temperature: current.temperature_2m.unwrap_or(MISSING_READING),
        humidity: current.relative_humidity_2m.unwrap_or(MISSING_READING),
        weather_code: current.weather_code.unwrap_or(MISSING_READING),
    })
}
