//! Nominatim (OpenStreetMap) geocoding client.

use super::{Coordinates, Geocoder};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Geocoder backed by the Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimGeocoder {
    /// Create a geocoder. Nominatim requires an identifying user agent.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn locate(&self, place: &str) -> Result<Option<Coordinates>> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("q", place), ("format", "json"), ("limit", "1")],
        )?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SporError::Geocoding(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await?;
        let coordinates = parse_places(&body)?;
        debug!("Geocoded {} -> {:?}", place, coordinates);
        Ok(coordinates)
    }
}

/// Parse a Nominatim JSON response, taking the best match.
fn parse_places(body: &str) -> Result<Option<Coordinates>> {
    let places: Vec<Place> = serde_json::from_str(body)?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| SporError::Geocoding(format!("Invalid latitude '{}': {}", place.lat, e)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| SporError::Geocoding(format!("Invalid longitude '{}': {}", place.lon, e)))?;

    Ok(Some(Coordinates {
        latitude,
        longitude,
        display_name: place.display_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_place() {
        let body = r#"[
            {"lat": "49.0195", "lon": "12.0975", "display_name": "Regensburg, Bayern, Deutschland"},
            {"lat": "1.0", "lon": "2.0"}
        ]"#;
        let coords = parse_places(body).unwrap().unwrap();
        assert!((coords.latitude - 49.0195).abs() < 1e-9);
        assert!((coords.longitude - 12.0975).abs() < 1e-9);
        assert_eq!(
            coords.display_name.as_deref(),
            Some("Regensburg, Bayern, Deutschland")
        );
    }

    #[test]
    fn test_empty_result_is_not_found() {
        assert!(parse_places("[]").unwrap().is_none());
    }

    #[test]
    fn test_malformed_coordinates_are_errors() {
        let body = r#"[{"lat": "north", "lon": "12.0"}]"#;
        assert!(matches!(parse_places(body), Err(SporError::Geocoding(_))));
    }
}
