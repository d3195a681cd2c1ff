//! Weather command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::clients::{Geocoder, NominatimGeocoder, OpenMeteoClient, WeatherService};
use crate::config::Settings;
use crate::error::SporError;
use anyhow::Result;

/// Run the weather command.
pub async fn run_weather(location: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Weather, &settings)?;

    let geocoder = NominatimGeocoder::new(
        &settings.weather.geocoding_url,
        &settings.weather.user_agent,
        settings.weather.timeout(),
    )?;
    let weather = OpenMeteoClient::new(&settings.weather.forecast_url, settings.weather.timeout())?;

    let spinner = Output::spinner(&format!("Getting coordinates for {}", location));
    let coordinates = match geocoder.locate(location).await {
        Ok(Some(coordinates)) => coordinates,
        Ok(None) => {
            spinner.finish_and_clear();
            let err = SporError::LocationNotFound(location.to_string());
            Output::error(&err.to_string());
            return Err(err.into());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Geocoding failed: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message(format!("Fetching weather at {}", coordinates));
    let reading = weather.current(&coordinates).await;
    spinner.finish_and_clear();
    let reading = reading?;

    let place = coordinates.display_name.as_deref().unwrap_or(location);
    Output::weather(place, &reading);

    Ok(())
}
