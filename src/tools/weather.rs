//! Current weather lookup.

use crate::agent::{parse_arguments, StateUpdate, Tool, ToolContext};
use crate::clients::{Geocoder, WeatherService};
use crate::error::{Result, SporError};
use crate::llm::ToolSpec;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "get_weather";

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

/// Geocodes a place name and fetches its current conditions.
pub struct WeatherTool {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherService>,
}

impl WeatherTool {
    pub fn new(geocoder: Arc<dyn Geocoder>, weather: Arc<dyn WeatherService>) -> Self {
        Self { geocoder, weather }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: NAME.to_string(),
            description: "Get the weather for a given city".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City or place name"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    async fn call(&self, ctx: &mut ToolContext<'_>, arguments: serde_json::Value) -> Result<String> {
        let args: WeatherArgs = parse_arguments(NAME, arguments)?;
        let location = args.location;

        ctx.reset_steps();
        ctx.observe(format!("Getting coordinates for {}", location));

        let coordinates = self.geocoder.locate(&location).await?;
        let Some(coordinates) = coordinates else {
            ctx.observe(format!("No coordinates found for {}", location));
            return Err(SporError::LocationNotFound(location));
        };
        ctx.observe(format!("Retrieved coordinates: {}", coordinates));

        let reading = self.weather.current(&coordinates).await?;
        debug!("Weather for {}: {:?}", location, reading);

        ctx.session.weather = Some(reading.clone());
        ctx.emitter.emit(StateUpdate::weather(&reading));

        let payload = serde_json::to_string(&reading)?;
        ctx.observe(format!(
            "Weather data retrieved successfully for {} {}",
            location, payload
        ));

        Ok(payload)
    }
}
