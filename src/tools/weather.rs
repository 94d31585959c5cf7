//! Weather lookup tool
//!
//! One HTTP GET against the Open-Meteo forecast endpoint per call. No
//! retries and no recovery: a malformed body or a missing field is an error
//! the caller sees.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Public forecast API queried by coordinate pair.
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com";

pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_WEATHER_BASE_URL)
    }

    /// Point the client at a different forecast source (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Current temperature at the given coordinates, in degrees Celsius.
    ///
    /// Coordinates are passed through unvalidated. The request asks for the
    /// current temperature and wind speed plus the hourly series, and reads
    /// `current.temperature_2m` out of the response.
    pub async fn current_temperature(&self, latitude: f64, longitude: f64) -> Result<f64> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,wind_speed_10m".to_string()),
                (
                    "hourly",
                    "temperature_2m,relative_humidity_2m,wind_speed_10m".to_string(),
                ),
            ])
            .send()
            .await
            .map_err(|e| AppError::Tool(format!("weather request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Tool(format!("malformed weather response: {}", e)))?;

        body["current"]["temperature_2m"].as_f64().ok_or_else(|| {
            AppError::Tool("weather response missing current.temperature_2m".to_string())
        })
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

/// `get_weather` exposed to agents.
pub struct WeatherTool {
    client: Arc<WeatherClient>,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            client: Arc::new(WeatherClient::new()),
        }
    }

    pub fn with_client(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current temperature for a pair of geographic coordinates"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "latitude": {
                    "type": "number",
                    "description": "Latitude in decimal degrees"
                },
                "longitude": {
                    "type": "number",
                    "description": "Longitude in decimal degrees"
                }
            },
            "required": ["latitude", "longitude"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let latitude = args
            .get("latitude")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| AppError::InvalidInput("Missing 'latitude' parameter".to_string()))?;

        let longitude = args
            .get("longitude")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| AppError::InvalidInput("Missing 'longitude' parameter".to_string()))?;

        let temperature = self.client.current_temperature(latitude, longitude).await?;

        Ok(json!({
            "latitude": latitude,
            "longitude": longitude,
            "temperature_2m": temperature
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition() {
        let tool = WeatherTool::new();
        assert_eq!(tool.name(), "get_weather");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["latitude"].is_object());
        assert!(schema["properties"]["longitude"].is_object());
    }

    #[tokio::test]
    async fn test_missing_coordinates_rejected() {
        let tool = WeatherTool::new();
        let result = tool.execute(json!({ "latitude": 40.7128 })).await;
        assert!(result.is_err());
    }
}
