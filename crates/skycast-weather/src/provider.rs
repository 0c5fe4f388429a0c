//! Tomorrow.io client: realtime conditions plus hourly and daily timelines.

use crate::types::{
    Coordinates, DailyForecastPoint, HourlyForecastPoint, WeatherError, WeatherSnapshot,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skycast_core::{ReqwestErrorExt, UnitSystem, WeatherConfig};
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("Skycast/", env!("CARGO_PKG_VERSION"));

/// Realtime conditions plus the provider's own place name, if it sent one
#[derive(Debug, Clone, PartialEq)]
pub struct Realtime {
    pub snapshot: WeatherSnapshot,
    pub location_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    units: UnitSystem,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error().to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.effective_api_key(),
            units: config.units,
        })
    }

    /// Current conditions
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_realtime(&self, coordinates: Coordinates) -> Result<Realtime, WeatherError> {
        let body: wire::RealtimeResponse = self
            .get_json("weather/realtime", coordinates, None)
            .await?;

        let location_name = body
            .location
            .and_then(|l| l.name)
            .filter(|n| !n.trim().is_empty());

        Ok(Realtime {
            snapshot: body.data.values.into(),
            location_name,
        })
    }

    /// Hourly timeline, in provider order and untruncated
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_hourly(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<HourlyForecastPoint>, WeatherError> {
        let body: wire::HourlyForecastResponse = self
            .get_json("weather/forecast", coordinates, Some("1h"))
            .await?;

        Ok(body
            .timelines
            .hourly
            .into_iter()
            .map(|entry| entry.into_point())
            .collect())
    }

    /// Daily timeline, in provider order and untruncated
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_daily(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<DailyForecastPoint>, WeatherError> {
        let body: wire::DailyForecastResponse = self
            .get_json("weather/forecast", coordinates, Some("1d"))
            .await?;

        Ok(body
            .timelines
            .daily
            .into_iter()
            .map(|entry| entry.into_point())
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        coordinates: Coordinates,
        timesteps: Option<&str>,
    ) -> Result<T, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query = vec![
            (
                "location",
                format!("{},{}", coordinates.latitude, coordinates.longitude),
            ),
            ("units", self.units.as_query().to_string()),
        ];
        if let Some(steps) = timesteps {
            query.push(("timesteps", steps.to_string()));
        }

        tracing::debug!("Weather request: {} {:?}", url, query);
        query.push(("apikey", api_key.to_string()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::HttpError(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error().to_string()))?;

        serde_json::from_str(&text).map_err(|e| WeatherError::ParseError(e.to_string()))
    }
}

/// Provider payload shapes
mod wire {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct RealtimeResponse {
        pub data: RealtimeData,
        #[serde(default)]
        pub location: Option<ProviderLocation>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RealtimeData {
        pub values: RealtimeValues,
    }

    #[derive(Debug, Deserialize)]
    pub struct ProviderLocation {
        #[serde(default)]
        pub name: Option<String>,
    }

    /// Temperature, apparent temperature, humidity, wind speed and weather
    /// code are required; the rest default to 0.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RealtimeValues {
        pub temperature: f64,
        pub temperature_apparent: f64,
        pub humidity: f64,
        pub wind_speed: f64,
        pub weather_code: i32,
        #[serde(default)]
        pub precipitation_probability: Option<f64>,
        #[serde(default)]
        pub visibility: Option<f64>,
        #[serde(default)]
        pub pressure_surface_level: Option<f64>,
        #[serde(default)]
        pub uv_index: Option<f64>,
    }

    impl From<RealtimeValues> for WeatherSnapshot {
        fn from(v: RealtimeValues) -> Self {
            Self {
                temperature: v.temperature,
                apparent_temperature: v.temperature_apparent,
                humidity: v.humidity,
                wind_speed: v.wind_speed,
                weather_code: v.weather_code,
                precipitation_probability: v.precipitation_probability.unwrap_or(0.0),
                visibility: v.visibility.unwrap_or(0.0),
                pressure: v.pressure_surface_level.unwrap_or(0.0),
                uv_index: v.uv_index.unwrap_or(0.0),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyForecastResponse {
        pub timelines: HourlyTimelines,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyTimelines {
        #[serde(default)]
        pub hourly: Vec<HourlyEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyEntry {
        pub time: DateTime<Utc>,
        #[serde(default)]
        pub values: HourlyValues,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct HourlyValues {
        pub temperature: Option<f64>,
        pub temperature_apparent: Option<f64>,
        pub humidity: Option<f64>,
        pub wind_speed: Option<f64>,
        pub weather_code: Option<i32>,
        pub precipitation_probability: Option<f64>,
        pub uv_index: Option<f64>,
    }

    impl HourlyEntry {
        pub fn into_point(self) -> HourlyForecastPoint {
            let v = self.values;
            HourlyForecastPoint {
                timestamp: self.time,
                weather_code: v.weather_code.unwrap_or(0),
                temperature: v.temperature.unwrap_or(0.0),
                apparent_temperature: v.temperature_apparent.unwrap_or(0.0),
                humidity: v.humidity.unwrap_or(0.0),
                wind_speed: v.wind_speed.unwrap_or(0.0),
                precipitation_probability: v.precipitation_probability.unwrap_or(0.0),
                uv_index: v.uv_index.unwrap_or(0.0),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyForecastResponse {
        pub timelines: DailyTimelines,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyTimelines {
        #[serde(default)]
        pub daily: Vec<DailyEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyEntry {
        pub time: DateTime<Utc>,
        #[serde(default)]
        pub values: DailyValues,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DailyValues {
        pub temperature_min: Option<f64>,
        pub temperature_max: Option<f64>,
        pub temperature_avg: Option<f64>,
        pub weather_code_max: Option<i32>,
        pub precipitation_probability_avg: Option<f64>,
    }

    impl DailyEntry {
        pub fn into_point(self) -> DailyForecastPoint {
            let v = self.values;
            DailyForecastPoint {
                date: self.time,
                temperature_min: v.temperature_min.unwrap_or(0.0),
                temperature_max: v.temperature_max.unwrap_or(0.0),
                temperature_avg: v.temperature_avg.unwrap_or(0.0),
                weather_code_max: v.weather_code_max.unwrap_or(0),
                precipitation_probability_avg: v.precipitation_probability_avg.unwrap_or(0.0),
            }
        }
    }
}
