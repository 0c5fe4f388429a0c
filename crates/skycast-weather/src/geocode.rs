//! Reverse geocoding: convert coordinates to human-readable place names.
//! Uses the BigDataCloud client endpoint - free, no API key required.

use crate::types::{Coordinates, WeatherError, UNKNOWN_LOCATION};
use reqwest::{Client, Url};
use serde::Deserialize;
use skycast_core::ReqwestErrorExt;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("Skycast/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    city: Option<String>,
    locality: Option<String>,
}

/// Best-effort place name lookup. Never fails outward.
#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    client: Client,
    url: Url,
}

impl ReverseGeocoder {
    /// Fails only on an unusable URL or when the HTTP client cannot be built;
    /// lookups themselves never fail.
    pub fn new(url: &str) -> Result<Self, WeatherError> {
        let url = Url::parse(url)
            .map_err(|e| WeatherError::Network(format!("Invalid reverse geocode URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error().to_string()))?;

        Ok(Self { client, url })
    }

    /// Reverse geocode coordinates to a place name (e.g. "Capitol Hill, Seattle").
    /// Returns [`UNKNOWN_LOCATION`] on failure or when the service knows no name.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn lookup(&self, coordinates: Coordinates) -> String {
        let response = match self
            .client
            .get(self.url.clone())
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Reverse geocode request failed: {}", e);
                return UNKNOWN_LOCATION.to_string();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Reverse geocode returned status {}", response.status());
            return UNKNOWN_LOCATION.to_string();
        }

        let body: ReverseGeocodeResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Reverse geocode parse error: {}", e);
                return UNKNOWN_LOCATION.to_string();
            }
        };

        let name = compose_place_name(body.locality.as_deref(), body.city.as_deref());
        tracing::info!("Reverse geocoded to: {}", name);
        name
    }
}

/// `"{locality}, {city}"` when both are present and differ, otherwise whichever
/// one exists, otherwise [`UNKNOWN_LOCATION`]. Blank strings count as absent.
pub fn compose_place_name(locality: Option<&str>, city: Option<&str>) -> String {
    let locality = locality.map(str::trim).filter(|s| !s.is_empty());
    let city = city.map(str::trim).filter(|s| !s.is_empty());

    match (locality, city) {
        (Some(l), Some(c)) if l != c => format!("{}, {}", l, c),
        (_, Some(c)) => c.to_string(),
        (Some(l), None) => l.to_string(),
        (None, None) => UNKNOWN_LOCATION.to_string(),
    }
}
