//! Location resolution: device geolocation first, IP geolocation as fallback.

use crate::types::{Coordinates, LocationError};
use reqwest::{Client, Url};
use serde::Deserialize;
use skycast_core::ReqwestErrorExt;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A single-shot device position source.
#[allow(async_fn_in_trait)]
pub trait DeviceGeolocation {
    /// Whether the capability exists at all. When false the resolver never
    /// calls [`DeviceGeolocation::current_position`].
    fn is_available(&self) -> bool;

    /// Request one position fix.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Device without a geolocation capability
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDevice;

impl DeviceGeolocation for UnsupportedDevice {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Device reporting a configured, fixed position
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl DeviceGeolocation for FixedPosition {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

/// IP-based geolocation (ip-api.com response shape)
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    url: Url,
}

impl IpGeolocator {
    pub fn new(url: &str) -> Result<Self, LocationError> {
        let url = Url::parse(url).map_err(|e| {
            LocationError::NetworkFallbackFailed(format!("Invalid IP lookup URL: {}", e))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                LocationError::NetworkFallbackFailed(e.into_network_error().to_string())
            })?;

        Ok(Self { client, url })
    }

    /// One GET; anything but `status == "success"` with coordinates fails.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                let err = e.into_network_error();
                tracing::warn!("IP geolocation request failed: {}", err);
                LocationError::NetworkFallbackFailed(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("IP geolocation returned status {}", status);
            return Err(LocationError::NetworkFallbackFailed(format!(
                "IP geolocation returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: IpLookupResponse = response.json().await.map_err(|e| {
            tracing::warn!("IP geolocation parse error: {}", e);
            LocationError::NetworkFallbackFailed(e.into_network_error().to_string())
        })?;

        if body.status != "success" {
            let reason = body.message.unwrap_or(body.status);
            tracing::warn!("IP geolocation unsuccessful: {}", reason);
            return Err(LocationError::NetworkFallbackFailed(reason));
        }

        body.lat
            .zip(body.lon)
            .and_then(|(lat, lon)| Coordinates::new(lat, lon))
            .ok_or_else(|| {
                LocationError::NetworkFallbackFailed(
                    "IP geolocation response had no usable coordinates".to_string(),
                )
            })
    }
}

/// Produces coordinates for a run. Stateless apart from its two sources.
#[derive(Debug, Clone)]
pub struct LocationResolver<D> {
    device: D,
    ip: IpGeolocator,
}

impl<D: DeviceGeolocation> LocationResolver<D> {
    pub fn new(device: D, ip: IpGeolocator) -> Self {
        Self { device, ip }
    }

    /// Device position when it is available and succeeds; otherwise exactly
    /// one IP lookup. The device path is never retried.
    pub async fn resolve(&self) -> Result<Coordinates, LocationError> {
        if !self.device.is_available() {
            tracing::info!("Device geolocation unsupported, using IP fallback");
            return self.ip.locate().await;
        }

        match self.device.current_position().await {
            Ok(coordinates) => {
                tracing::info!("Got device location: {}", coordinates);
                Ok(coordinates)
            }
            Err(e) => {
                tracing::info!("Device geolocation failed ({}), using IP fallback", e);
                self.ip.locate().await
            }
        }
    }
}
