use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycast_core::WEATHER_FAILURE_MESSAGE;

/// Place name used when no lookup produced one
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Upper bound on the hourly timeline kept from the provider
pub const MAX_HOURLY_POINTS: usize = 24;

/// Upper bound on the daily timeline kept from the provider
pub const MAX_DAILY_POINTS: usize = 7;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates plus the name shown for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub coordinates: Coordinates,
    pub display_name: String,
}

impl LocationInfo {
    pub fn new(coordinates: Coordinates, display_name: Option<String>) -> Self {
        Self {
            coordinates,
            display_name: display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        }
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_code: i32,
    pub precipitation_probability: f64,
    pub visibility: f64,
    pub pressure: f64,
    pub uv_index: f64,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub weather_code: i32,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation_probability: f64,
    pub uv_index: f64,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastPoint {
    /// Start of the provider's daily bucket. Kept as an instant: buckets open
    /// at local morning, so the UTC calendar date can be a day early.
    pub date: DateTime<Utc>,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub temperature_avg: f64,
    pub weather_code_max: i32,
    pub precipitation_probability_avg: f64,
}

/// Hourly and daily timelines, each strictly ascending and bounded.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ForecastSeries {
    hourly: Vec<HourlyForecastPoint>,
    daily: Vec<DailyForecastPoint>,
}

impl ForecastSeries {
    /// Orders both timelines, drops duplicate instants and truncates to
    /// [`MAX_HOURLY_POINTS`] / [`MAX_DAILY_POINTS`].
    pub fn new(mut hourly: Vec<HourlyForecastPoint>, mut daily: Vec<DailyForecastPoint>) -> Self {
        hourly.sort_by_key(|p| p.timestamp);
        hourly.dedup_by_key(|p| p.timestamp);
        hourly.truncate(MAX_HOURLY_POINTS);

        daily.sort_by_key(|p| p.date);
        daily.dedup_by_key(|p| p.date);
        daily.truncate(MAX_DAILY_POINTS);

        Self { hourly, daily }
    }

    pub fn hourly(&self) -> &[HourlyForecastPoint] {
        &self.hourly
    }

    pub fn daily(&self) -> &[DailyForecastPoint] {
        &self.daily
    }
}

/// Complete weather data bundle produced by one successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub location: LocationInfo,
    pub snapshot: WeatherSnapshot,
    pub series: ForecastSeries,
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location position unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Unable to determine location: {0}")]
    NetworkFallbackFailed(String),
}

/// Weather provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    #[error("HTTP error: {0}")]
    HttpError(u16),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("No weather API key configured")]
    MissingApiKey,
}

impl WeatherError {
    /// Text shown to the user; the cause itself only goes to the log.
    pub fn user_message(&self) -> &'static str {
        WEATHER_FAILURE_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> HourlyForecastPoint {
        HourlyForecastPoint {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
                + chrono::Duration::hours(h as i64),
            weather_code: 1000,
            temperature: h as f64,
            apparent_temperature: h as f64,
            humidity: 50.0,
            wind_speed: 3.0,
            precipitation_probability: 0.0,
            uv_index: 1.0,
        }
    }

    fn day(d: u32) -> DailyForecastPoint {
        DailyForecastPoint {
            date: Utc.with_ymd_and_hms(2026, 3, d, 6, 0, 0).unwrap(),
            temperature_min: 1.0,
            temperature_max: 9.0,
            temperature_avg: 5.0,
            weather_code_max: 1001,
            precipitation_probability_avg: 10.0,
        }
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(47.6, -122.3).is_some());
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(90.1, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_coordinates_display() {
        let c = Coordinates::new(47.60621, -122.33207).unwrap();
        assert_eq!(c.to_string(), "47.6062, -122.3321");
    }

    #[test]
    fn test_location_info_defaults_to_unknown() {
        let c = Coordinates::new(1.0, 2.0).unwrap();
        assert_eq!(LocationInfo::new(c, None).display_name, UNKNOWN_LOCATION);
        assert_eq!(LocationInfo::new(c, Some("  ".into())).display_name, UNKNOWN_LOCATION);
        assert_eq!(LocationInfo::new(c, Some("Oslo".into())).display_name, "Oslo");
    }

    #[test]
    fn test_series_truncates_timelines() {
        let hourly = (0..120).map(hour).collect();
        let daily = (1..=15).map(day).collect();
        let series = ForecastSeries::new(hourly, daily);

        assert_eq!(series.hourly().len(), MAX_HOURLY_POINTS);
        assert_eq!(series.daily().len(), MAX_DAILY_POINTS);
        assert_eq!(series.hourly()[0].temperature, 0.0);
        assert_eq!(
            series.daily()[6].date,
            Utc.with_ymd_and_hms(2026, 3, 7, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_series_is_strictly_ascending() {
        let hourly = vec![hour(3), hour(1), hour(2), hour(1)];
        let daily = vec![day(5), day(2), day(5)];
        let series = ForecastSeries::new(hourly, daily);

        assert_eq!(series.hourly().len(), 3);
        assert!(series
            .hourly()
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(series.daily().len(), 2);
        assert!(series.daily().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_weather_error_user_message_is_fixed() {
        assert_eq!(WeatherError::HttpError(500).user_message(), "failed to fetch weather data");
        assert_eq!(
            WeatherError::ParseError("bad json".into()).user_message(),
            "failed to fetch weather data"
        );
    }

    #[test]
    fn test_location_error_display() {
        assert!(LocationError::NetworkFallbackFailed("status fail".into())
            .to_string()
            .contains("status fail"));
        assert_eq!(LocationError::PermissionDenied.to_string(), "Location permission denied");
    }
}
