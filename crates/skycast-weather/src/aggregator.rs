//! All-or-nothing assembly of one [`PipelineResult`].

use crate::geocode::ReverseGeocoder;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, ForecastSeries, LocationInfo, PipelineResult, WeatherError};

#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    provider: WeatherProvider,
    geocoder: ReverseGeocoder,
}

impl WeatherAggregator {
    pub fn new(provider: WeatherProvider, geocoder: ReverseGeocoder) -> Self {
        Self { provider, geocoder }
    }

    /// Fetches realtime, hourly and daily data concurrently. The first failure
    /// drops the other in-flight requests and nothing partial is returned.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_all(&self, coordinates: Coordinates) -> Result<PipelineResult, WeatherError> {
        let (realtime, hourly, daily) = tokio::try_join!(
            self.provider.fetch_realtime(coordinates),
            self.provider.fetch_hourly(coordinates),
            self.provider.fetch_daily(coordinates),
        )?;

        let display_name = match realtime.location_name {
            Some(name) => name,
            None => {
                tracing::debug!("Provider sent no place name, reverse geocoding");
                self.geocoder.lookup(coordinates).await
            }
        };

        let series = ForecastSeries::new(hourly, daily);
        tracing::info!(
            "Weather assembled for {}: {} hourly, {} daily points",
            display_name,
            series.hourly().len(),
            series.daily().len()
        );

        Ok(PipelineResult {
            location: LocationInfo::new(coordinates, Some(display_name)),
            snapshot: realtime.snapshot,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MAX_DAILY_POINTS, MAX_HOURLY_POINTS, UNKNOWN_LOCATION};
    use chrono::{Duration, TimeZone, Utc};
    use skycast_core::{UnitSystem, WeatherConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn aggregator(server: &MockServer) -> WeatherAggregator {
        let provider = WeatherProvider::new(&WeatherConfig {
            base_url: server.uri(),
            api_key: Some("test-key".to_string()),
            units: UnitSystem::Metric,
            timeout_seconds: 5,
        })
        .unwrap();
        let geocoder = ReverseGeocoder::new(&format!("{}/reverse", server.uri())).unwrap();
        WeatherAggregator::new(provider, geocoder)
    }

    fn realtime_body(name: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "data": {"values": {
                "temperature": 12.0,
                "temperatureApparent": 10.5,
                "humidity": 60,
                "windSpeed": 3.4,
                "weatherCode": 1000,
                "uvIndex": 3
            }}
        });
        if let Some(n) = name {
            body["location"] = serde_json::json!({"name": n});
        }
        body
    }

    fn hourly_body(count: i64) -> serde_json::Value {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let entries: Vec<_> = (0..count)
            .map(|h| {
                serde_json::json!({
                    "time": (start + Duration::hours(h)).to_rfc3339(),
                    "values": {"temperature": h as f64, "weatherCode": 1100}
                })
            })
            .collect();
        serde_json::json!({"timelines": {"hourly": entries}})
    }

    fn daily_body(count: i64) -> serde_json::Value {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let entries: Vec<_> = (0..count)
            .map(|d| {
                serde_json::json!({
                    "time": (start + Duration::days(d)).to_rfc3339(),
                    "values": {"temperatureMin": 1.0, "temperatureMax": 9.0}
                })
            })
            .collect();
        serde_json::json!({"timelines": {"daily": entries}})
    }

    async fn mount(server: &MockServer, realtime: ResponseTemplate, hourly: ResponseTemplate, daily: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/weather/realtime"))
            .respond_with(realtime)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather/forecast"))
            .and(query_param("timesteps", "1h"))
            .respond_with(hourly)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather/forecast"))
            .and(query_param("timesteps", "1d"))
            .respond_with(daily)
            .mount(server)
            .await;
    }

    fn coords() -> Coordinates {
        Coordinates::new(39.78, -89.65).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_truncates_timelines() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(realtime_body(Some("Springfield, IL"))),
            ResponseTemplate::new(200).set_body_json(hourly_body(120)),
            ResponseTemplate::new(200).set_body_json(daily_body(15)),
        )
        .await;

        let result = aggregator(&server).fetch_all(coords()).await.unwrap();

        assert_eq!(result.location.display_name, "Springfield, IL");
        assert_eq!(result.location.coordinates, coords());
        assert_eq!(result.snapshot.uv_index, 3.0);
        assert_eq!(result.series.hourly().len(), MAX_HOURLY_POINTS);
        assert_eq!(result.series.daily().len(), MAX_DAILY_POINTS);
        assert_eq!(result.series.hourly()[23].temperature, 23.0);
    }

    #[tokio::test]
    async fn test_missing_name_uses_reverse_geocoder() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(realtime_body(None)),
            ResponseTemplate::new(200).set_body_json(hourly_body(3)),
            ResponseTemplate::new(200).set_body_json(daily_body(2)),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"city": "Springfield"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = aggregator(&server).fetch_all(coords()).await.unwrap();
        assert_eq!(result.location.display_name, "Springfield");
    }

    #[tokio::test]
    async fn test_provider_name_skips_reverse_geocoder() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(realtime_body(Some("Shelbyville"))),
            ResponseTemplate::new(200).set_body_json(hourly_body(1)),
            ResponseTemplate::new(200).set_body_json(daily_body(1)),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = aggregator(&server).fetch_all(coords()).await.unwrap();
        assert_eq!(result.location.display_name, "Shelbyville");
    }

    #[tokio::test]
    async fn test_failed_reverse_geocode_degrades_to_sentinel() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(realtime_body(None)),
            ResponseTemplate::new(200).set_body_json(hourly_body(1)),
            ResponseTemplate::new(200).set_body_json(daily_body(1)),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = aggregator(&server).fetch_all(coords()).await.unwrap();
        assert_eq!(result.location.display_name, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_realtime_failure_fails_everything() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(500),
            ResponseTemplate::new(200).set_body_json(hourly_body(24)),
            ResponseTemplate::new(200).set_body_json(daily_body(7)),
        )
        .await;

        let err = aggregator(&server).fetch_all(coords()).await.unwrap_err();
        assert_eq!(err, WeatherError::HttpError(500));
    }

    #[tokio::test]
    async fn test_daily_failure_fails_everything() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(realtime_body(Some("Ogdenville"))),
            ResponseTemplate::new(200).set_body_json(hourly_body(24)),
            ResponseTemplate::new(200).set_body_string("{\"timelines\": 42}"),
        )
        .await;

        let err = aggregator(&server).fetch_all(coords()).await.unwrap_err();
        assert!(matches!(err, WeatherError::ParseError(_)));
    }
}
