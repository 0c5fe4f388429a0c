use std::process::ExitCode;

use chrono::Local;
use skycast_core::{AppError, Config, ConfigError, UnitSystem};
use skycast_weather::{
    DeviceGeolocation, DisplayReading, FixedPosition, IconCategory, IpGeolocator,
    LocationResolver, Phase, PipelineController, PipelineSnapshot, ReverseGeocoder,
    UnsupportedDevice, WeatherAggregator, WeatherProvider, WeatherSnapshot,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("skycast: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load().map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;
    let validation = config.validate();
    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()).into());
    }

    skycast_core::init(&config.logging.level)?;
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    tracing::info!("Skycast started (config in {})", config.config_dir.display());

    let provider = WeatherProvider::new(&config.weather)
        .map_err(|e| AppError::Weather(e.to_string()))?;
    let geocoder = ReverseGeocoder::new(&config.location.reverse_geocode_url)
        .map_err(|e| AppError::Weather(e.to_string()))?;
    let aggregator = WeatherAggregator::new(provider, geocoder);
    let ip = IpGeolocator::new(&config.location.ip_lookup_url)
        .map_err(|e| AppError::Location(e.to_string()))?;

    let configured = config
        .location
        .device_position
        .as_ref()
        .and_then(|p| skycast_weather::Coordinates::new(p.latitude, p.longitude));

    match configured {
        Some(coordinates) => {
            let resolver = LocationResolver::new(FixedPosition(coordinates), ip);
            report(PipelineController::new(resolver, aggregator), config.weather.units).await
        }
        None => {
            let resolver = LocationResolver::new(UnsupportedDevice, ip);
            report(PipelineController::new(resolver, aggregator), config.weather.units).await
        }
    }
}

async fn report<D: DeviceGeolocation>(
    pipeline: PipelineController<D>,
    units: UnitSystem,
) -> Result<(), AppError> {
    pipeline.start_run().await;
    let view = pipeline.snapshot();

    match view.phase {
        Phase::Ready => {
            print_ready(&pipeline, &view, units);
            Ok(())
        }
        Phase::LocationFailed => Err(AppError::Location(
            view.location_error.unwrap_or_default(),
        )),
        Phase::WeatherFailed => Err(AppError::Weather(
            view.weather_error.unwrap_or_default(),
        )),
        phase => Err(anyhow::anyhow!("Run ended in unexpected phase {:?}", phase).into()),
    }
}

/// Temperature and speed suffixes for the configured unit system
fn unit_labels(units: UnitSystem) -> (&'static str, &'static str) {
    match units {
        UnitSystem::Metric => ("°C", "m/s"),
        UnitSystem::Imperial => ("°F", "mph"),
    }
}

/// Current conditions, always from the realtime snapshot
fn format_current(snapshot: &WeatherSnapshot, units: UnitSystem) -> String {
    let (temp_unit, speed_unit) = unit_labels(units);
    format!(
        "Now: {:.1}{}  {}  humidity {:.0}%  wind {:.1} {}  UV {:.0}",
        snapshot.temperature,
        temp_unit,
        IconCategory::from_code(snapshot.weather_code).description(),
        snapshot.humidity,
        snapshot.wind_speed,
        speed_unit,
        snapshot.uv_index
    )
}

/// The selected hour; `None` when the reading is not tied to an hour
fn format_selected(reading: &DisplayReading, units: UnitSystem) -> Option<String> {
    let timestamp = reading.timestamp?;
    let (temp_unit, speed_unit) = unit_labels(units);
    Some(format!(
        "Selected {}: {:.1}{}  {}  humidity {:.0}%  wind {:.1} {}  UV {:.0}",
        timestamp.with_timezone(&Local).format("%a %H:%M"),
        reading.temperature,
        temp_unit,
        reading.icon.description(),
        reading.humidity,
        reading.wind_speed,
        speed_unit,
        reading.uv_index
    ))
}

fn print_ready<D: DeviceGeolocation>(
    pipeline: &PipelineController<D>,
    view: &PipelineSnapshot,
    units: UnitSystem,
) {
    let (temp_unit, _) = unit_labels(units);

    if let Some(location) = &view.location {
        println!("{} ({})", location.display_name, location.coordinates);
    }

    if let Some(snapshot) = &view.snapshot {
        println!("{}", format_current(snapshot, units));
    }
    if let Some(line) = pipeline.display().and_then(|r| format_selected(&r, units)) {
        println!("{}", line);
    }

    let Some(series) = &view.series else {
        return;
    };

    if !series.hourly().is_empty() {
        println!("\nNext hours:");
        for point in series.hourly() {
            println!(
                "  {}  {:>6.1}{}  {:>3.0}%  {}",
                point.timestamp.with_timezone(&Local).format("%a %H:%M"),
                point.temperature,
                temp_unit,
                point.precipitation_probability,
                IconCategory::from_code(point.weather_code).description()
            );
        }
    }

    if !series.daily().is_empty() {
        println!("\nNext days:");
        for day in series.daily() {
            println!(
                "  {}  {:>6.1} / {:>5.1}{}  {:>3.0}%  {}",
                day.date.with_timezone(&Local).format("%a %d %b"),
                day.temperature_min,
                day.temperature_max,
                temp_unit,
                day.precipitation_probability_avg,
                IconCategory::from_code(day.weather_code_max).description()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use skycast_weather::{project_reading, HourlyForecastPoint};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 21.5,
            apparent_temperature: 20.0,
            humidity: 35.0,
            wind_speed: 2.0,
            weather_code: 1000,
            precipitation_probability: 0.0,
            visibility: 16.0,
            pressure: 1012.0,
            uv_index: 6.0,
        }
    }

    fn rainy_hour() -> HourlyForecastPoint {
        HourlyForecastPoint {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap(),
            weather_code: 4001,
            temperature: 9.5,
            apparent_temperature: 7.0,
            humidity: 90.0,
            wind_speed: 8.0,
            precipitation_probability: 80.0,
            uv_index: 1.0,
        }
    }

    #[test]
    fn test_current_line_uses_realtime_snapshot_while_hour_selected() {
        let hourly = [rainy_hour()];
        let reading = project_reading(&snapshot(), &hourly, Some(0));

        let current = format_current(&snapshot(), UnitSystem::Metric);
        assert!(current.starts_with("Now: 21.5°C  Clear"), "{current}");
        assert!(current.contains("UV 6"));

        let selected = format_selected(&reading, UnitSystem::Metric).unwrap();
        assert!(selected.starts_with("Selected "), "{selected}");
        assert!(selected.contains("9.5°C  Rain Showers"));
    }

    #[test]
    fn test_unselected_reading_prints_no_hour_line() {
        let reading = project_reading(&snapshot(), &[], None);
        assert_eq!(format_selected(&reading, UnitSystem::Imperial), None);
        assert!(format_current(&snapshot(), UnitSystem::Imperial).contains("°F"));
    }
}
