//! Pipeline run state machine.
//!
//! A run moves `ResolvingLocation -> {LocationFailed | LocationResolved} ->
//! FetchingWeather -> {WeatherFailed | Ready}`. Every run takes a new
//! generation number; a run only writes state while its generation is the
//! latest, so a slow earlier run can never overwrite a newer one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::aggregator::WeatherAggregator;
use crate::classify::{IconCategory, LogoCategory};
use crate::location::{DeviceGeolocation, LocationResolver};
use crate::types::{
    Coordinates, ForecastSeries, HourlyForecastPoint, LocationError, LocationInfo,
    PipelineResult, WeatherError, WeatherSnapshot,
};

/// Phase of the current run, as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ResolvingLocation,
    LocationFailed,
    LocationResolved,
    FetchingWeather,
    WeatherFailed,
    Ready,
}

impl Phase {
    /// True while a run is in flight.
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            Phase::ResolvingLocation | Phase::LocationResolved | Phase::FetchingWeather
        )
    }
}

/// How a call to [`PipelineController::start_run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run reached a terminal phase and committed it
    Finished(Phase),
    /// A newer run started meanwhile; this run's results were discarded
    Superseded,
}

/// Rejected hourly selections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No weather data is ready")]
    NotReady,
    #[error("Point is not part of the current hourly forecast")]
    NotInSeries,
}

/// Values shown for the selected hour, or for current conditions when no
/// hour is selected
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayReading {
    /// `None` when showing current conditions
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub uv_index: f64,
    pub weather_code: i32,
    pub icon: IconCategory,
    pub logo: LogoCategory,
}

/// Pure projection over `(snapshot, hourly, selection)`.
pub fn project_reading(
    snapshot: &WeatherSnapshot,
    hourly: &[HourlyForecastPoint],
    selected: Option<usize>,
) -> DisplayReading {
    match selected.and_then(|i| hourly.get(i)) {
        Some(point) => DisplayReading {
            timestamp: Some(point.timestamp),
            temperature: point.temperature,
            humidity: point.humidity,
            wind_speed: point.wind_speed,
            uv_index: point.uv_index,
            weather_code: point.weather_code,
            icon: IconCategory::from_code(point.weather_code),
            logo: LogoCategory::from_code(point.weather_code),
        },
        None => DisplayReading {
            timestamp: None,
            temperature: snapshot.temperature,
            humidity: snapshot.humidity,
            wind_speed: snapshot.wind_speed,
            uv_index: snapshot.uv_index,
            weather_code: snapshot.weather_code,
            icon: IconCategory::from_code(snapshot.weather_code),
            logo: LogoCategory::from_code(snapshot.weather_code),
        },
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSnapshot {
    pub phase: Phase,
    pub generation: u64,
    pub coordinates: Option<Coordinates>,
    pub location: Option<LocationInfo>,
    pub location_error: Option<String>,
    pub snapshot: Option<WeatherSnapshot>,
    pub series: Option<ForecastSeries>,
    pub weather_error: Option<String>,
    pub selection: Option<HourlyForecastPoint>,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
enum RunState {
    Idle,
    ResolvingLocation,
    LocationFailed(LocationError),
    LocationResolved(Coordinates),
    FetchingWeather(Coordinates),
    WeatherFailed {
        coordinates: Coordinates,
        error: WeatherError,
    },
    Ready {
        result: Arc<PipelineResult>,
        selected: Option<usize>,
    },
}

impl RunState {
    fn phase(&self) -> Phase {
        match self {
            RunState::Idle => Phase::Idle,
            RunState::ResolvingLocation => Phase::ResolvingLocation,
            RunState::LocationFailed(_) => Phase::LocationFailed,
            RunState::LocationResolved(_) => Phase::LocationResolved,
            RunState::FetchingWeather(_) => Phase::FetchingWeather,
            RunState::WeatherFailed { .. } => Phase::WeatherFailed,
            RunState::Ready { .. } => Phase::Ready,
        }
    }
}

#[derive(Debug)]
struct Inner {
    generation: u64,
    state: RunState,
}

/// Sequences location resolution and weather aggregation and owns the
/// current result and hourly selection.
pub struct PipelineController<D> {
    resolver: LocationResolver<D>,
    aggregator: WeatherAggregator,
    inner: Mutex<Inner>,
}

impl<D: DeviceGeolocation> PipelineController<D> {
    pub fn new(resolver: LocationResolver<D>, aggregator: WeatherAggregator) -> Self {
        Self {
            resolver,
            aggregator,
            inner: Mutex::new(Inner {
                generation: 0,
                state: RunState::Idle,
            }),
        }
    }

    /// Generation of the most recently started run (0 before the first)
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Start a run from any phase. Prior results and errors are dropped
    /// immediately. Failures are terminal for the run; nothing is retried.
    pub async fn start_run(&self) -> RunOutcome {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state = RunState::ResolvingLocation;
            inner.generation
        };
        tracing::info!("Starting pipeline run {}", generation);

        let coordinates = match self.resolver.resolve().await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::error!("Run {}: location resolution failed: {}", generation, e);
                return self.finish(generation, RunState::LocationFailed(e));
            }
        };

        if !self.commit(generation, RunState::LocationResolved(coordinates))
            || !self.commit(generation, RunState::FetchingWeather(coordinates))
        {
            return RunOutcome::Superseded;
        }

        match self.aggregator.fetch_all(coordinates).await {
            Ok(result) => {
                let selected = (!result.series.hourly().is_empty()).then_some(0);
                self.finish(
                    generation,
                    RunState::Ready {
                        result: Arc::new(result),
                        selected,
                    },
                )
            }
            Err(error) => {
                tracing::error!("Run {}: weather aggregation failed: {}", generation, error);
                self.finish(generation, RunState::WeatherFailed { coordinates, error })
            }
        }
    }

    /// Select the hourly point whose values are displayed. Only allowed in
    /// `Ready` and only with a point from the current hourly sequence.
    pub fn select_hourly(&self, point: &HourlyForecastPoint) -> Result<(), SelectionError> {
        let mut inner = self.inner.lock();
        match &mut inner.state {
            RunState::Ready { result, selected } => {
                let index = result
                    .series
                    .hourly()
                    .iter()
                    .position(|p| p == point)
                    .ok_or(SelectionError::NotInSeries)?;
                *selected = Some(index);
                Ok(())
            }
            _ => Err(SelectionError::NotReady),
        }
    }

    /// Fully formed view of the current state
    pub fn snapshot(&self) -> PipelineSnapshot {
        let inner = self.inner.lock();
        let phase = inner.state.phase();
        let mut view = PipelineSnapshot {
            phase,
            generation: inner.generation,
            is_loading: phase.is_loading(),
            ..PipelineSnapshot::default()
        };

        match &inner.state {
            RunState::Idle | RunState::ResolvingLocation => {}
            RunState::LocationFailed(e) => view.location_error = Some(e.to_string()),
            RunState::LocationResolved(c) | RunState::FetchingWeather(c) => {
                view.coordinates = Some(*c);
            }
            RunState::WeatherFailed { coordinates, error } => {
                view.coordinates = Some(*coordinates);
                view.weather_error = Some(error.user_message().to_string());
            }
            RunState::Ready { result, selected } => {
                view.coordinates = Some(result.location.coordinates);
                view.location = Some(result.location.clone());
                view.snapshot = Some(result.snapshot.clone());
                view.series = Some(result.series.clone());
                view.selection = selected.and_then(|i| result.series.hourly().get(i).cloned());
            }
        }

        view
    }

    /// Values to display, following the hourly selection when there is one
    pub fn display(&self) -> Option<DisplayReading> {
        match &self.inner.lock().state {
            RunState::Ready { result, selected } => Some(project_reading(
                &result.snapshot,
                result.series.hourly(),
                *selected,
            )),
            _ => None,
        }
    }

    fn finish(&self, generation: u64, state: RunState) -> RunOutcome {
        let phase = state.phase();
        if self.commit(generation, state) {
            tracing::info!("Run {} finished in {:?}", generation, phase);
            RunOutcome::Finished(phase)
        } else {
            RunOutcome::Superseded
        }
    }

    /// Write `state` only if `generation` is still the latest run.
    fn commit(&self, generation: u64, state: RunState) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(
                "Discarding {:?} from stale run {} (latest is {})",
                state.phase(),
                generation,
                inner.generation
            );
            return false;
        }
        inner.state = state;
        true
    }
}
