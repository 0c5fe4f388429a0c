//! Weather pipeline for Skycast
//!
//! Resolves a location (device first, IP fallback), fetches current
//! conditions plus hourly and daily forecasts from Tomorrow.io, and tracks
//! the run in a generation-guarded state machine.

pub mod aggregator;
pub mod classify;
pub mod geocode;
pub mod location;
pub mod pipeline;
pub mod provider;
pub mod types;

pub use aggregator::WeatherAggregator;
pub use classify::{IconCategory, LogoCategory};
pub use geocode::{compose_place_name, ReverseGeocoder};
pub use location::{
    DeviceGeolocation, FixedPosition, IpGeolocator, LocationResolver, UnsupportedDevice,
};
pub use pipeline::{
    project_reading, DisplayReading, Phase, PipelineController, PipelineSnapshot, RunOutcome,
    SelectionError,
};
pub use provider::{Realtime, WeatherProvider};
pub use skycast_core::UnitSystem;
pub use types::*;
