//! Weather code classification.
//!
//! Provider codes follow the Tomorrow.io table (`1000` clear, `4001` rain, ...).
//! Icon and logo categories are derived independently from the raw code.

use serde::{Deserialize, Serialize};

/// Icon shown next to a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Clear,
    MostlyClear,
    PartlyCloudy,
    MostlyCloudy,
    Cloudy,
    Fog,
    Rain,
    RainShowers,
    RainThunderstorm,
    Snow,
    Flurries,
    SnowShowers,
    FreezingRain,
    IcePellets,
    Thunderstorm,
    Unknown,
}

impl IconCategory {
    /// Convert a provider weather code; unmapped codes yield `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::Clear,
            1100 => Self::MostlyClear,
            1101 => Self::PartlyCloudy,
            1102 => Self::MostlyCloudy,
            1001 => Self::Cloudy,
            2000 | 2100 => Self::Fog,
            4000 | 4200 => Self::Rain,
            4001 | 4201 => Self::RainShowers,
            8001..=8003 => Self::RainThunderstorm,
            5000 | 5100 => Self::Snow,
            5001 => Self::Flurries,
            5101 => Self::SnowShowers,
            6000 | 6001 | 6200 | 6201 => Self::FreezingRain,
            7000 | 7101 | 7102 => Self::IcePellets,
            8000 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::MostlyCloudy => "Mostly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::RainShowers => "Rain Showers",
            Self::RainThunderstorm => "Rain and Thunderstorm",
            Self::Snow => "Snow",
            Self::Flurries => "Flurries",
            Self::SnowShowers => "Snow Showers",
            Self::FreezingRain => "Freezing Rain",
            Self::IcePellets => "Ice Pellets",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }

    /// Stable icon asset name
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "clear_day",
            Self::MostlyClear => "mostly_clear_day",
            Self::PartlyCloudy => "partly_cloudy_day",
            Self::MostlyCloudy => "mostly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::Rain => "rain",
            Self::RainShowers => "rain_showers",
            Self::RainThunderstorm => "rain_thunderstorm",
            Self::Snow => "snow",
            Self::Flurries => "flurries",
            Self::SnowShowers => "snow_showers",
            Self::FreezingRain => "freezing_rain",
            Self::IcePellets => "ice_pellets",
            Self::Thunderstorm => "tstorm",
            Self::Unknown => "unknown",
        }
    }
}

/// Coarse classification used for the app logo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoCategory {
    Clear,
    Rain,
    Snow,
    Default,
}

impl LogoCategory {
    /// Rain family -> `Rain`, snow/ice family -> `Snow`, `1000` -> `Clear`,
    /// everything else -> `Default`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::Clear,
            4000 | 4001 | 4200 | 4201 => Self::Rain,
            5000 | 5001 | 5100 | 5101 | 6000 | 6001 | 6200 | 6201 | 7000 | 7101 | 7102 => {
                Self::Snow
            }
            _ => Self::Default,
        }
    }
}
