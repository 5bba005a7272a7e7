use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcessingError;
use crate::models::aggregate::Reduction;
use crate::utils::constants::QUALITY_SUFFIX;

/// One of the five measured quantities of the MET station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Precipitation,
    AirTemperature,
    RelativeHumidity,
    WindSpeed,
    WindDirection,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::Precipitation,
        Variable::AirTemperature,
        Variable::RelativeHumidity,
        Variable::WindSpeed,
        Variable::WindDirection,
    ];

    /// Column name in the source Parquet file.
    pub fn column_name(&self) -> &'static str {
        match self {
            Variable::Precipitation => "Precipitation (mm)",
            Variable::AirTemperature => "Air Temperature (°C)",
            Variable::RelativeHumidity => "Relative Humidity (%RH)",
            Variable::WindSpeed => "Wind Speed (km/h)",
            Variable::WindDirection => "Wind Direction (°)",
        }
    }

    pub fn quality_column_name(&self) -> String {
        format!("{}{}", self.column_name(), QUALITY_SUFFIX)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variable::Precipitation => "Precipitation",
            Variable::AirTemperature => "Air Temperature",
            Variable::RelativeHumidity => "Relative Humidity",
            Variable::WindSpeed => "Wind Speed",
            Variable::WindDirection => "Wind Direction",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Precipitation => "mm",
            Variable::AirTemperature => "°C",
            Variable::RelativeHumidity => "%RH",
            Variable::WindSpeed => "km/h",
            Variable::WindDirection => "°",
        }
    }

    /// Short machine name, also used as the CSV export header.
    pub fn key(&self) -> &'static str {
        match self {
            Variable::Precipitation => "precipitation",
            Variable::AirTemperature => "air_temperature",
            Variable::RelativeHumidity => "relative_humidity",
            Variable::WindSpeed => "wind_speed",
            Variable::WindDirection => "wind_direction",
        }
    }

    /// Precipitation accumulates; everything else is averaged.
    pub fn default_reduction(&self) -> Reduction {
        match self {
            Variable::Precipitation => Reduction::Sum,
            _ => Reduction::Mean,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.unit())
    }
}

impl FromStr for Variable {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let variable = match normalized.as_str() {
            "precipitation" | "precip" | "rain" => Variable::Precipitation,
            "air_temperature" | "temperature" | "temp" => Variable::AirTemperature,
            "relative_humidity" | "humidity" | "rh" => Variable::RelativeHumidity,
            "wind_speed" | "wind" => Variable::WindSpeed,
            "wind_direction" | "direction" => Variable::WindDirection,
            _ => Variable::ALL
                .into_iter()
                .find(|v| v.column_name() == s.trim())
                .ok_or_else(|| ProcessingError::UnknownVariable(s.to_string()))?,
        };
        Ok(variable)
    }
}
