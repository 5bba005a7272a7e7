use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::models::Variable;

/// One value per measured variable; `None` marks a missing reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub precipitation: Option<f64>,
    pub air_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

impl Measurements {
    pub fn get(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Precipitation => self.precipitation,
            Variable::AirTemperature => self.air_temperature,
            Variable::RelativeHumidity => self.relative_humidity,
            Variable::WindSpeed => self.wind_speed,
            Variable::WindDirection => self.wind_direction,
        }
    }

    pub fn set(&mut self, variable: Variable, value: Option<f64>) {
        // NaN is how the source encodes a gap
        let value = value.filter(|v| !v.is_nan());
        match variable {
            Variable::Precipitation => self.precipitation = value,
            Variable::AirTemperature => self.air_temperature = value,
            Variable::RelativeHumidity => self.relative_humidity = value,
            Variable::WindSpeed => self.wind_speed = value,
            Variable::WindDirection => self.wind_direction = value,
        }
    }

    pub fn with(mut self, variable: Variable, value: f64) -> Self {
        self.set(variable, Some(value));
        self
    }
}

/// Quality flag label per variable, as recorded by the station.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub precipitation: Option<String>,
    pub air_temperature: Option<String>,
    pub relative_humidity: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
}

impl QualityFlags {
    pub fn get(&self, variable: Variable) -> Option<&str> {
        match variable {
            Variable::Precipitation => self.precipitation.as_deref(),
            Variable::AirTemperature => self.air_temperature.as_deref(),
            Variable::RelativeHumidity => self.relative_humidity.as_deref(),
            Variable::WindSpeed => self.wind_speed.as_deref(),
            Variable::WindDirection => self.wind_direction.as_deref(),
        }
    }

    pub fn set(&mut self, variable: Variable, flag: Option<String>) {
        match variable {
            Variable::Precipitation => self.precipitation = flag,
            Variable::AirTemperature => self.air_temperature = flag,
            Variable::RelativeHumidity => self.relative_humidity = flag,
            Variable::WindSpeed => self.wind_speed = flag,
            Variable::WindDirection => self.wind_direction = flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub values: Measurements,
    pub quality: QualityFlags,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, values: Measurements) -> Self {
        Self {
            timestamp,
            values,
            quality: QualityFlags::default(),
        }
    }

    pub fn with_quality(mut self, quality: QualityFlags) -> Self {
        self.quality = quality;
        self
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        self.values.get(variable)
    }
}

/// The full station record, sorted by timestamp with no duplicates.
///
/// Built once per session and shared read-only; every drill-down step
/// works on borrowed slices of it.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(rows: Vec<Observation>) -> Result<Self> {
        for (i, pair) in rows.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ProcessingError::UnorderedTimestamps {
                    row: i + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last timestamp, if any rows are present.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// Present (non-missing) values of one variable, in time order.
    pub fn values(&self, variable: Variable) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().filter_map(move |r| r.value(variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_nan_is_missing() {
        let mut m = Measurements::default();
        m.set(Variable::AirTemperature, Some(f64::NAN));
        assert_eq!(m.air_temperature, None);
        m.set(Variable::AirTemperature, Some(4.5));
        assert_eq!(m.get(Variable::AirTemperature), Some(4.5));
    }

    #[test]
    fn test_table_rejects_unordered_rows() {
        let rows = vec![
            Observation::new(at(2), Measurements::default()),
            Observation::new(at(1), Measurements::default()),
        ];
        assert!(matches!(
            ObservationTable::new(rows),
            Err(ProcessingError::UnorderedTimestamps { row: 1, .. })
        ));
    }

    #[test]
    fn test_table_rejects_duplicate_timestamps() {
        let rows = vec![
            Observation::new(at(1), Measurements::default()),
            Observation::new(at(1), Measurements::default()),
        ];
        assert!(ObservationTable::new(rows).is_err());
    }

    #[test]
    fn test_span_and_values() {
        let rows = vec![
            Observation::new(at(1), Measurements::default().with(Variable::WindSpeed, 3.0)),
            Observation::new(at(2), Measurements::default()),
            Observation::new(at(3), Measurements::default().with(Variable::WindSpeed, 5.0)),
        ];
        let table = ObservationTable::new(rows).unwrap();
        assert_eq!(table.span(), Some((at(1), at(3))));
        assert_eq!(table.values(Variable::WindSpeed).collect::<Vec<_>>(), vec![3.0, 5.0]);
        assert!(ObservationTable::default().span().is_none());
    }
}
