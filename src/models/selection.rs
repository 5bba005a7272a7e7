use chrono::Month;
use serde::Serialize;
use std::fmt;

use crate::error::{ProcessingError, Result};
use crate::models::Granularity;

/// How deep the year → month → day chain currently reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SelectionLevel {
    NoSelection,
    YearSelected,
    MonthSelected,
    DaySelected,
}

/// Optional year, month and day, always parent-before-child.
///
/// A month is only held together with a year and a day only together with a
/// month; the constructors reject anything else with `InvalidSelection`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    year: Option<i32>,
    month: Option<Month>,
    day: Option<u32>,
}

impl Selection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(year: Option<i32>, month: Option<Month>, day: Option<u32>) -> Result<Self> {
        if month.is_some() && year.is_none() {
            return Err(ProcessingError::InvalidSelection(
                "a month requires a year".to_string(),
            ));
        }
        if day.is_some() && month.is_none() {
            return Err(ProcessingError::InvalidSelection(
                "a day requires a month".to_string(),
            ));
        }
        if let Some(d) = day {
            if !(1..=31).contains(&d) {
                return Err(ProcessingError::InvalidSelection(format!(
                    "day {} is not a day of the month",
                    d
                )));
            }
        }
        Ok(Self { year, month, day })
    }

    /// Build from UI-style input, where the month arrives as its name.
    pub fn parse(year: Option<i32>, month: Option<&str>, day: Option<u32>) -> Result<Self> {
        let month = month.map(parse_month).transpose()?;
        Self::new(year, month, day)
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn level(&self) -> SelectionLevel {
        match (self.year, self.month, self.day) {
            (Some(_), Some(_), Some(_)) => SelectionLevel::DaySelected,
            (Some(_), Some(_), None) => SelectionLevel::MonthSelected,
            (Some(_), None, _) => SelectionLevel::YearSelected,
            _ => SelectionLevel::NoSelection,
        }
    }

    /// Granularity shown once this selection has narrowed the data.
    pub fn next_granularity(&self) -> Granularity {
        let deepest = match self.level() {
            SelectionLevel::NoSelection => return Granularity::Year,
            SelectionLevel::YearSelected => Granularity::Year,
            SelectionLevel::MonthSelected => Granularity::Month,
            SelectionLevel::DaySelected => Granularity::Day,
        };
        deepest.finer().unwrap_or(Granularity::Hour)
    }

    /// Choosing a year starts a new chain, so deeper levels are cleared.
    pub fn select_year(self, year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
            day: None,
        }
    }

    pub fn select_month(self, month: Month) -> Result<Self> {
        Self::new(self.year, Some(month), None)
    }

    pub fn select_day(self, day: u32) -> Result<Self> {
        Self::new(self.year, self.month, Some(day))
    }

    pub fn clear_year(self) -> Self {
        Self::none()
    }

    pub fn clear_month(self) -> Self {
        Self {
            year: self.year,
            month: None,
            day: None,
        }
    }

    pub fn clear_day(self) -> Self {
        Self { day: None, ..self }
    }

    /// The chain prefixes, shallowest first: year, year+month, year+month+day.
    pub fn prefixes(&self) -> Vec<Selection> {
        let mut prefixes = Vec::new();
        if let Some(year) = self.year {
            prefixes.push(Selection::none().select_year(year));
            if let Some(month) = self.month {
                prefixes.push(Selection {
                    year: Some(year),
                    month: Some(month),
                    day: None,
                });
                if self.day.is_some() {
                    prefixes.push(*self);
                }
            }
        }
        prefixes
    }

}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => write!(f, "{} {} {}", d, m.name(), y),
            (Some(y), Some(m), None) => write!(f, "{} {}", m.name(), y),
            (Some(y), None, _) => write!(f, "{}", y),
            _ => write!(f, "all years"),
        }
    }
}

/// Full English month name or its three-letter abbreviation, any case.
pub fn parse_month(name: &str) -> Result<Month> {
    name.trim()
        .parse::<Month>()
        .map_err(|_| ProcessingError::InvalidSelection(format!("unknown month '{}'", name)))
}
