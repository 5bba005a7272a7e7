use chrono::{Datelike, Month, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcessingError;
use crate::models::{Measurements, Variable};

/// Calendar-aligned bucket width, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Year,
    Month,
    Day,
    Hour,
}

impl Granularity {
    /// Start of the bucket holding `timestamp`.
    pub fn bucket_start(&self, timestamp: &NaiveDateTime) -> NaiveDateTime {
        let date = timestamp.date();
        let start = match self {
            Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
            Granularity::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Granularity::Day | Granularity::Hour => Some(date),
        }
        .unwrap_or(date);
        let hour = match self {
            Granularity::Hour => timestamp.hour(),
            _ => 0,
        };
        start.and_hms_opt(hour, 0, 0).unwrap_or(*timestamp)
    }

    /// Display label for a bucket at this granularity.
    pub fn label(&self, bucket: &NaiveDateTime) -> BucketLabel {
        match self {
            Granularity::Year => BucketLabel::Timestamp(*bucket),
            Granularity::Month => Month::try_from(bucket.month() as u8)
                .map(BucketLabel::Month)
                .unwrap_or(BucketLabel::Timestamp(*bucket)),
            Granularity::Day => BucketLabel::Day(bucket.day()),
            Granularity::Hour => BucketLabel::Hour(bucket.hour()),
        }
    }

    pub fn finer(&self) -> Option<Granularity> {
        match self {
            Granularity::Year => Some(Granularity::Month),
            Granularity::Month => Some(Granularity::Day),
            Granularity::Day => Some(Granularity::Hour),
            Granularity::Hour => None,
        }
    }

    pub fn adjective(&self) -> &'static str {
        match self {
            Granularity::Year => "Yearly",
            Granularity::Month => "Monthly",
            Granularity::Day => "Daily",
            Granularity::Hour => "Hourly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Year => "year",
            Granularity::Month => "month",
            Granularity::Day => "day",
            Granularity::Hour => "hour",
        };
        f.write_str(name)
    }
}

impl FromStr for Granularity {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" | "yearly" | "y" => Ok(Granularity::Year),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            "day" | "daily" | "d" => Ok(Granularity::Day),
            "hour" | "hourly" | "h" => Ok(Granularity::Hour),
            other => Err(ProcessingError::InvalidFormat(format!(
                "Unknown granularity: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Mean,
    Sum,
}

impl Reduction {
    /// Final value from a running total over `count` present values.
    pub fn finish(&self, total: f64, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        match self {
            Reduction::Sum => Some(total),
            Reduction::Mean => Some(total / count as f64),
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            Reduction::Mean => "Averages",
            Reduction::Sum => "Totals",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::Mean => f.write_str("mean"),
            Reduction::Sum => f.write_str("sum"),
        }
    }
}

impl FromStr for Reduction {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(Reduction::Mean),
            "sum" | "total" => Ok(Reduction::Sum),
            other => Err(ProcessingError::InvalidFormat(format!(
                "Unknown reduction: {}",
                other
            ))),
        }
    }
}

/// How a bucket is named on a summary widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BucketLabel {
    Timestamp(NaiveDateTime),
    Month(Month),
    Day(u32),
    Hour(u32),
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLabel::Timestamp(ts) => write!(f, "{}", ts),
            BucketLabel::Month(m) => f.write_str(m.name()),
            BucketLabel::Day(d) => write!(f, "{}", d),
            BucketLabel::Hour(h) => write!(f, "{}", h),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub bucket: NaiveDateTime,
    pub values: Measurements,
    /// Source rows that fell into the bucket.
    pub count: usize,
}

/// One row per non-empty bucket, ascending by bucket start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub granularity: Granularity,
    pub reduction: Reduction,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buckets(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows.iter().map(|r| r.bucket)
    }

    /// (bucket, value) pairs of one variable, ready for a line chart.
    pub fn series(&self, variable: Variable) -> Vec<(NaiveDateTime, Option<f64>)> {
        self.rows
            .iter()
            .map(|r| (r.bucket, r.values.get(variable)))
            .collect()
    }
}

/// Value and bucket of one extreme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extreme {
    pub value: f64,
    pub bucket: NaiveDateTime,
    pub label: BucketLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremumSummary {
    pub variable: Variable,
    pub max: Extreme,
    pub min: Extreme,
}
