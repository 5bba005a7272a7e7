use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{ProcessingError, Result};
use crate::models::{AggregateTable, Variable};
use crate::utils::constants::{
    COMPASS_POINTS, DEFAULT_HISTOGRAM_BINS, DEFAULT_KDE_POINTS, DEFAULT_ROSE_BINS,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KdeCurve {
    pub bandwidth: f64,
    pub points: Vec<(f64, f64)>,
}

/// Angular sector of a wind rose, degrees clockwise from north.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoseSector {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarPoint {
    pub bucket: NaiveDateTime,
    pub direction: f64,
    pub speed: f64,
    pub compass: &'static str,
}

/// Data behind the optional distribution plots of a page.
#[derive(Debug, Clone, Copy)]
pub struct DistributionAnalyzer {
    histogram_bins: usize,
    rose_bins: usize,
    kde_points: usize,
}

impl DistributionAnalyzer {
    pub fn new() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            rose_bins: DEFAULT_ROSE_BINS,
            kde_points: DEFAULT_KDE_POINTS,
        }
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins.max(1);
        self
    }

    pub fn with_rose_bins(mut self, bins: usize) -> Self {
        self.rose_bins = bins.max(1);
        self
    }

    pub fn with_kde_points(mut self, points: usize) -> Self {
        self.kde_points = points.max(2);
        self
    }

    /// Equal-width bins over `[min, max]`; the last bin is closed.
    pub fn histogram(&self, values: &[f64]) -> Result<Vec<HistogramBin>> {
        let (mut lo, mut hi) = bounds(values)?;
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let bins = self.histogram_bins;
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: lo + width * i as f64,
                upper: lo + width * (i + 1) as f64,
                count,
            })
            .collect())
    }

    /// Quartiles by linear interpolation with 1.5 IQR whiskers.
    pub fn box_stats(&self, values: &[f64]) -> Result<BoxStats> {
        bounds(values)?;
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let lower_whisker = sorted.iter().copied().find(|v| *v >= low_fence).unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Ok(BoxStats {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }

    /// Gaussian KDE with Scott's bandwidth on an even grid.
    pub fn kde(&self, values: &[f64]) -> Result<KdeCurve> {
        let (lo, hi) = bounds(values)?;
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = if values.len() > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let bandwidth = variance.sqrt() * n.powf(-0.2);
        if bandwidth <= 0.0 || !bandwidth.is_finite() {
            return Err(ProcessingError::EmptyAggregate(
                "a density estimate needs at least two distinct values".to_string(),
            ));
        }

        let start = lo - 3.0 * bandwidth;
        let end = hi + 3.0 * bandwidth;
        let step = (end - start) / (self.kde_points - 1) as f64;
        let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

        let points = (0..self.kde_points)
            .map(|i| {
                let x = start + step * i as f64;
                let density = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                (x, density)
            })
            .collect();

        Ok(KdeCurve { bandwidth, points })
    }

    /// Direction counts per sector, first sector starting at north.
    pub fn wind_rose(&self, directions: &[f64]) -> Result<Vec<RoseSector>> {
        bounds(directions)?;
        let bins = self.rose_bins;
        let width = 360.0 / bins as f64;
        let mut counts = vec![0usize; bins];
        for d in directions {
            let idx = ((d.rem_euclid(360.0) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| RoseSector {
                start: width * i as f64,
                end: width * (i + 1) as f64,
                count,
            })
            .collect())
    }

    /// (direction, speed) per aggregate bucket where both are present.
    pub fn polar_points(&self, table: &AggregateTable) -> Vec<PolarPoint> {
        table
            .rows
            .iter()
            .filter_map(|r| {
                let direction = r.values.get(Variable::WindDirection)?;
                let speed = r.values.get(Variable::WindSpeed)?;
                Some(PolarPoint {
                    bucket: r.bucket,
                    direction,
                    speed,
                    compass: compass_point(direction),
                })
            })
            .collect()
    }
}

impl Default for DistributionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest of the eight compass points to a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let idx = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[idx]
}

fn bounds(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(ProcessingError::EmptyAggregate(
            "no values to describe".to_string(),
        ));
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((lo, hi))
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
