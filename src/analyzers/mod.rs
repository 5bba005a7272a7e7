pub mod distribution;
pub mod drill_down;
pub mod quality;
pub mod weather_analyzer;

pub use distribution::{
    compass_point, BoxStats, DistributionAnalyzer, HistogramBin, KdeCurve, PolarPoint, RoseSector,
};
pub use drill_down::DrillDownAggregator;
pub use quality::{QualityCount, QualityDistribution, QualityTally, VariableQuality};
pub use weather_analyzer::{VariableSummary, WeatherAnalyzer, WeatherStatistics};
