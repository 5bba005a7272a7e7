pub mod page;

pub use page::{
    build_page, ComparisonView, ExtremesView, LevelState, LevelView, Page, PageRequest,
    PageView, PlotData, PlotKind, TrendState, TrendView,
};

use crate::analyzers::{DistributionAnalyzer, DrillDownAggregator, WeatherAnalyzer};
use crate::config::Settings;
use crate::models::ObservationTable;
use std::sync::Arc;

/// A loaded observation table plus the analyzers that read it.
///
/// The table is shared read-only; cloning a session is cheap and every
/// request recomputes its aggregates from scratch.
#[derive(Clone)]
pub struct Session {
    table: Arc<ObservationTable>,
    aggregator: DrillDownAggregator,
    distributions: DistributionAnalyzer,
}

impl Session {
    pub fn new(table: Arc<ObservationTable>) -> Self {
        Self {
            table,
            aggregator: DrillDownAggregator::new(),
            distributions: DistributionAnalyzer::new(),
        }
    }

    pub fn with_settings(table: Arc<ObservationTable>, settings: &Settings) -> Self {
        Self {
            distributions: DistributionAnalyzer::new()
                .with_histogram_bins(settings.histogram_bins)
                .with_rose_bins(settings.rose_bins)
                .with_kde_points(settings.kde_points),
            ..Self::new(table)
        }
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn aggregator(&self) -> &DrillDownAggregator {
        &self.aggregator
    }

    pub fn distributions(&self) -> &DistributionAnalyzer {
        &self.distributions
    }

    pub fn summaries(&self) -> WeatherAnalyzer {
        WeatherAnalyzer::new()
    }
}
