use crate::analyzers::{BoxStats, HistogramBin, KdeCurve, PolarPoint, RoseSector, VariableSummary};
use crate::dashboard::Session;
use crate::error::{ProcessingError, Result};
use crate::models::{
    AggregateTable, Extreme, Granularity, Reduction, Selection, Variable,
};
use crate::utils::constants::COMPASS_POINTS;
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// The per-variable pages of the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Precipitation,
    AirTemperature,
    RelativeHumidity,
    Wind,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Precipitation => "Precipitation",
            Page::AirTemperature => "Air Temperature",
            Page::RelativeHumidity => "Relative Humidity",
            Page::Wind => "Wind",
        }
    }

    pub fn primary(&self) -> Variable {
        match self {
            Page::Precipitation => Variable::Precipitation,
            Page::AirTemperature => Variable::AirTemperature,
            Page::RelativeHumidity => Variable::RelativeHumidity,
            Page::Wind => Variable::WindSpeed,
        }
    }

    pub fn reduction(&self) -> Reduction {
        self.primary().default_reduction()
    }

    /// Accumulated variables only report their wettest bucket.
    pub fn shows_min(&self) -> bool {
        !matches!(self, Page::Precipitation)
    }

    pub fn comparisons(&self) -> &'static [Variable] {
        match self {
            Page::Precipitation => &[],
            Page::AirTemperature => &[Variable::RelativeHumidity, Variable::WindSpeed],
            Page::RelativeHumidity => &[Variable::AirTemperature, Variable::WindSpeed],
            Page::Wind => &[Variable::AirTemperature, Variable::RelativeHumidity],
        }
    }

    pub fn plots(&self) -> &'static [PlotKind] {
        match self {
            Page::Precipitation | Page::AirTemperature => &[PlotKind::Kde, PlotKind::BoxPlot],
            Page::RelativeHumidity => &[PlotKind::Histogram, PlotKind::BoxPlot],
            Page::Wind => &[PlotKind::Histogram, PlotKind::BoxPlot, PlotKind::Rose],
        }
    }

    /// Plot shown when a request names none.
    pub fn default_plot(&self) -> PlotKind {
        self.plots()[0]
    }

    fn check_comparison(&self, variable: Variable) -> Result<Variable> {
        if self.comparisons().contains(&variable) {
            Ok(variable)
        } else {
            Err(ProcessingError::InvalidSelection(format!(
                "{} cannot be compared on the {} page",
                variable.label(),
                self
            )))
        }
    }

    fn check_plot(&self, kind: PlotKind) -> Result<PlotKind> {
        if self.plots().contains(&kind) {
            Ok(kind)
        } else {
            Err(ProcessingError::InvalidSelection(format!(
                "{} is not available on the {} page",
                kind, self
            )))
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = ProcessingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "precipitation" | "rain" => Ok(Page::Precipitation),
            "air_temperature" | "temperature" | "temp" => Ok(Page::AirTemperature),
            "relative_humidity" | "humidity" | "rh" => Ok(Page::RelativeHumidity),
            "wind" | "wind_speed" => Ok(Page::Wind),
            _ => Err(ProcessingError::InvalidSelection(format!("Unknown page: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    Kde,
    Histogram,
    BoxPlot,
    Rose,
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlotKind::Kde => "KDE Plot",
            PlotKind::Histogram => "Histogram",
            PlotKind::BoxPlot => "Box Plot",
            PlotKind::Rose => "Rose Plot",
        };
        f.write_str(name)
    }
}

impl FromStr for PlotKind {
    type Err = ProcessingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match key.as_str() {
            "kde" | "kdeplot" | "density" => Ok(PlotKind::Kde),
            "histogram" | "hist" => Ok(PlotKind::Histogram),
            "box" | "boxplot" => Ok(PlotKind::BoxPlot),
            "rose" | "roseplot" => Ok(PlotKind::Rose),
            _ => Err(ProcessingError::InvalidSelection(format!("Unknown plot: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: Page,
    pub selection: Selection,
    pub compare_with: Option<Variable>,
    /// Inclusive year range of the yearly trend; the full record when unset
    pub year_range: Option<(i32, i32)>,
    pub plots: Vec<PlotKind>,
}

impl PageRequest {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            selection: Selection::none(),
            compare_with: None,
            year_range: None,
            plots: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn compare_with(mut self, variable: Variable) -> Self {
        self.compare_with = Some(variable);
        self
    }

    pub fn with_year_range(mut self, start: i32, end: i32) -> Self {
        self.year_range = Some((start, end));
        self
    }

    pub fn with_plots(mut self, plots: Vec<PlotKind>) -> Self {
        self.plots = plots;
        self
    }

    /// `plots`, or the page's default plot when empty.
    pub fn with_plots_or_default(self, plots: Vec<PlotKind>) -> Self {
        let plots = if plots.is_empty() {
            vec![self.page.default_plot()]
        } else {
            plots
        };
        self.with_plots(plots)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendView {
    pub variable: Variable,
    pub years: Option<(i32, i32)>,
    pub state: TrendState,
}

impl TrendView {
    /// The yearly series; empty when there is nothing to plot.
    pub fn series(&self) -> &[(NaiveDateTime, Option<f64>)] {
        match &self.state {
            TrendState::Data { series } => series,
            TrendState::NoData { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrendState {
    Data {
        series: Vec<(NaiveDateTime, Option<f64>)>,
    },
    NoData {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtremesView {
    pub max: Extreme,
    pub min: Option<Extreme>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ComparisonView {
    Data {
        variable: Variable,
        series: Vec<(NaiveDateTime, Option<f64>)>,
    },
    NoData {
        variable: Variable,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LevelState {
    Data {
        series: Vec<(NaiveDateTime, Option<f64>)>,
        extremes: ExtremesView,
        comparison: Option<ComparisonView>,
        polar: Vec<PolarPoint>,
    },
    NoData {
        reason: String,
    },
}

impl LevelState {
    pub fn is_no_data(&self) -> bool {
        matches!(self, LevelState::NoData { .. })
    }
}

/// One drill-down level: the buckets one step finer than `selection`.
#[derive(Debug, Clone, Serialize)]
pub struct LevelView {
    pub selection: Selection,
    pub granularity: Granularity,
    pub state: LevelState,
}

impl LevelView {
    pub fn heading(&self) -> String {
        format!("{} {}", self.granularity.adjective(), self.selection)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "plot", content = "data", rename_all = "snake_case")]
pub enum PlotData {
    Kde(KdeCurve),
    Histogram(Vec<HistogramBin>),
    BoxPlot(BoxStats),
    Rose {
        sectors: Vec<RoseSector>,
        compass: [&'static str; 8],
    },
    NoData {
        kind: PlotKind,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub overview: VariableSummary,
    pub yearly: TrendView,
    pub levels: Vec<LevelView>,
    pub distributions: Vec<PlotData>,
}

/// Assemble every section of a page for one request.
///
/// A section the request cannot fill (an inverted year range, a comparison
/// or plot the page does not offer, a level without data) comes back as a
/// `NoData` entry so the rest of the page still renders. Only errors outside
/// the request itself fail the page.
pub fn build_page(session: &Session, request: &PageRequest) -> Result<PageView> {
    let page = request.page;
    let primary = page.primary();

    let table = session.table();
    let overview = session.summaries().summarize_variable(table, primary);
    let yearly = yearly_trend(session, request)?;

    let mut levels = Vec::new();
    for prefix in request.selection.prefixes() {
        levels.push(level_view(session, request, prefix)?);
    }

    let mut distributions = Vec::new();
    for plot in &request.plots {
        distributions.push(plot_data(session, page, *plot)?);
    }

    info!(
        page = %page,
        selection = %request.selection,
        levels = levels.len(),
        plots = distributions.len(),
        "built page"
    );

    Ok(PageView {
        page,
        title: page.title().to_string(),
        overview,
        yearly,
        levels,
        distributions,
    })
}

fn yearly_trend(session: &Session, request: &PageRequest) -> Result<TrendView> {
    let aggregator = session.aggregator();
    let primary = request.page.primary();
    let yearly = aggregator.aggregate(
        session.table().rows(),
        Granularity::Year,
        request.page.reduction(),
    );

    let (filtered, years) = match request.year_range {
        Some((start, end)) => (aggregator.range_filter(&yearly, start, end), Some((start, end))),
        None => {
            let years = yearly
                .rows
                .first()
                .zip(yearly.rows.last())
                .map(|(first, last)| (first.bucket.year(), last.bucket.year()));
            (Ok(yearly), years)
        }
    };

    let state = match filtered {
        Ok(table) if table.is_empty() => TrendState::NoData {
            reason: format!("no {} readings in the selected years", primary.label()),
        },
        Ok(table) => TrendState::Data {
            series: table.series(primary),
        },
        Err(e) if e.is_no_data() => {
            debug!(reason = %e, "yearly trend has no data");
            TrendState::NoData {
                reason: e.to_string(),
            }
        }
        Err(e) => return Err(e),
    };

    Ok(TrendView {
        variable: primary,
        years,
        state,
    })
}

fn level_view(session: &Session, request: &PageRequest, prefix: Selection) -> Result<LevelView> {
    let aggregator = session.aggregator();
    let page = request.page;
    let granularity = prefix.next_granularity();

    let rows = aggregator.narrow(session.table().rows(), &prefix);
    let aggregate = aggregator.aggregate(rows, granularity, page.reduction());

    let state = match aggregator.extremum_summary(&aggregate, page.primary()) {
        Ok(summary) => LevelState::Data {
            series: aggregate.series(page.primary()),
            extremes: ExtremesView {
                max: summary.max,
                min: page.shows_min().then_some(summary.min),
            },
            comparison: request.compare_with.map(|variable| {
                match page.check_comparison(variable) {
                    Ok(variable) => ComparisonView::Data {
                        variable,
                        series: aggregate.series(variable),
                    },
                    Err(e) => ComparisonView::NoData {
                        variable,
                        reason: e.to_string(),
                    },
                }
            }),
            polar: polar_points(session, page, &aggregate),
        },
        Err(e) if e.is_no_data() => {
            debug!(selection = %prefix, reason = %e, "level has no data");
            LevelState::NoData {
                reason: e.to_string(),
            }
        }
        Err(e) => return Err(e),
    };

    Ok(LevelView {
        selection: prefix,
        granularity,
        state,
    })
}

fn polar_points(session: &Session, page: Page, aggregate: &AggregateTable) -> Vec<PolarPoint> {
    match page {
        Page::Wind => session.distributions().polar_points(aggregate),
        _ => Vec::new(),
    }
}

fn plot_data(session: &Session, page: Page, kind: PlotKind) -> Result<PlotData> {
    let analyzer = session.distributions();
    let table = session.table();
    let primary = page.primary();

    let result = page.check_plot(kind).and_then(|kind| match kind {
        PlotKind::Kde => {
            let values: Vec<f64> = table.values(primary).collect();
            analyzer.kde(&values).map(PlotData::Kde)
        }
        PlotKind::Histogram => {
            let values: Vec<f64> = table.values(primary).collect();
            analyzer.histogram(&values).map(PlotData::Histogram)
        }
        PlotKind::BoxPlot => {
            let values: Vec<f64> = table.values(primary).collect();
            analyzer.box_stats(&values).map(PlotData::BoxPlot)
        }
        PlotKind::Rose => {
            let directions: Vec<f64> = table.values(Variable::WindDirection).collect();
            analyzer.wind_rose(&directions).map(|sectors| PlotData::Rose {
                sectors,
                compass: COMPASS_POINTS,
            })
        }
    });

    match result {
        Ok(data) => Ok(data),
        Err(e) if e.is_no_data() => {
            debug!(plot = %kind, reason = %e, "plot has no data");
            Ok(PlotData::NoData {
                kind,
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}
