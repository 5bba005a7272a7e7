use crate::analyzers::{DrillDownAggregator, WeatherAnalyzer};
use crate::cli::args::{Cli, Commands, SelectionArgs};
use crate::config::Settings;
use crate::dashboard::{
    build_page, ComparisonView, LevelState, Page, PageRequest, PageView, PlotData, PlotKind,
    Session, TrendState,
};
use crate::error::Result;
use crate::models::{ObservationTable, Variable};
use crate::readers::ObservationReader;
use crate::utils::filename::generate_default_export_filename;
use crate::writers::{ExportFormat, ParquetWriter, TableExporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(data_file = %settings.data_file.display(), "settings loaded");

    match cli.command {
        Commands::Info { file } => {
            let path = file.unwrap_or_else(|| settings.data_file.clone());
            println!("Analyzing Parquet file: {}", path.display());

            let reader = reader(&settings);
            let file_info = reader.file_info(&path)?;
            println!("\n{}", file_info.summary());

            let table = reader.read(&path)?;
            match table.span() {
                Some((first, last)) => println!("- Time span: {} to {}", first, last),
                None => println!("- Time span: no observations"),
            }
            let years = DrillDownAggregator::new().available_years(table.rows());
            let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
            println!("- Years: {}", years.join(", "));
        }

        Commands::Summary { file, json } => {
            let table = load(&settings, file)?;
            let stats = WeatherAnalyzer::new().analyze(&table)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", stats.detailed_summary());
            }
        }

        Commands::Page {
            file,
            page,
            selection,
            compare,
            from,
            to,
            plots,
            no_plots,
            json,
        } => {
            let mut request = page_request(page, &selection, plots, no_plots)?;
            request.compare_with = compare;
            if let (Some(start), Some(end)) = (from, to) {
                request = request.with_year_range(start, end);
            }

            let table = load(&settings, file)?;
            let session = Session::with_settings(Arc::new(table), &settings);
            let view = build_page(&session, &request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_page(&view);
            }
        }

        Commands::Aggregate {
            file,
            variable,
            granularity,
            reduction,
            selection,
            output,
            format,
            compression,
        } => {
            let selection = selection.to_selection()?;
            let table = load(&settings, file)?;

            let aggregator = DrillDownAggregator::new();
            let rows = aggregator.narrow(table.rows(), &selection);
            let reduction = reduction.unwrap_or_else(|| variable.default_reduction());
            let aggregate = aggregator.aggregate(rows, granularity, reduction);

            let format = format
                .or_else(|| output.as_deref().and_then(ExportFormat::from_path))
                .unwrap_or(ExportFormat::Csv);
            let output = output.unwrap_or_else(|| {
                generate_default_export_filename(
                    variable,
                    granularity,
                    &selection,
                    format.extension(),
                )
            });

            println!(
                "{} {} of {} for {}: {} buckets",
                granularity.adjective(),
                reduction.noun().to_lowercase(),
                variable,
                selection,
                aggregate.len()
            );
            match aggregator.extremum_summary(&aggregate, variable) {
                Ok(summary) => {
                    println!("  Highest: {:.2} ({})", summary.max.value, summary.max.label);
                    println!("  Lowest:  {:.2} ({})", summary.min.value, summary.min.label);
                }
                Err(e) if e.is_no_data() => println!("  No data: {}", e),
                Err(e) => return Err(e),
            }

            let exporter = TableExporter::new()
                .with_parquet_writer(ParquetWriter::new().with_compression(&compression)?);
            exporter.export(&aggregate, &output, format)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

/// A page request showing the page's default plot unless plots are named or turned off.
fn page_request(
    page: Page,
    selection: &SelectionArgs,
    plots: Vec<PlotKind>,
    no_plots: bool,
) -> Result<PageRequest> {
    let request = PageRequest::new(page).with_selection(selection.to_selection()?);
    Ok(if no_plots {
        request.with_plots(Vec::new())
    } else {
        request.with_plots_or_default(plots)
    })
}

fn reader(settings: &Settings) -> ObservationReader {
    ObservationReader::new()
        .with_timestamp_column(settings.timestamp_column.clone())
        .with_batch_size(settings.batch_size)
        .with_progress(true)
}

fn load(settings: &Settings, file: Option<PathBuf>) -> Result<ObservationTable> {
    let path = file.unwrap_or_else(|| settings.data_file.clone());
    read_table(settings, &path)
}

fn read_table(settings: &Settings, path: &Path) -> Result<ObservationTable> {
    let table = reader(settings).read(path)?;
    println!("Loaded {} observations from {}", table.len(), path.display());
    Ok(table)
}

fn value(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_series(variable: Variable, series: &[(chrono::NaiveDateTime, Option<f64>)]) {
    println!("    {}", variable);
    for (bucket, v) in series {
        println!("      {}  {}", bucket, value(*v));
    }
}

fn print_page(view: &PageView) {
    let unit = view.overview.variable.unit();
    println!("\n{}", view.title);
    println!("{}", "=".repeat(view.title.len()));
    for (name, v) in view.overview.headline() {
        println!("{}: {} {}", name, value(v), unit);
    }

    let reduction = view.page.reduction();
    match view.yearly.years {
        Some((start, end)) => println!("\nYearly {} {}-{}", reduction.noun(), start, end),
        None => println!("\nYearly {}", reduction.noun()),
    }
    match &view.yearly.state {
        TrendState::Data { series } => print_series(view.yearly.variable, series),
        TrendState::NoData { reason } => println!("  No data: {}", reason),
    }

    for level in &view.levels {
        println!("\n{} {}", level.heading(), reduction.noun());
        match &level.state {
            LevelState::Data {
                series,
                extremes,
                comparison,
                polar,
            } => {
                println!(
                    "  Highest: {:.2} {} ({})",
                    extremes.max.value, unit, extremes.max.label
                );
                if let Some(min) = &extremes.min {
                    println!("  Lowest:  {:.2} {} ({})", min.value, unit, min.label);
                }
                print_series(view.overview.variable, series);
                match comparison {
                    Some(ComparisonView::Data { variable, series }) => {
                        print_series(*variable, series)
                    }
                    Some(ComparisonView::NoData { variable, reason }) => {
                        println!("    {}: no data ({})", variable, reason)
                    }
                    None => {}
                }
                for point in polar {
                    println!(
                        "      {}  {:.0}° {}  {:.2} km/h",
                        point.bucket, point.direction, point.compass, point.speed
                    );
                }
            }
            LevelState::NoData { reason } => println!("  No data: {}", reason),
        }
    }

    for plot in &view.distributions {
        match plot {
            PlotData::Kde(curve) => println!(
                "\nKDE Plot: {} points, bandwidth {:.3}",
                curve.points.len(),
                curve.bandwidth
            ),
            PlotData::Histogram(bins) => {
                println!("\nHistogram:");
                for bin in bins.iter().filter(|b| b.count > 0) {
                    println!("  {:>8.2} .. {:>8.2}  {}", bin.lower, bin.upper, bin.count);
                }
            }
            PlotData::BoxPlot(stats) => println!(
                "\nBox Plot: whiskers {:.2}..{:.2}, quartiles {:.2}/{:.2}/{:.2}, IQR {:.2}, {} outliers",
                stats.lower_whisker,
                stats.upper_whisker,
                stats.q1,
                stats.median,
                stats.q3,
                stats.iqr(),
                stats.outliers.len()
            ),
            PlotData::Rose { sectors, .. } => {
                println!("\nRose Plot:");
                for sector in sectors.iter().filter(|s| s.count > 0) {
                    println!("  {:>5.1}° .. {:>5.1}°  {}", sector.start, sector.end, sector.count);
                }
            }
            PlotData::NoData { kind, reason } => println!("\n{}: no data ({})", kind, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_request_defaults_to_first_plot() {
        let selection = SelectionArgs {
            year: Some(2021),
            ..SelectionArgs::default()
        };

        let request = page_request(Page::Wind, &selection, Vec::new(), false).unwrap();
        assert_eq!(request.plots, vec![Page::Wind.default_plot()]);
        assert_eq!(request.selection.to_string(), "2021");

        let chosen = page_request(Page::Wind, &selection, vec![PlotKind::Rose], false).unwrap();
        assert_eq!(chosen.plots, vec![PlotKind::Rose]);

        let none = page_request(Page::Wind, &selection, Vec::new(), true).unwrap();
        assert!(none.plots.is_empty());
    }

    #[test]
    fn test_page_request_rejects_month_without_year() {
        let selection = SelectionArgs {
            month: Some("March".to_string()),
            ..SelectionArgs::default()
        };
        assert!(page_request(Page::Precipitation, &selection, Vec::new(), false).is_err());
    }
}
