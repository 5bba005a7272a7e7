use chrono::{Duration, Month, NaiveDate, NaiveDateTime};
use nwfp_met::analyzers::{DrillDownAggregator, QualityTally, WeatherAnalyzer};
use nwfp_met::dashboard::{build_page, LevelState, Page, PageRequest, PlotKind, Session};
use nwfp_met::models::{
    BucketLabel, Granularity, Measurements, Observation, ObservationTable, QualityFlags,
    Reduction, Selection, Variable,
};
use nwfp_met::readers::ObservationReader;
use nwfp_met::writers::{ExportFormat, ParquetWriter, TableExporter};
use nwfp_met::ProcessingError;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// Two-hourly readings across 2020 and 2021 with every fifth precipitation gauge reading lost.
fn station_table() -> ObservationTable {
    let start = at(2020, 1, 1, 0);
    let end = at(2022, 1, 1, 0);
    let mut rows = Vec::new();
    let mut ts = start;
    let mut i = 0u32;
    while ts < end {
        let mut values = Measurements::default()
            .with(Variable::AirTemperature, 8.0 + (i % 12) as f64)
            .with(Variable::RelativeHumidity, 70.0 + (i % 20) as f64)
            .with(Variable::WindSpeed, 4.0 + (i % 6) as f64)
            .with(Variable::WindDirection, ((i * 15) % 360) as f64);
        values.set(
            Variable::Precipitation,
            if i % 5 == 0 { None } else { Some(0.1) },
        );

        let mut quality = QualityFlags::default();
        let flag = if i % 5 == 0 { "Missing" } else { "Good" };
        quality.set(Variable::Precipitation, Some(flag.to_string()));

        rows.push(Observation::new(ts, values).with_quality(quality));
        ts += Duration::hours(2);
        i += 1;
    }
    ObservationTable::new(rows).unwrap()
}

#[test]
fn test_parquet_roundtrip_through_reader() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("new_df.parquet");
    let table = station_table();

    ParquetWriter::new()
        .write_observations(&table, &path, 1000)
        .unwrap();

    let reader = ObservationReader::new();
    let file_info = reader.file_info(&path).unwrap();
    assert_eq!(file_info.total_rows as usize, table.len());

    let loaded = reader.read(&path).unwrap();
    assert_eq!(loaded.len(), table.len());
    assert_eq!(loaded.span(), table.span());
    assert_eq!(loaded.rows()[0], table.rows()[0]);
    assert_eq!(loaded.rows()[5].value(Variable::Precipitation), None);

    let quality = QualityTally::new().tally(&loaded);
    let precipitation = quality.get(Variable::Precipitation).unwrap();
    assert_eq!(
        precipitation.count_of(Some("Missing")) + precipitation.count_of(Some("Good")),
        loaded.len()
    );
    assert_eq!(
        quality.get(Variable::WindSpeed).unwrap().count_of(None),
        loaded.len()
    );
}

#[test]
fn test_daily_precipitation_total() {
    let rows: Vec<Observation> = [1.0, 2.0, 0.0, 3.0]
        .iter()
        .enumerate()
        .map(|(h, v)| {
            Observation::new(
                at(2021, 6, 1, h as u32),
                Measurements::default().with(Variable::Precipitation, *v),
            )
        })
        .collect();
    let table = ObservationTable::new(rows).unwrap();

    let daily = DrillDownAggregator::new().aggregate(table.rows(), Granularity::Day, Reduction::Sum);
    assert_eq!(
        daily.series(Variable::Precipitation),
        vec![(at(2021, 6, 1, 0), Some(6.0))]
    );
}

#[test]
fn test_yearly_range_filter() {
    let rows = vec![
        Observation::new(
            at(2020, 3, 1, 0),
            Measurements::default().with(Variable::AirTemperature, 10.0),
        ),
        Observation::new(
            at(2021, 3, 1, 0),
            Measurements::default().with(Variable::AirTemperature, 12.0),
        ),
    ];
    let table = ObservationTable::new(rows).unwrap();
    let aggregator = DrillDownAggregator::new();

    let yearly = aggregator.aggregate(table.rows(), Granularity::Year, Reduction::Mean);
    let filtered = aggregator.range_filter(&yearly, 2021, 2021).unwrap();
    assert_eq!(
        filtered.series(Variable::AirTemperature),
        vec![(at(2021, 1, 1, 0), Some(12.0))]
    );

    assert!(matches!(
        aggregator.range_filter(&yearly, 2021, 2020),
        Err(ProcessingError::InvalidRange { .. })
    ));
}

#[test]
fn test_month_without_year_is_rejected() {
    assert!(matches!(
        Selection::parse(None, Some("March"), None),
        Err(ProcessingError::InvalidSelection(_))
    ));
}

#[test]
fn test_drill_down_from_year_to_day() {
    let table = station_table();
    let aggregator = DrillDownAggregator::new();

    let selection = Selection::none().select_year(2021);
    let monthly = aggregator.aggregate(
        aggregator.narrow(table.rows(), &selection),
        selection.next_granularity(),
        Reduction::Sum,
    );
    assert_eq!(monthly.len(), 12);

    // 31 days of 12 readings, four in five recorded
    let summary = aggregator
        .extremum_summary(&monthly, Variable::Precipitation)
        .unwrap();
    assert_eq!(summary.min.label, BucketLabel::Month(Month::February));

    let selection = selection.select_month(Month::February).unwrap();
    assert_eq!(
        aggregator.available_days(table.rows(), 2021, Month::February).len(),
        28
    );
    let selection = selection.select_day(14).unwrap();
    let hourly = aggregator.aggregate(
        aggregator.narrow(table.rows(), &selection),
        selection.next_granularity(),
        Reduction::Mean,
    );
    assert_eq!(hourly.len(), 12);
    assert!(hourly.rows.iter().all(|r| r.bucket.date() == at(2021, 2, 14, 0).date()));
}

#[test]
fn test_page_for_missing_year_recovers() {
    let session = Session::new(Arc::new(station_table()));
    let request = PageRequest::new(Page::AirTemperature)
        .with_selection(Selection::parse(Some(2019), None, None).unwrap())
        .with_plots(vec![PlotKind::Kde]);

    let view = build_page(&session, &request).unwrap();
    assert_eq!(view.levels.len(), 1);
    assert!(matches!(view.levels[0].state, LevelState::NoData { .. }));
    assert_eq!(view.yearly.years, Some((2020, 2021)));
    assert_eq!(view.yearly.series().len(), 2);
    assert_eq!(view.distributions.len(), 1);
}

#[test]
fn test_export_aggregate_as_csv() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let table = station_table();
    let aggregator = DrillDownAggregator::new();
    let yearly = aggregator.aggregate(table.rows(), Granularity::Year, Reduction::Mean);

    let path = temp_dir.path().join("yearly.csv");
    TableExporter::new()
        .export(&yearly, &path, ExportFormat::Csv)
        .unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("bucket"));
    assert_eq!(headers.get(6), Some("count"));
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get(0), Some("2020-01-01 00:00:00"));
}

#[test]
fn test_weather_summary() {
    let stats = WeatherAnalyzer::new().analyze(&station_table()).unwrap();
    assert_eq!(stats.variables.len(), Variable::ALL.len());
    let precipitation = stats
        .variables
        .iter()
        .find(|s| s.variable == Variable::Precipitation)
        .unwrap();
    assert!(precipitation.missing > 0);
    assert!(stats.detailed_summary().contains("Total Precipitation"));
}
