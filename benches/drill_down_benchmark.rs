use chrono::{Duration, Month, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nwfp_met::analyzers::{DistributionAnalyzer, DrillDownAggregator};
use nwfp_met::models::{
    Granularity, Measurements, Observation, ObservationTable, Reduction, Selection, Variable,
};

// Fifteen-minute observations, the platform's nominal cadence
fn create_test_table(days: i64) -> ObservationTable {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let rows = (0..days * 96)
        .map(|i| {
            let values = Measurements::default()
                .with(Variable::Precipitation, if i % 7 == 0 { 0.2 } else { 0.0 })
                .with(Variable::AirTemperature, 10.0 + ((i % 96) as f64 / 8.0))
                .with(Variable::RelativeHumidity, 60.0 + (i % 40) as f64)
                .with(Variable::WindSpeed, (i % 30) as f64)
                .with(Variable::WindDirection, ((i * 13) % 360) as f64);
            Observation::new(start + Duration::minutes(15 * i), values)
        })
        .collect();
    ObservationTable::new(rows).unwrap()
}

fn benchmark_narrow(c: &mut Criterion) {
    let table = create_test_table(3 * 365);
    let aggregator = DrillDownAggregator::new();
    let selection = Selection::new(Some(2015), Some(Month::June), Some(14)).unwrap();

    c.bench_function("narrow_to_day", |b| {
        b.iter(|| black_box(aggregator.narrow(table.rows(), &selection).len()))
    });
}

fn benchmark_aggregate_by_granularity(c: &mut Criterion) {
    let table = create_test_table(365);
    let aggregator = DrillDownAggregator::new();
    let mut group = c.benchmark_group("aggregate_one_year");

    for granularity in [Granularity::Month, Granularity::Day, Granularity::Hour] {
        group.bench_with_input(
            BenchmarkId::from_parameter(granularity),
            &granularity,
            |b, &granularity| {
                b.iter(|| {
                    let aggregate = aggregator.aggregate(table.rows(), granularity, Reduction::Mean);
                    black_box(aggregate.len())
                })
            },
        );
    }

    group.finish();
}

fn benchmark_drill_down_request(c: &mut Criterion) {
    let table = create_test_table(2 * 365);
    let aggregator = DrillDownAggregator::new();
    let selection = Selection::new(Some(2015), Some(Month::March), None).unwrap();

    c.bench_function("month_request", |b| {
        b.iter(|| {
            let rows = aggregator.narrow(table.rows(), &selection);
            let daily = aggregator.aggregate(rows, Granularity::Day, Reduction::Sum);
            black_box(aggregator.extremum_summary(&daily, Variable::Precipitation).is_ok())
        })
    });
}

fn benchmark_kde(c: &mut Criterion) {
    let table = create_test_table(90);
    let values: Vec<f64> = table.values(Variable::AirTemperature).collect();
    let analyzer = DistributionAnalyzer::new();

    c.bench_function("kde_air_temperature", |b| {
        b.iter(|| black_box(analyzer.kde(&values).map(|k| k.points.len()).unwrap_or(0)))
    });
}

criterion_group!(
    benches,
    benchmark_narrow,
    benchmark_aggregate_by_granularity,
    benchmark_drill_down_request,
    benchmark_kde
);
criterion_main!(benches);
