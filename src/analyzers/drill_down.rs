use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{
    AggregateRow, AggregateTable, Extreme, ExtremumSummary, Granularity, Measurements,
    Observation, Reduction, Selection, SelectionLevel, Variable,
};

/// Narrow → aggregate → summarise, shared by every variable page.
///
/// All operations take rows sorted ascending by timestamp, which is what an
/// [`crate::models::ObservationTable`] guarantees. They never mutate their
/// input and allocate only the aggregate they return.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrillDownAggregator;

impl DrillDownAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Rows inside the selected year, month and day.
    ///
    /// The sorted order makes every selection a contiguous run, so this is
    /// two binary searches and a sub-slice. An impossible date (30 February)
    /// narrows to nothing.
    pub fn narrow<'a>(&self, rows: &'a [Observation], selection: &Selection) -> &'a [Observation] {
        if selection.level() == SelectionLevel::NoSelection {
            return rows;
        }

        let Some((start, end)) = selection_bounds(selection) else {
            return &rows[..0];
        };

        let lo = rows.partition_point(|r| r.timestamp < start);
        let hi = rows.partition_point(|r| r.timestamp < end);
        let narrowed = &rows[lo..hi.max(lo)];
        debug!(%selection, rows = narrowed.len(), "narrowed observations");
        narrowed
    }

    /// One row per calendar bucket that holds at least one observation.
    pub fn aggregate(
        &self,
        rows: &[Observation],
        granularity: Granularity,
        reduction: Reduction,
    ) -> AggregateTable {
        let mut out: Vec<AggregateRow> = Vec::new();
        let mut current: Option<BucketAccumulator> = None;

        for row in rows {
            let bucket = granularity.bucket_start(&row.timestamp);
            let starts_bucket = current.as_ref().map_or(true, |acc| acc.bucket != bucket);
            if starts_bucket {
                if let Some(done) = current.replace(BucketAccumulator::new(bucket)) {
                    out.push(done.finish(reduction));
                }
            }
            if let Some(acc) = current.as_mut() {
                acc.push(&row.values);
            }
        }
        if let Some(done) = current {
            out.push(done.finish(reduction));
        }

        debug!(
            %granularity,
            %reduction,
            source_rows = rows.len(),
            buckets = out.len(),
            "aggregated observations"
        );

        AggregateTable {
            granularity,
            reduction,
            rows: out,
        }
    }

    /// Largest and smallest bucket value of `variable`, earliest bucket on ties.
    pub fn extremum_summary(
        &self,
        table: &AggregateTable,
        variable: Variable,
    ) -> Result<ExtremumSummary> {
        if table.is_empty() {
            return Err(ProcessingError::EmptyAggregate(format!(
                "no {} buckets to summarise",
                table.granularity
            )));
        }

        let mut max: Option<(f64, &AggregateRow)> = None;
        let mut min: Option<(f64, &AggregateRow)> = None;

        for row in &table.rows {
            let Some(value) = row.values.get(variable) else {
                continue;
            };
            // Strict comparisons keep the first bucket on ties
            if max.map_or(true, |(m, _)| value > m) {
                max = Some((value, row));
            }
            if min.map_or(true, |(m, _)| value < m) {
                min = Some((value, row));
            }
        }

        match (max, min) {
            (Some((max_value, max_row)), Some((min_value, min_row))) => Ok(ExtremumSummary {
                variable,
                max: Extreme {
                    value: max_value,
                    bucket: max_row.bucket,
                    label: table.granularity.label(&max_row.bucket),
                },
                min: Extreme {
                    value: min_value,
                    bucket: min_row.bucket,
                    label: table.granularity.label(&min_row.bucket),
                },
            }),
            _ => Err(ProcessingError::EmptyAggregate(format!(
                "{} is missing in every {} bucket",
                variable.label(),
                table.granularity
            ))),
        }
    }

    /// Rows whose bucket year lies in `start_year..=end_year`.
    pub fn range_filter(
        &self,
        table: &AggregateTable,
        start_year: i32,
        end_year: i32,
    ) -> Result<AggregateTable> {
        if start_year > end_year {
            return Err(ProcessingError::InvalidRange {
                start: start_year,
                end: end_year,
            });
        }

        let rows = table
            .rows
            .iter()
            .filter(|r| (start_year..=end_year).contains(&r.bucket.year()))
            .cloned()
            .collect();

        Ok(AggregateTable {
            granularity: table.granularity,
            reduction: table.reduction,
            rows,
        })
    }

    /// Years present in the data, ascending.
    pub fn available_years(&self, rows: &[Observation]) -> Vec<i32> {
        let mut years: Vec<i32> = rows.iter().map(|r| r.timestamp.year()).collect();
        years.dedup();
        years
    }

    /// Months present within `year`, in calendar order.
    pub fn available_months(&self, rows: &[Observation], year: i32) -> Vec<Month> {
        let scoped = self.narrow(rows, &Selection::none().select_year(year));
        let mut months: Vec<u32> = scoped.iter().map(|r| r.timestamp.month()).collect();
        months.dedup();
        months
            .into_iter()
            .filter_map(|m| Month::try_from(m as u8).ok())
            .collect()
    }

    /// Days present within `month` of `year`, ascending.
    pub fn available_days(&self, rows: &[Observation], year: i32, month: Month) -> Vec<u32> {
        let Ok(selection) = Selection::none().select_year(year).select_month(month) else {
            return Vec::new();
        };
        let mut days: Vec<u32> = self
            .narrow(rows, &selection)
            .iter()
            .map(|r| r.timestamp.day())
            .collect();
        days.dedup();
        days
    }
}

/// Half-open `[start, end)` interval covered by a non-empty selection.
fn selection_bounds(selection: &Selection) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let year = selection.year()?;
    let (start, end) = match (selection.month(), selection.day()) {
        (None, _) => (
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        ),
        (Some(month), None) => {
            let m = month.number_from_month();
            let start = NaiveDate::from_ymd_opt(year, m, 1)?;
            let end = if m == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, m + 1, 1)?
            };
            (start, end)
        }
        (Some(month), Some(day)) => {
            let start = NaiveDate::from_ymd_opt(year, month.number_from_month(), day)?;
            (start, start.succ_opt()?)
        }
    };
    Some((start.and_hms_opt(0, 0, 0)?, end.and_hms_opt(0, 0, 0)?))
}

struct BucketAccumulator {
    bucket: NaiveDateTime,
    totals: [f64; Variable::ALL.len()],
    counts: [usize; Variable::ALL.len()],
    rows: usize,
}

impl BucketAccumulator {
    fn new(bucket: NaiveDateTime) -> Self {
        Self {
            bucket,
            totals: [0.0; Variable::ALL.len()],
            counts: [0; Variable::ALL.len()],
            rows: 0,
        }
    }

    fn push(&mut self, values: &Measurements) {
        self.rows += 1;
        for (i, variable) in Variable::ALL.iter().enumerate() {
            if let Some(v) = values.get(*variable) {
                self.totals[i] += v;
                self.counts[i] += 1;
            }
        }
    }

    fn finish(self, reduction: Reduction) -> AggregateRow {
        let mut values = Measurements::default();
        for (i, variable) in Variable::ALL.iter().enumerate() {
            values.set(*variable, reduction.finish(self.totals[i], self.counts[i]));
        }
        AggregateRow {
            bucket: self.bucket,
            values,
            count: self.rows,
        }
    }
}
