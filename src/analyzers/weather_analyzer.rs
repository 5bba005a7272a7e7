use crate::analyzers::quality::{QualityDistribution, QualityTally};
use crate::error::{ProcessingError, Result};
use crate::models::{ObservationTable, Reduction, Variable};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Whole-record statistics of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub variable: Variable,
    pub count: usize,
    pub missing: usize,
    pub total: Option<f64>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl VariableSummary {
    /// The headline metrics a page shows: the total for accumulated
    /// variables, mean/max/min for the others.
    pub fn headline(&self) -> Vec<(String, Option<f64>)> {
        let label = self.variable.label();
        match self.variable.default_reduction() {
            Reduction::Sum => vec![(format!("Total {}", label), self.total)],
            Reduction::Mean => vec![
                (format!("Average {}", label), self.mean),
                (format!("Maximum {}", label), self.max),
                (format!("Minimum {}", label), self.min),
            ],
        }
    }

    pub fn completeness(&self) -> f64 {
        let all = self.count + self.missing;
        if all == 0 {
            return 0.0;
        }
        (self.count as f64 / all as f64) * 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherStatistics {
    pub total_records: usize,
    pub date_range: (NaiveDateTime, NaiveDateTime),
    pub variables: Vec<VariableSummary>,
    pub quality: QualityDistribution,
}

pub struct WeatherAnalyzer;

impl WeatherAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize_variable(&self, table: &ObservationTable, variable: Variable) -> VariableSummary {
        let mut count = 0usize;
        let mut total = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in table.values(variable) {
            count += 1;
            total += value;
            min = min.min(value);
            max = max.max(value);
        }

        let present = |v: f64| if count > 0 { Some(v) } else { None };

        VariableSummary {
            variable,
            count,
            missing: table.len() - count,
            total: Reduction::Sum.finish(total, count),
            mean: Reduction::Mean.finish(total, count),
            min: present(min),
            max: present(max),
        }
    }

    pub fn analyze(&self, table: &ObservationTable) -> Result<WeatherStatistics> {
        let date_range = table.span().ok_or_else(|| {
            ProcessingError::EmptyAggregate("no observations to analyze".to_string())
        })?;

        let variables = Variable::ALL
            .iter()
            .map(|v| self.summarize_variable(table, *v))
            .collect();

        Ok(WeatherStatistics {
            total_records: table.len(),
            date_range,
            variables,
            quality: QualityTally::new().tally(table),
        })
    }
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, unit),
        None => "No valid measurements".to_string(),
    }
}

impl WeatherStatistics {
    pub fn summary(&self) -> String {
        format!(
            "Records: {} total\n\
            Date Range: {} to {} ({} years)",
            self.total_records,
            self.date_range.0,
            self.date_range.1,
            (self
                .date_range
                .1
                .signed_duration_since(self.date_range.0)
                .num_days()
                / 365)
                + 1,
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut out = self.summary();
        out.push_str("\n\nSummary Statistics:");
        for summary in &self.variables {
            let unit = summary.variable.unit();
            out.push_str(&format!(
                "\n- {} ({:.1}% complete)",
                summary.variable.label(),
                summary.completeness()
            ));
            for (name, value) in summary.headline() {
                out.push_str(&format!("\n    {}: {}", name, format_value(value, unit)));
            }
        }
        out.push_str("\n\n");
        out.push_str(&self.quality.summary());
        out
    }
}

impl Default for WeatherAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurements, Observation};
    use chrono::NaiveDate;

    fn table() -> ObservationTable {
        let day = NaiveDate::from_ymd_opt(2015, 8, 1).unwrap();
        let rows = [(0, Some(2.0)), (1, None), (2, Some(4.0)), (3, Some(0.0))]
            .into_iter()
            .map(|(h, v)| {
                let mut values = Measurements::default().with(Variable::AirTemperature, 10.0 + h as f64);
                values.set(Variable::Precipitation, v);
                Observation::new(day.and_hms_opt(h, 0, 0).unwrap(), values)
            })
            .collect();
        ObservationTable::new(rows).unwrap()
    }

    #[test]
    fn test_summarize_variable() {
        let table = table();
        let summary = WeatherAnalyzer::new().summarize_variable(&table, Variable::Precipitation);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.total, Some(6.0));
        assert_eq!(summary.mean, Some(2.0));
        assert_eq!(summary.min, Some(0.0));
        assert_eq!(summary.max, Some(4.0));
        assert_eq!(summary.completeness(), 75.0);
    }

    #[test]
    fn test_headline_depends_on_reduction() {
        let table = table();
        let analyzer = WeatherAnalyzer::new();
        let precip = analyzer.summarize_variable(&table, Variable::Precipitation);
        assert_eq!(precip.headline().len(), 1);
        assert_eq!(precip.headline()[0].0, "Total Precipitation");
        let temp = analyzer.summarize_variable(&table, Variable::AirTemperature);
        let headline = temp.headline();
        assert_eq!(headline.len(), 3);
        assert_eq!(headline[0], ("Average Air Temperature".to_string(), Some(11.5)));
    }

    #[test]
    fn test_missing_variable_has_no_statistics() {
        let table = table();
        let summary = WeatherAnalyzer::new().summarize_variable(&table, Variable::WindSpeed);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.max, None);
    }

    #[test]
    fn test_analyze_empty_table_fails() {
        let empty = ObservationTable::default();
        assert!(WeatherAnalyzer::new().analyze(&empty).is_err());
    }

    #[test]
    fn test_detailed_summary_mentions_every_variable() {
        let stats = WeatherAnalyzer::new().analyze(&table()).unwrap();
        let text = stats.detailed_summary();
        for v in Variable::ALL {
            assert!(text.contains(v.label()));
        }
        assert!(text.contains("Records: 4 total"));
    }
}
