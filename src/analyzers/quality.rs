use crate::models::{ObservationTable, Variable};
use serde::Serialize;
use std::collections::BTreeMap;

/// Occurrences of one quality label; `label: None` counts absent flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityCount {
    pub label: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableQuality {
    pub variable: Variable,
    pub counts: Vec<QualityCount>,
}

impl VariableQuality {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn count_of(&self, label: Option<&str>) -> usize {
        self.counts
            .iter()
            .find(|c| c.label.as_deref() == label)
            .map_or(0, |c| c.count)
    }
}

/// Quality-flag histogram per variable (the home page stacked bars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityDistribution {
    pub variables: Vec<VariableQuality>,
}

impl QualityDistribution {
    pub fn get(&self, variable: Variable) -> Option<&VariableQuality> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("Data Quality Distribution:");
        for vq in &self.variables {
            let total = vq.total().max(1) as f64;
            out.push_str(&format!("\n- {}:", vq.variable.label()));
            for c in &vq.counts {
                out.push_str(&format!(
                    "\n    {}: {} ({:.1}%)",
                    c.label.as_deref().unwrap_or("<none>"),
                    c.count,
                    c.count as f64 / total * 100.0
                ));
            }
        }
        out
    }
}

pub struct QualityTally;

impl QualityTally {
    pub fn new() -> Self {
        Self
    }

    /// Count quality labels per variable, labels in sorted order with the
    /// absent flag first.
    pub fn tally(&self, table: &ObservationTable) -> QualityDistribution {
        let variables = Variable::ALL
            .iter()
            .map(|variable| {
                let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
                for row in table.rows() {
                    *counts.entry(row.quality.get(*variable)).or_default() += 1;
                }
                VariableQuality {
                    variable: *variable,
                    counts: counts
                        .into_iter()
                        .map(|(label, count)| QualityCount {
                            label: label.map(str::to_string),
                            count,
                        })
                        .collect(),
                }
            })
            .collect();

        QualityDistribution { variables }
    }
}

impl Default for QualityTally {
    fn default() -> Self {
        Self::new()
    }
}
