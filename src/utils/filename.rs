use crate::models::{Granularity, Selection, Variable};
use std::path::PathBuf;

/// Default export path: output/nwfp-{variable}-{granularity}[-{scope}].{ext}
///
/// The scope is the selection as digits, e.g. `2020-03` for March 2020.
pub fn generate_default_export_filename(
    variable: Variable,
    granularity: Granularity,
    selection: &Selection,
    extension: &str,
) -> PathBuf {
    let mut filename = format!("nwfp-{}-{}", variable.key(), granularity);

    if let Some(year) = selection.year() {
        filename.push_str(&format!("-{}", year));
    }
    if let Some(month) = selection.month() {
        filename.push_str(&format!("-{:02}", month.number_from_month()));
    }
    if let Some(day) = selection.day() {
        filename.push_str(&format!("-{:02}", day));
    }

    filename.push('.');
    filename.push_str(extension);
    PathBuf::from("output").join(filename)
}
