use crate::error::Result;
use crate::utils::constants::{
    CONFIG_FILE, DEFAULT_BATCH_SIZE, DEFAULT_DATA_FILE, DEFAULT_HISTOGRAM_BINS, DEFAULT_KDE_POINTS,
    DEFAULT_ROSE_BINS, ENV_PREFIX,
};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Runtime settings: built-in defaults, then `nwfp-met.toml` (or an explicit
/// file), then `NWFP_MET_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    pub data_file: PathBuf,

    /// Index column; the first timestamp-typed column when unset
    pub timestamp_column: Option<String>,

    #[validate(range(min = 1, max = 1000))]
    pub histogram_bins: usize,

    #[validate(range(min = 1, max = 360))]
    pub rose_bins: usize,

    #[validate(range(min = 2, max = 10000))]
    pub kde_points: usize,

    #[validate(range(min = 1))]
    pub batch_size: usize,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::new(CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings: Settings = config::Config::builder()
            .set_default("data_file", DEFAULT_DATA_FILE)?
            .set_default("histogram_bins", DEFAULT_HISTOGRAM_BINS as i64)?
            .set_default("rose_bins", DEFAULT_ROSE_BINS as i64)?
            .set_default("kde_points", DEFAULT_KDE_POINTS as i64)?
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "loaded settings");
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            timestamp_column: None,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            rose_bins: DEFAULT_ROSE_BINS,
            kde_points: DEFAULT_KDE_POINTS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.data_file, PathBuf::from("new_df.parquet"));
        assert_eq!(settings.histogram_bins, 40);
        assert_eq!(settings.rose_bins, 35);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file("data_file = \"met.parquet\"\nhistogram_bins = 12\ntimestamp_column = \"Datetime\"\n");
        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.data_file, PathBuf::from("met.parquet"));
        assert_eq!(settings.histogram_bins, 12);
        assert_eq!(settings.timestamp_column.as_deref(), Some("Datetime"));
        assert_eq!(settings.kde_points, 200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = toml_file("rose_bins = 0\n");
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ProcessingError::Validation(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/nwfp-met.toml"))).unwrap_err();
        assert!(matches!(err, ProcessingError::Settings(_)));
    }
}
