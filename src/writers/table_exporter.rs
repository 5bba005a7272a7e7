use crate::error::{ProcessingError, Result};
use crate::models::{AggregateTable, Variable};
use crate::writers::parquet_writer::{ParquetWriter, BUCKET_COLUMN, COUNT_COLUMN};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => Err(ProcessingError::Config(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Writes aggregate tables for a renderer or a spreadsheet.
pub struct TableExporter {
    parquet: ParquetWriter,
}

impl TableExporter {
    pub fn new() -> Self {
        Self {
            parquet: ParquetWriter::new(),
        }
    }

    pub fn with_parquet_writer(mut self, writer: ParquetWriter) -> Self {
        self.parquet = writer;
        self
    }

    pub fn export(&self, table: &AggregateTable, path: &Path, format: ExportFormat) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        match format {
            ExportFormat::Csv => self.write_csv(table, File::create(path)?)?,
            ExportFormat::Json => {
                let mut out = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(&mut out, table)?;
                out.flush()?;
            }
            ExportFormat::Parquet => self.parquet.write_aggregate(table, path)?,
        }

        info!(path = %path.display(), ?format, buckets = table.len(), "exported aggregate");
        Ok(())
    }

    /// `bucket`, one column per variable (empty when missing), `count`
    pub fn write_csv<W: Write>(&self, table: &AggregateTable, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);

        let mut header = vec![BUCKET_COLUMN.to_string()];
        header.extend(Variable::ALL.iter().map(|v| v.key().to_string()));
        header.push(COUNT_COLUMN.to_string());
        writer.write_record(&header)?;

        for row in &table.rows {
            let mut record = vec![row.bucket.format("%Y-%m-%d %H:%M:%S").to_string()];
            record.extend(
                Variable::ALL
                    .iter()
                    .map(|v| row.values.get(*v).map(|x| x.to_string()).unwrap_or_default()),
            );
            record.push(row.count.to_string());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for TableExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateRow, Granularity, Measurements, Reduction};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn table() -> AggregateTable {
        let bucket = |d| {
            NaiveDate::from_ymd_opt(2021, 5, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        AggregateTable {
            granularity: Granularity::Day,
            reduction: Reduction::Sum,
            rows: vec![
                AggregateRow {
                    bucket: bucket(1),
                    values: Measurements::default().with(Variable::Precipitation, 2.5),
                    count: 96,
                },
                AggregateRow {
                    bucket: bucket(2),
                    values: Measurements::default(),
                    count: 96,
                },
            ],
        }
    }

    #[test]
    fn test_csv_layout() -> Result<()> {
        let mut buffer = Vec::new();
        TableExporter::new().write_csv(&table(), &mut buffer)?;
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "bucket,precipitation,air_temperature,relative_humidity,wind_speed,wind_direction,count"
        );
        assert_eq!(lines[1], "2021-05-01 00:00:00,2.5,,,,,96");
        assert_eq!(lines[2], "2021-05-02 00:00:00,,,,,,96");
        Ok(())
    }

    #[test]
    fn test_export_every_format() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let exporter = TableExporter::new();
        for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Parquet] {
            let path = dir.path().join("nested").join(format!("out.{}", format.extension()));
            exporter.export(&table(), &path, format)?;
            assert!(path.exists());
            assert_eq!(ExportFormat::from_path(&path), Some(format));
        }

        let json = std::fs::read_to_string(dir.path().join("nested/out.json"))?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["granularity"], "day");
        assert_eq!(value["rows"][0]["values"]["precipitation"], 2.5);
        assert!(value["rows"][1]["values"]["precipitation"].is_null());
        Ok(())
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
