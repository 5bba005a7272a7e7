use crate::error::{ProcessingError, Result};
use crate::models::{Measurements, Observation, ObservationTable, QualityFlags, Variable};
use crate::utils::constants::DEFAULT_BATCH_SIZE;
use crate::utils::progress::ProgressReporter;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampNanosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::timestamp_ns_to_datetime;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads the station export into an [`ObservationTable`].
///
/// Measurement columns are cast to `Float64` and quality columns to `Utf8`
/// whatever their stored type, so integer codes and dictionary-encoded
/// categories read the same way. The index column may be any timestamp or
/// date type; when no name is configured the first such column is used.
pub struct ObservationReader {
    timestamp_column: Option<String>,
    batch_size: usize,
    silent: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            timestamp_column: None,
            batch_size: DEFAULT_BATCH_SIZE,
            silent: true,
        }
    }

    pub fn with_timestamp_column(mut self, column: Option<String>) -> Self {
        self.timestamp_column = column;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.silent = !show;
        self
    }

    pub fn read(&self, path: &Path) -> Result<ObservationTable> {
        let progress =
            ProgressReporter::new_spinner(&format!("Loading {}...", path.display()), self.silent);

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let timestamp_column = self.resolve_timestamp_column(builder.schema())?;
        debug!(column = %timestamp_column, "using timestamp column");

        let reader = builder.with_batch_size(self.batch_size).build()?;

        let mut rows = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            self.append_batch(&batch, &timestamp_column, &mut rows)?;
            progress.set_message(&format!("Loaded {} observations", rows.len()));
        }

        let table = ObservationTable::new(rows)?;
        progress.finish_with_message(&format!("Loaded {} observations", table.len()));

        match table.span() {
            Some((first, last)) => info!(
                rows = table.len(),
                %first,
                %last,
                path = %path.display(),
                "loaded observation table"
            ),
            None => warn!(path = %path.display(), "observation file holds no rows"),
        }

        Ok(table)
    }

    fn resolve_timestamp_column(&self, schema: &Schema) -> Result<String> {
        if let Some(name) = &self.timestamp_column {
            return schema
                .field_with_name(name)
                .map(|f| f.name().clone())
                .map_err(|_| ProcessingError::MissingColumn(name.clone()));
        }

        schema
            .fields()
            .iter()
            .find(|f| {
                matches!(
                    f.data_type(),
                    DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
                )
            })
            .map(|f| f.name().clone())
            .ok_or_else(|| ProcessingError::MissingColumn("timestamp".to_string()))
    }

    fn append_batch(
        &self,
        batch: &RecordBatch,
        timestamp_column: &str,
        rows: &mut Vec<Observation>,
    ) -> Result<()> {
        let timestamps = timestamp_array(batch, timestamp_column)?;

        let mut values = Vec::with_capacity(Variable::ALL.len());
        for v in Variable::ALL {
            values.push((v, float_array(batch, v.column_name())?));
        }

        let mut flags = Vec::with_capacity(Variable::ALL.len());
        for v in Variable::ALL {
            flags.push((v, string_array(batch, &v.quality_column_name())?));
        }

        // Errors report the row within the file, not the batch
        let offset = rows.len();
        rows.reserve(batch.num_rows());
        for i in 0..batch.num_rows() {
            let timestamp = timestamp_at(&timestamps, i, offset + i)?;

            let mut measurements = Measurements::default();
            for (v, array) in &values {
                let value = if array.is_null(i) {
                    None
                } else {
                    Some(array.value(i))
                };
                measurements.set(*v, value);
            }

            let mut quality = QualityFlags::default();
            for (v, array) in &flags {
                let flag = array
                    .as_ref()
                    .filter(|a| !a.is_null(i))
                    .map(|a| a.value(i).to_string());
                quality.set(*v, flag);
            }

            rows.push(Observation::new(timestamp, measurements).with_quality(quality));
        }

        Ok(())
    }

    /// Row count, row groups and size of a Parquet file, from its footer
    pub fn file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: file_metadata.num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            columns,
        })
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ProcessingError::MissingColumn(name.to_string()))
}

fn float_array(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let casted = cast(column(batch, name)?, &DataType::Float64)?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

/// Quality columns are optional: a missing one reads as all-absent flags.
fn string_array(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    let Some(array) = batch.column_by_name(name) else {
        return Ok(None);
    };
    let casted = cast(array, &DataType::Utf8)?;
    casted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .map(Some)
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn timestamp_array(batch: &RecordBatch, name: &str) -> Result<TimestampNanosecondArray> {
    let casted = cast(
        column(batch, name)?,
        &DataType::Timestamp(TimeUnit::Nanosecond, None),
    )?;
    casted
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .cloned()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn timestamp_at(array: &TimestampNanosecondArray, i: usize, row: usize) -> Result<NaiveDateTime> {
    if array.is_null(i) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Missing timestamp in row {}",
            row
        )));
    }
    timestamp_ns_to_datetime(array.value(i)).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("Invalid timestamp in row {}", row))
    })
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.total_rows as f64 / self.row_groups.max(1) as f64,
            self.columns.join(", ")
        )
    }
}
