use crate::error::{ProcessingError, Result};
use crate::models::{AggregateRow, AggregateTable, Observation, ObservationTable, Variable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Column holding the observation index in files written here.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const BUCKET_COLUMN: &str = "bucket";
pub const COUNT_COLUMN: &str = "count";

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Write an observation table in the station export layout, in batches
    pub fn write_observations(
        &self,
        table: &ObservationTable,
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = observation_schema();
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(self.properties()))?;

        for chunk in table.rows().chunks(batch_size.max(1)) {
            let batch = observations_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        info!(rows = table.len(), path = %path.display(), "wrote observations");
        Ok(())
    }

    /// Write an aggregate table: bucket, one column per variable, row count
    pub fn write_aggregate(&self, table: &AggregateTable, path: &Path) -> Result<()> {
        let schema = aggregate_schema();
        let batch = aggregate_to_batch(&table.rows, schema.clone())?;

        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(self.properties()))?;
        writer.write(&batch)?;
        writer.close()?;

        info!(
            buckets = table.len(),
            granularity = %table.granularity,
            path = %path.display(),
            "wrote aggregate"
        );
        Ok(())
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Nanosecond, None)
}

fn observation_schema() -> Arc<Schema> {
    let mut fields = vec![Field::new(TIMESTAMP_COLUMN, timestamp_type(), false)];
    for v in Variable::ALL {
        fields.push(Field::new(v.column_name(), DataType::Float64, true));
    }
    for v in Variable::ALL {
        fields.push(Field::new(v.quality_column_name(), DataType::Utf8, true));
    }
    Arc::new(Schema::new(fields))
}

fn aggregate_schema() -> Arc<Schema> {
    let mut fields = vec![Field::new(BUCKET_COLUMN, timestamp_type(), false)];
    for v in Variable::ALL {
        fields.push(Field::new(v.key(), DataType::Float64, true));
    }
    fields.push(Field::new(COUNT_COLUMN, DataType::UInt64, false));
    Arc::new(Schema::new(fields))
}

fn nanos(ts: &NaiveDateTime) -> Result<i64> {
    ts.and_utc().timestamp_nanos_opt().ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("timestamp {} out of nanosecond range", ts))
    })
}

fn observations_to_batch(rows: &[Observation], schema: Arc<Schema>) -> Result<RecordBatch> {
    let timestamps = rows
        .iter()
        .map(|r| nanos(&r.timestamp))
        .collect::<Result<Vec<i64>>>()?;

    let mut columns: Vec<ArrayRef> = vec![Arc::new(TimestampNanosecondArray::from(timestamps))];
    for v in Variable::ALL {
        let values: Float64Array = rows.iter().map(|r| r.value(v)).collect();
        columns.push(Arc::new(values));
    }
    for v in Variable::ALL {
        let flags: StringArray = rows.iter().map(|r| r.quality.get(v)).collect();
        columns.push(Arc::new(flags));
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn aggregate_to_batch(rows: &[AggregateRow], schema: Arc<Schema>) -> Result<RecordBatch> {
    let buckets = rows
        .iter()
        .map(|r| nanos(&r.bucket))
        .collect::<Result<Vec<i64>>>()?;

    let mut columns: Vec<ArrayRef> = vec![Arc::new(TimestampNanosecondArray::from(buckets))];
    for v in Variable::ALL {
        let values: Float64Array = rows.iter().map(|r| r.values.get(v)).collect();
        columns.push(Arc::new(values));
    }
    let counts: Vec<u64> = rows.iter().map(|r| r.count as u64).collect();
    columns.push(Arc::new(UInt64Array::from(counts)));

    Ok(RecordBatch::try_new(schema, columns)?)
}
