pub mod parquet_writer;
pub mod table_exporter;

pub use parquet_writer::ParquetWriter;
pub use table_exporter::{ExportFormat, TableExporter};
