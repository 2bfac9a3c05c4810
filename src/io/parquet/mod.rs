//! Read from and write to Parquet and GeoParquet files.

pub mod metadata;
mod reader;
mod writer;

pub use metadata::{
    GeoParquetBboxCovering, GeoParquetColumnEncoding, GeoParquetColumnMetadata, GeoParquetCovering,
    GeoParquetMetadata, GEOPARQUET_VERSION,
};
pub use reader::{read_geoparquet, read_parquet, ParquetReaderOptions};
pub use writer::{
    geoparquet_metadata, write_geoparquet, write_parquet, GeoParquetWriterOptions,
    ParquetWriterOptions,
};
