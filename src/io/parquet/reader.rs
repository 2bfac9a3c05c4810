use arrow_array::RecordBatch;
use arrow_schema::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;

use crate::error::{CatchmentError, Result};
use crate::io::parquet::metadata::GeoParquetMetadata;
use crate::table::Table;

/// Options for the Parquet reader.
#[derive(Debug, Clone, Copy)]
pub struct ParquetReaderOptions {
    /// The number of rows in each batch.
    pub batch_size: usize,
}

impl Default for ParquetReaderOptions {
    fn default() -> Self {
        Self { batch_size: 65_536 }
    }
}

fn read(
    reader: impl ChunkReader + 'static,
    options: &ParquetReaderOptions,
) -> Result<(Table, Option<GeoParquetMetadata>)> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
    let geo_meta = GeoParquetMetadata::from_parquet_meta(builder.metadata().file_metadata())
        .transpose()?;
    let schema = builder.schema().clone();
    let batches = builder
        .with_batch_size(options.batch_size)
        .build()?
        .collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;
    Ok((Table::try_new(schema, batches)?, geo_meta))
}

/// Read a Parquet file into a [`Table`].
pub fn read_parquet(
    reader: impl ChunkReader + 'static,
    options: &ParquetReaderOptions,
) -> Result<Table> {
    Ok(read(reader, options)?.0)
}

/// Read a GeoParquet file into a [`Table`] plus its parsed `geo` metadata.
///
/// # Errors
///
/// Errors if the file has no `geo` metadata or its primary column is absent from the table.
pub fn read_geoparquet(
    reader: impl ChunkReader + 'static,
    options: &ParquetReaderOptions,
) -> Result<(Table, GeoParquetMetadata)> {
    let (table, geo_meta) = read(reader, options)?;
    let geo_meta = geo_meta.ok_or_else(|| {
        CatchmentError::General("file has no GeoParquet metadata".to_string())
    })?;
    if table.column_index(&geo_meta.primary_column).is_none() {
        return Err(CatchmentError::MissingGeometryColumn(
            geo_meta.primary_column.clone(),
        ));
    }
    Ok((table, geo_meta))
}
