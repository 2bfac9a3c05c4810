use std::io::Write;

use arrow_schema::DataType;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::{EnabledStatistics, WriterProperties, WriterVersion};
use serde_json::Value;
use tracing::debug;

use crate::algorithm::native::{BoundingRect, TotalBounds, BBOX_COLUMN_NAMES};
use crate::error::{CatchmentError, Result};
use crate::io::parquet::metadata::{
    GeoParquetBboxCovering, GeoParquetColumnEncoding, GeoParquetColumnMetadata, GeoParquetCovering,
    GeoParquetMetadata, GEOPARQUET_METADATA_KEY,
};
use crate::io::wkb::{from_wkb, wkb_geometry_types};
use crate::table::Table;

/// Options for the Parquet writer.
#[derive(Debug, Clone)]
pub struct ParquetWriterOptions {
    pub compression: Compression,
    pub writer_version: WriterVersion,
    pub statistics: EnabledStatistics,

    /// Maximum number of rows per row group. `None` keeps the parquet default.
    pub max_row_group_size: Option<usize>,
}

impl Default for ParquetWriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            writer_version: WriterVersion::PARQUET_2_0,
            statistics: EnabledStatistics::Page,
            max_row_group_size: None,
        }
    }
}

impl ParquetWriterOptions {
    fn writer_properties(&self, key_value_metadata: Option<Vec<KeyValue>>) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression)
            .set_writer_version(self.writer_version)
            .set_statistics_enabled(self.statistics)
            .set_key_value_metadata(key_value_metadata);
        if let Some(max_row_group_size) = self.max_row_group_size {
            builder = builder.set_max_row_group_size(max_row_group_size);
        }
        builder.build()
    }
}

/// Options for the GeoParquet writer.
#[derive(Debug, Clone)]
pub struct GeoParquetWriterOptions {
    /// The WKB geometry column.
    pub primary_column: String,

    /// PROJJSON CRS written to the column metadata as is.
    pub crs: Option<Value>,

    pub parquet: ParquetWriterOptions,
}

impl Default for GeoParquetWriterOptions {
    fn default() -> Self {
        Self {
            primary_column: "geometry".to_string(),
            crs: None,
            parquet: Default::default(),
        }
    }
}

fn write(table: &Table, writer: impl Write + Send, props: WriterProperties) -> Result<()> {
    let mut writer = ArrowWriter::try_new(writer, table.schema().clone(), Some(props))?;
    for batch in table.batches() {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(())
}

/// Write a [`Table`] to Parquet.
pub fn write_parquet(
    table: &Table,
    writer: impl Write + Send,
    options: &ParquetWriterOptions,
) -> Result<()> {
    write(table, writer, options.writer_properties(None))
}

/// Build the `geo` metadata of a table whose primary column holds WKB polygons or multipolygons.
pub fn geoparquet_metadata(
    table: &Table,
    options: &GeoParquetWriterOptions,
) -> Result<GeoParquetMetadata> {
    let chunks = table.column_by_name(&options.primary_column).map_err(|_| {
        CatchmentError::MissingGeometryColumn(options.primary_column.clone())
    })?;

    let mut column = GeoParquetColumnMetadata::new(GeoParquetColumnEncoding::WKB);
    let mut bounds = BoundingRect::new();
    for chunk in &chunks {
        if !matches!(
            chunk.data_type(),
            DataType::Binary | DataType::LargeBinary | DataType::BinaryView
        ) {
            return Err(CatchmentError::IncorrectType(
                format!(
                    "GeoParquet geometry column must be WKB, got {:?}",
                    chunk.data_type()
                )
                .into(),
            ));
        }
        column
            .geometry_types
            .extend(wkb_geometry_types(chunk.as_ref())?);
        bounds += from_wkb(chunk.as_ref())?.total_bounds();
    }
    debug!(vertices = bounds.count(), "computed total bounds");

    column = column.with_bbox(bounds.bbox());
    column.crs = options.crs.clone();
    // The covering may only name columns that exist
    if BBOX_COLUMN_NAMES
        .iter()
        .all(|name| table.column_index(name).is_some())
    {
        column.covering = Some(GeoParquetCovering {
            bbox: GeoParquetBboxCovering::from_bbox_columns(),
        });
    }
    Ok(GeoParquetMetadata::new(&options.primary_column, column))
}

/// Write a [`Table`] with a WKB geometry column to GeoParquet.
pub fn write_geoparquet(
    table: &Table,
    writer: impl Write + Send,
    options: &GeoParquetWriterOptions,
) -> Result<()> {
    let geo_meta = geoparquet_metadata(table, options)?;
    let kv = KeyValue::new(GEOPARQUET_METADATA_KEY.to_string(), geo_meta.to_json()?);
    write(table, writer, options.parquet.writer_properties(Some(vec![kv])))
}
