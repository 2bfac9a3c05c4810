use std::path::Path;

use arrow::ffi_stream::{ArrowArrayStreamReader, FFI_ArrowArrayStream};
use arrow::record_batch::RecordBatchReader;
use arrow_array::RecordBatch;
use arrow_schema::ArrowError;
use gdal::cpl::CslStringList;
use gdal::vector::{Layer, LayerAccess};
use gdal::Dataset;
use tracing::info;

use crate::error::Result;
use crate::io::is_wkb_field;
use crate::table::Table;

/// Options for reading a GDAL layer.
#[derive(Debug, Clone)]
pub struct GdalReaderOptions {
    /// The maximum number of features in each batch. `None` keeps GDAL's default.
    pub batch_size: Option<usize>,

    /// The geometry column is renamed to this.
    pub geometry_column: String,
}

impl Default for GdalReaderOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            geometry_column: "geometry".to_string(),
        }
    }
}

/// Read a GDAL layer to a [`Table`] with a WKB geometry column.
///
/// Note that this expects GDAL 3.8 or later to propagate the CRS information correctly.
pub fn read_gdal(layer: &mut Layer, options: &GdalReaderOptions) -> Result<Table> {
    // Instantiate an `ArrowArrayStream` for OGR to write into
    let mut output_stream = FFI_ArrowArrayStream::empty();

    // Take a pointer to it
    let output_stream_ptr = &mut output_stream as *mut FFI_ArrowArrayStream;

    // GDAL includes its own copy of the ArrowArrayStream struct definition. These are guaranteed
    // to be the same across implementations, but we need to manually cast between the two for Rust
    // to allow it.
    let gdal_pointer: *mut gdal::ArrowArrayStream = output_stream_ptr.cast();

    let mut stream_options = CslStringList::new();
    if let Some(batch_size) = options.batch_size {
        stream_options.set_name_value("MAX_FEATURES_IN_BATCH", batch_size.to_string().as_str())?;
    }
    stream_options.set_name_value("GEOMETRY_METADATA_ENCODING", "GEOARROW")?;

    // Read the layer's data into our provisioned pointer
    unsafe { layer.read_arrow_stream(gdal_pointer, &stream_options)? }

    let arrow_stream_reader = ArrowArrayStreamReader::try_new(output_stream)?;

    let schema = arrow_stream_reader.schema();
    let batches = arrow_stream_reader
        .into_iter()
        .collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;
    let mut table = Table::try_new(schema, batches)?;

    let geometry_name = table
        .schema()
        .fields()
        .iter()
        .find(|field| is_wkb_field(field))
        .map(|field| field.name().clone());
    if let Some(name) = geometry_name {
        if name != options.geometry_column {
            table.rename_column(&name, &options.geometry_column)?;
        }
    }
    Ok(table)
}

/// Open `path` and read the layer called `layer_name`.
pub fn read_gdal_layer(
    path: &Path,
    layer_name: &str,
    options: &GdalReaderOptions,
) -> Result<Table> {
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer_by_name(layer_name)?;
    info!(layer = layer_name, features = layer.feature_count(), "reading layer");
    read_gdal(&mut layer, options)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::CatchmentError;

    #[test]
    fn missing_dataset() {
        let err = read_gdal_layer(
            Path::new("does/not/exist.gpkg"),
            "catchments_lev12",
            &Default::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatchmentError::GdalError(_)));
    }
}
