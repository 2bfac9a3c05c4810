//! Readers and writers for the file formats the pipeline moves data between.

use arrow_schema::Field;
use serde_json::Value;

pub mod csv;
#[cfg(feature = "gdal")]
pub mod gdal;
pub mod ipc;
pub mod parquet;
pub mod wkb;

const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";
const EXTENSION_METADATA_KEY: &str = "ARROW:extension:metadata";

/// Whether `field` is tagged as a WKB geometry column.
pub fn is_wkb_field(field: &Field) -> bool {
    field
        .metadata()
        .get(EXTENSION_NAME_KEY)
        .is_some_and(|name| name == "geoarrow.wkb" || name == "ogc.wkb")
}

/// The `crs` member of a field's GeoArrow extension metadata, if any.
///
/// An explicit `"crs": null` is returned as `Some(Value::Null)`.
pub fn extension_crs(field: &Field) -> Option<Value> {
    let metadata = field.metadata().get(EXTENSION_METADATA_KEY)?;
    let mut metadata: Value = serde_json::from_str(metadata).ok()?;
    metadata.get_mut("crs").map(Value::take)
}
