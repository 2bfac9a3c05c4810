//! Structs corresponding to the metadata defined by the [GeoParquet specification].
//!
//! [GeoParquet specification]: https://geoparquet.org/releases/v1.1.0/

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use parquet::file::metadata::FileMetaData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::algorithm::native::{BBox, BBOX_COLUMN_NAMES};
use crate::error::{CatchmentError, Result};

/// The GeoParquet version written by this crate.
pub const GEOPARQUET_VERSION: &str = "1.1.0";

/// Parquet key-value metadata key holding the GeoParquet metadata.
pub const GEOPARQUET_METADATA_KEY: &str = "geo";

/// The encoding of the geometry in the Parquet file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum GeoParquetColumnEncoding {
    WKB,
    #[serde(rename = "multipolygon")]
    MultiPolygon,
}

impl Display for GeoParquetColumnEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WKB => write!(f, "WKB"),
            Self::MultiPolygon => write!(f, "multipolygon"),
        }
    }
}

/// Bounding-box covering
///
/// Each member is the Parquet schema path of the column holding that bound for every row.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoParquetBboxCovering {
    pub xmin: Vec<String>,
    pub ymin: Vec<String>,
    pub xmax: Vec<String>,
    pub ymax: Vec<String>,
}

impl GeoParquetBboxCovering {
    /// The covering formed by the four top-level bounding box columns.
    pub fn from_bbox_columns() -> Self {
        let [xmin, ymin, xmax, ymax] = BBOX_COLUMN_NAMES.map(|name| vec![name.to_string()]);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// Object containing bounding box column names to help accelerate spatial data retrieval
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoParquetCovering {
    pub bbox: GeoParquetBboxCovering,
}

/// Deserialize a key that is present, keeping an explicit `null` as `Some(Value::Null)`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// GeoParquet column metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoParquetColumnMetadata {
    pub encoding: GeoParquetColumnEncoding,

    /// The geometry types of all geometries, or an empty list if they are not known.
    pub geometry_types: BTreeSet<String>,

    /// PROJJSON object representing the Coordinate Reference System of the geometry. Stored and
    /// passed on verbatim.
    ///
    /// `None` is an absent key (OGC:CRS84). `Some(Value::Null)` is an explicit `null`, which
    /// GeoParquet reads as an unknown CRS.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub crs: Option<Value>,

    /// Bounding Box of the geometries in the file, formatted according to RFC 7946, section 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub covering: Option<GeoParquetCovering>,
}

impl GeoParquetColumnMetadata {
    pub fn new(encoding: GeoParquetColumnEncoding) -> Self {
        Self {
            encoding,
            geometry_types: BTreeSet::new(),
            crs: None,
            bbox: None,
            covering: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<BBox>) -> Self {
        self.bbox = bbox.map(|b| vec![b.minx, b.miny, b.maxx, b.maxy]);
        self
    }
}

/// Top-level GeoParquet file metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoParquetMetadata {
    pub version: String,

    /// The name of the "primary" geometry column.
    pub primary_column: String,

    /// Metadata about geometry columns. Each key is the name of a geometry column in the table.
    pub columns: HashMap<String, GeoParquetColumnMetadata>,
}

impl GeoParquetMetadata {
    /// Metadata for a file with a single geometry column.
    pub fn new(primary_column: &str, column: GeoParquetColumnMetadata) -> Self {
        Self {
            version: GEOPARQUET_VERSION.to_string(),
            primary_column: primary_column.to_string(),
            columns: HashMap::from([(primary_column.to_string(), column)]),
        }
    }

    /// Construct a [`GeoParquetMetadata`] from Parquet [`FileMetaData`]
    ///
    /// Returns `None` if the file does not contain GeoParquet metadata (i.e. there is no `geo`
    /// key). Returns `Some(Err(...))` if the metadata is present but cannot be parsed.
    pub fn from_parquet_meta(metadata: &FileMetaData) -> Option<Result<Self>> {
        let kv_metadata = metadata.key_value_metadata()?;
        kv_metadata
            .iter()
            .find(|kv| kv.key == GEOPARQUET_METADATA_KEY)
            .and_then(|kv| kv.value.as_deref())
            .map(|value| Ok(serde_json::from_str(value)?))
    }

    /// Access the primary geometry column.
    pub fn primary(&self) -> Result<&GeoParquetColumnMetadata> {
        self.columns.get(&self.primary_column).ok_or_else(|| {
            CatchmentError::MissingGeometryColumn(self.primary_column.clone())
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serializes_like_geoparquet() {
        let mut column = GeoParquetColumnMetadata::new(GeoParquetColumnEncoding::WKB).with_bbox(
            Some(BBox {
                minx: 1.0,
                miny: 2.0,
                maxx: 3.0,
                maxy: 4.0,
            }),
        );
        column.geometry_types.insert("MultiPolygon".to_string());
        column.geometry_types.insert("Polygon".to_string());
        column.covering = Some(GeoParquetCovering {
            bbox: GeoParquetBboxCovering::from_bbox_columns(),
        });

        let json: Value =
            serde_json::from_str(&GeoParquetMetadata::new("geometry", column).to_json().unwrap())
                .unwrap();
        assert_eq!(json["version"], "1.1.0");
        assert_eq!(json["primary_column"], "geometry");

        let geometry = &json["columns"]["geometry"];
        assert_eq!(geometry["encoding"], "WKB");
        assert_eq!(
            geometry["geometry_types"],
            serde_json::json!(["MultiPolygon", "Polygon"])
        );
        assert_eq!(geometry["bbox"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(
            geometry["covering"]["bbox"]["ymax"],
            serde_json::json!(["bbox_maxy"])
        );
        assert!(geometry.get("crs").is_none());
    }

    #[test]
    fn parses_foreign_metadata() {
        let json = r#"{
            "version": "1.0.0",
            "primary_column": "geom",
            "columns": {
                "geom": {
                    "encoding": "WKB",
                    "geometry_types": [],
                    "crs": {"id": {"authority": "EPSG", "code": 4326}},
                    "edges": "planar"
                }
            }
        }"#;
        let meta: GeoParquetMetadata = serde_json::from_str(json).unwrap();
        let primary = meta.primary().unwrap();
        assert_eq!(primary.encoding, GeoParquetColumnEncoding::WKB);
        assert_eq!(primary.crs.as_ref().unwrap()["id"]["code"], 4326);
        assert!(primary.bbox.is_none());
    }

    #[test]
    fn explicit_null_crs_is_kept() {
        let json = r#"{
            "version": "1.1.0",
            "primary_column": "geometry",
            "columns": {
                "geometry": {"encoding": "WKB", "geometry_types": [], "crs": null},
                "other": {"encoding": "WKB", "geometry_types": []}
            }
        }"#;
        let meta: GeoParquetMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.columns["geometry"].crs, Some(Value::Null));
        assert_eq!(meta.columns["other"].crs, None);

        let written: Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();
        assert_eq!(written["columns"]["geometry"].get("crs"), Some(&Value::Null));
        assert!(written["columns"]["other"].get("crs").is_none());
    }
}
