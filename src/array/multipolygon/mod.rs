//! Contains the [`MultiPolygonArray`] and [`MultiPolygonBuilder`] for arrays of MultiPolygon
//! geometries.

pub use array::{MultiPolygonArray, MULTIPOLYGON_EXTENSION_NAME};
pub use builder::MultiPolygonBuilder;

mod array;
mod builder;
