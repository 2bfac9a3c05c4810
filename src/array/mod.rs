//! Contains implementations of GeoArrow arrays.

pub use coord::{CoordBuffer, CoordType, InterleavedCoordBuffer, SeparatedCoordBuffer};
pub use multipolygon::{MultiPolygonArray, MultiPolygonBuilder, MULTIPOLYGON_EXTENSION_NAME};

pub mod coord;
pub mod multipolygon;
pub mod offset_builder;
