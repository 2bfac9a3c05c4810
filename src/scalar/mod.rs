//! Contains implementations of GeoArrow scalars, which are references onto a full GeoArrow array
//! at a specific index.

pub use multipolygon::MultiPolygon;
pub use polygon::Polygon;
pub use ring::Ring;

pub mod multipolygon;
pub mod polygon;
pub mod ring;
