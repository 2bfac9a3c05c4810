//! Algorithms implemented on and returning GeoArrow arrays.

pub mod native;
