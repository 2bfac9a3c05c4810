//! Decode Well-Known Binary (WKB) geometry columns into the native multipolygon layout.

pub use reader::{from_wkb, wkb_geometry_types};

mod reader;
