//! Read vector layers through GDAL's Arrow stream interface.

pub use reader::{read_gdal, read_gdal_layer, GdalReaderOptions};

mod reader;
