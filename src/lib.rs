//! Conversion of catchment survey data between CSV, GeoPackage, GeoParquet and Arrow IPC, built
//! around a [GeoArrow](https://github.com/geoarrow/geoarrow) multipolygon array with per-row
//! bounding boxes.
//!
//! The central operation is [`Table::append_bbox_columns`], which computes the axis-aligned
//! bounding box of every row of a nested multipolygon column and appends it as four `Float64`
//! columns. The [`pipeline`] module chains the file conversions around it.
//!
//! [`Table::append_bbox_columns`]: table::Table::append_bbox_columns

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use trait_::GeometryArrayTrait;

pub mod algorithm;
pub mod array;
pub mod error;
pub mod geometry;
pub mod io;
pub mod join;
pub mod pipeline;
pub mod scalar;
pub mod table;
#[cfg(test)]
pub(crate) mod test;
pub mod trait_;
mod util;
