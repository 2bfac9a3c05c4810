//! Algorithms implemented directly on the native array layout.

pub mod bounding_rect;
mod total_bounds;

pub use bounding_rect::{
    bbox_columns, bounding_rect_multipolygon, BBox, BBoxColumns, BoundingRect, BoundingRects,
    BBOX_COLUMN_NAMES,
};
pub use total_bounds::TotalBounds;
