use crate::algorithm::native::bounding_rect::BoundingRect;
use crate::array::MultiPolygonArray;
use crate::trait_::GeometryArrayTrait;

/// Computes the total bounds (extent) of the input.
pub trait TotalBounds {
    fn total_bounds(&self) -> BoundingRect;
}

impl TotalBounds for MultiPolygonArray {
    fn total_bounds(&self) -> BoundingRect {
        let mut bounds = BoundingRect::new();
        for geom in self.iter().flatten() {
            bounds.add_multi_polygon(&geom);
        }
        bounds
    }
}
