use crate::array::MultiPolygonArray;
use crate::geometry;
use crate::scalar::Polygon;
use crate::util::OffsetBufferUtils;

/// An Arrow equivalent of a MultiPolygon
///
/// A view onto one row of a [`MultiPolygonArray`]. Polygons are yielded as `Option`s since any
/// polygon entry may be null.
#[derive(Debug, Clone, Copy)]
pub struct MultiPolygon<'a> {
    pub(crate) array: &'a MultiPolygonArray,

    pub(crate) geom_index: usize,

    start_offset: usize,

    end_offset: usize,
}

impl<'a> MultiPolygon<'a> {
    pub(crate) fn new(array: &'a MultiPolygonArray, geom_index: usize) -> Self {
        let (start_offset, end_offset) = array.geom_offsets.start_end(geom_index);
        Self {
            array,
            geom_index,
            start_offset,
            end_offset,
        }
    }

    /// The number of polygon entries, null entries included.
    pub fn num_polygons(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// The polygon entry at `i`, or `None` if that entry is null.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_polygons()`.
    pub fn polygon(&self, i: usize) -> Option<Polygon<'a>> {
        assert!(i < self.num_polygons());
        let polygon_index = self.start_offset + i;
        self.array
            .is_polygon_valid(polygon_index)
            .then(|| Polygon::new(self.array, polygon_index))
    }

    /// Iterate over the polygon entries of this geometry in order.
    pub fn polygons(
        &self,
    ) -> impl DoubleEndedIterator<Item = Option<Polygon<'a>>> + ExactSizeIterator + 'a {
        let this = *self;
        (0..self.num_polygons()).map(move |i| this.polygon(i))
    }

    /// Copy this view into an owned [`geometry::MultiPolygon`].
    pub fn to_owned(&self) -> geometry::MultiPolygon {
        self.polygons()
            .map(|polygon| polygon.map(|p| p.to_owned()))
            .collect()
    }
}

impl From<MultiPolygon<'_>> for geometry::MultiPolygon {
    fn from(value: MultiPolygon<'_>) -> Self {
        value.to_owned()
    }
}
