use crate::array::MultiPolygonArray;
use crate::geometry::{self, Vertex};
use crate::util::OffsetBufferUtils;

/// An Arrow equivalent of a polygon ring: an ordered run of vertices, any of which may be null.
#[derive(Debug, Clone, Copy)]
pub struct Ring<'a> {
    pub(crate) array: &'a MultiPolygonArray,

    pub(crate) ring_index: usize,

    start_offset: usize,

    end_offset: usize,
}

impl<'a> Ring<'a> {
    pub(crate) fn new(array: &'a MultiPolygonArray, ring_index: usize) -> Self {
        let (start_offset, end_offset) = array.ring_offsets.start_end(ring_index);
        Self {
            array,
            ring_index,
            start_offset,
            end_offset,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// The vertex at `i`, or `None` if it is null.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_vertices()`.
    #[inline]
    pub fn vertex(&self, i: usize) -> Option<Vertex> {
        assert!(i < self.num_vertices());
        self.array.coords.vertex(self.start_offset + i)
    }

    pub fn vertices(
        &self,
    ) -> impl DoubleEndedIterator<Item = Option<Vertex>> + ExactSizeIterator + 'a {
        let array: &'a MultiPolygonArray = self.array;
        let coords = &array.coords;
        (self.start_offset..self.end_offset).map(move |i| coords.vertex(i))
    }

    pub fn to_owned(&self) -> geometry::Ring {
        self.vertices().collect()
    }
}
