use crate::array::MultiPolygonArray;
use crate::geometry;
use crate::scalar::Ring;
use crate::util::OffsetBufferUtils;

/// An Arrow equivalent of a Polygon
///
/// All rings are exposed alike; the first ring is conventionally the exterior.
#[derive(Debug, Clone, Copy)]
pub struct Polygon<'a> {
    pub(crate) array: &'a MultiPolygonArray,

    pub(crate) polygon_index: usize,

    start_offset: usize,

    end_offset: usize,
}

impl<'a> Polygon<'a> {
    pub(crate) fn new(array: &'a MultiPolygonArray, polygon_index: usize) -> Self {
        let (start_offset, end_offset) = array.polygon_offsets.start_end(polygon_index);
        Self {
            array,
            polygon_index,
            start_offset,
            end_offset,
        }
    }

    pub fn num_rings(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// The ring entry at `i`, or `None` if that entry is null.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_rings()`.
    pub fn ring(&self, i: usize) -> Option<Ring<'a>> {
        assert!(i < self.num_rings());
        let ring_index = self.start_offset + i;
        self.array
            .is_ring_valid(ring_index)
            .then(|| Ring::new(self.array, ring_index))
    }

    pub fn rings(
        &self,
    ) -> impl DoubleEndedIterator<Item = Option<Ring<'a>>> + ExactSizeIterator + 'a {
        let this = *self;
        (0..self.num_rings()).map(move |i| this.ring(i))
    }

    pub fn to_owned(&self) -> geometry::Polygon {
        self.rings().map(|ring| ring.map(|r| r.to_owned())).collect()
    }
}
