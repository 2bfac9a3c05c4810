use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray};
use arrow_buffer::{NullBuffer, ScalarBuffer};
use arrow_schema::DataType;

use crate::array::coord::float64_values;
use crate::error::{CatchmentError, Result};
use crate::geometry::Vertex;

/// An array of coordinates stored interleaved in a single buffer: `xyxyxy` for 2D, `xyzxyz` for
/// 3D, and so on. Only the first two values of each coordinate are read.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedCoordBuffer {
    pub(crate) coords: ScalarBuffer<f64>,

    /// Number of values per coordinate, between 2 and 4.
    pub(crate) size: usize,

    /// Validity per coordinate, combining the list validity with the x / y value validity.
    pub(crate) nulls: Option<NullBuffer>,
}

impl InterleavedCoordBuffer {
    /// Construct a new InterleavedCoordBuffer.
    ///
    /// # Errors
    ///
    /// - if `size` is outside `2..=4`
    /// - if the coords buffer does not divide evenly into coordinates of `size`
    /// - if `nulls` is not `None` and its length differs from the number of coordinates
    pub fn try_new(
        coords: ScalarBuffer<f64>,
        size: usize,
        nulls: Option<NullBuffer>,
    ) -> Result<Self> {
        if !(2..=4).contains(&size) {
            return Err(CatchmentError::UnsupportedGeometryShape(
                format!("interleaved coordinates must have 2 to 4 values, got {size}").into(),
            ));
        }
        if coords.len() % size != 0 {
            return Err(CatchmentError::General(
                "coords buffer length must be a multiple of the coordinate size".to_string(),
            ));
        }
        if nulls.as_ref().is_some_and(|n| n.len() != coords.len() / size) {
            return Err(CatchmentError::General(
                "validity mask length must match the number of coordinates".to_string(),
            ));
        }
        Ok(Self {
            coords,
            size,
            nulls,
        })
    }

    pub fn len(&self) -> usize {
        self.coords.len() / self.size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        if self.nulls.as_ref().is_some_and(|n| n.is_null(index)) {
            return None;
        }
        let start = index * self.size;
        Some(Vertex::new(self.coords[start], self.coords[start + 1]))
    }

    /// Decode a `fixed_size_list<double>[n]` array.
    pub fn from_arrow(array: &FixedSizeListArray) -> Result<Self> {
        let size = array.value_length() as usize;
        if size < 2 {
            return Err(CatchmentError::UnsupportedGeometryShape(
                format!("interleaved coordinates must have 2 to 4 values, got {size}").into(),
            ));
        }
        let values = float64_values(array.values().as_ref())?;

        // Fold any null x or y value into the per-coordinate validity
        let value_nulls = values.nulls().map(|nulls| {
            NullBuffer::from_iter((0..array.len()).map(|i| {
                let start = i * size;
                nulls.is_valid(start) && nulls.is_valid(start + 1)
            }))
        });
        let nulls = NullBuffer::union(array.nulls(), value_nulls.as_ref());

        Self::try_new(values.values().clone(), size, nulls)
    }
}

impl TryFrom<&dyn Array> for InterleavedCoordBuffer {
    type Error = CatchmentError;

    fn try_from(value: &dyn Array) -> Result<Self> {
        match value.data_type() {
            DataType::FixedSizeList(_, _) => Self::from_arrow(value.as_fixed_size_list()),
            dt => Err(CatchmentError::UnsupportedGeometryShape(
                format!("expected interleaved vertices, got {dt:?}").into(),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow_array::Float64Array;
    use arrow_schema::Field;

    use super::*;

    #[test]
    fn reads_first_two_values_of_xyz() {
        let values = Float64Array::from(vec![1.0, 2.0, 9.0, 3.0, 4.0, 9.0]);
        let field = Arc::new(Field::new("xyz", DataType::Float64, false));
        let array = FixedSizeListArray::new(field, 3, Arc::new(values), None);

        let coords = InterleavedCoordBuffer::from_arrow(&array).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.vertex(0), Some(Vertex::new(1.0, 2.0)));
        assert_eq!(coords.vertex(1), Some(Vertex::new(3.0, 4.0)));
    }

    #[test]
    fn null_list_entry_is_absent() {
        let values = Float64Array::from(vec![1.0, 2.0, 3.0, 4.0]);
        let field = Arc::new(Field::new("xy", DataType::Float64, false));
        let array = FixedSizeListArray::new(
            field,
            2,
            Arc::new(values),
            Some(NullBuffer::from(vec![false, true])),
        );

        let coords = InterleavedCoordBuffer::from_arrow(&array).unwrap();
        assert_eq!(coords.vertex(0), None);
        assert_eq!(coords.vertex(1), Some(Vertex::new(3.0, 4.0)));
    }

    #[test]
    fn one_dimensional_is_unsupported() {
        let values = Float64Array::from(vec![1.0, 2.0]);
        let field = Arc::new(Field::new("x", DataType::Float64, false));
        let array = FixedSizeListArray::new(field, 1, Arc::new(values), None);
        assert!(InterleavedCoordBuffer::from_arrow(&array).is_err());
    }
}
