use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, Float64Array, StructArray};
use arrow_buffer::{NullBuffer, ScalarBuffer};
use arrow_schema::{DataType, Field, Fields};

use crate::array::coord::float64_values;
use crate::error::{CatchmentError, Result};
use crate::geometry::Vertex;

/// An array of coordinates stored in separate `x` and `y` buffers of the same length.
///
/// This is the `struct<x: double, y: double>` vertex layout. Any further struct children (`z`,
/// `m`) are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatedCoordBuffer {
    pub(crate) x: ScalarBuffer<f64>,
    pub(crate) y: ScalarBuffer<f64>,

    /// Union of the struct validity and the `x` / `y` child validity.
    pub(crate) nulls: Option<NullBuffer>,
}

impl SeparatedCoordBuffer {
    /// Construct a new SeparatedCoordBuffer from its parts.
    ///
    /// # Errors
    ///
    /// - if `x` and `y` differ in length
    /// - if `nulls` is not `None` and its length differs from the number of coordinates
    pub fn try_new(
        x: ScalarBuffer<f64>,
        y: ScalarBuffer<f64>,
        nulls: Option<NullBuffer>,
    ) -> Result<Self> {
        if x.len() != y.len() {
            return Err(CatchmentError::UnsupportedGeometryShape(
                "x and y coordinate buffers must have the same length".into(),
            ));
        }
        if nulls.as_ref().is_some_and(|n| n.len() != x.len()) {
            return Err(CatchmentError::General(
                "validity mask length must match the number of coordinates".to_string(),
            ));
        }
        Ok(Self { x, y, nulls })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The vertex at `index`, or `None` when it is null.
    #[inline]
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        if self.nulls.as_ref().is_some_and(|n| n.is_null(index)) {
            return None;
        }
        Some(Vertex::new(self.x[index], self.y[index]))
    }

    pub(crate) fn storage_type() -> DataType {
        DataType::Struct(Self::values_fields())
    }

    fn values_fields() -> Fields {
        Fields::from(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
        ])
    }

    /// Decode a `struct<x, y, ...>` array.
    pub fn from_arrow(array: &StructArray) -> Result<Self> {
        let x = child_by_name(array, "x")?;
        let y = child_by_name(array, "y")?;

        let nulls = NullBuffer::union(array.nulls(), x.nulls());
        let nulls = NullBuffer::union(nulls.as_ref(), y.nulls());

        Self::try_new(x.values().clone(), y.values().clone(), nulls)
    }
}

fn child_by_name(array: &StructArray, name: &'static str) -> Result<Float64Array> {
    let column = array.column_by_name(name).ok_or_else(|| {
        CatchmentError::UnsupportedGeometryShape(
            format!("vertex struct has no '{name}' field").into(),
        )
    })?;
    float64_values(column.as_ref())
}

impl From<SeparatedCoordBuffer> for StructArray {
    fn from(value: SeparatedCoordBuffer) -> Self {
        let x: ArrayRef = Arc::new(Float64Array::new(value.x, None));
        let y: ArrayRef = Arc::new(Float64Array::new(value.y, None));
        StructArray::new(SeparatedCoordBuffer::values_fields(), vec![x, y], value.nulls)
    }
}

impl TryFrom<&dyn Array> for SeparatedCoordBuffer {
    type Error = CatchmentError;

    fn try_from(value: &dyn Array) -> Result<Self> {
        match value.data_type() {
            DataType::Struct(_) => Self::from_arrow(value.as_struct()),
            dt => Err(CatchmentError::UnsupportedGeometryShape(
                format!("expected struct vertices, got {dt:?}").into(),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use arrow_array::Int32Array;

    #[test]
    fn child_nulls_mark_vertex_absent() {
        let x: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0)]));
        let y: ArrayRef = Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0]));
        let fields = Fields::from(vec![
            Field::new("x", DataType::Float64, true),
            Field::new("y", DataType::Float64, false),
        ]);
        let array = StructArray::new(
            fields,
            vec![x, y],
            Some(NullBuffer::from(vec![true, true, false])),
        );

        let coords = SeparatedCoordBuffer::from_arrow(&array).unwrap();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords.vertex(0), Some(Vertex::new(1.0, 1.0)));
        assert_eq!(coords.vertex(1), None);
        assert_eq!(coords.vertex(2), None);
    }

    #[test]
    fn integer_coordinates_are_cast() {
        let x: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let y: ArrayRef = Arc::new(Int32Array::from(vec![3, 4]));
        let fields = Fields::from(vec![
            Field::new("x", DataType::Int32, false),
            Field::new("y", DataType::Int32, false),
        ]);
        let array = StructArray::new(fields, vec![x, y], None);
        let coords = SeparatedCoordBuffer::from_arrow(&array).unwrap();
        assert_eq!(coords.vertex(1), Some(Vertex::new(2.0, 4.0)));
    }

    #[test]
    fn missing_y_is_unsupported() {
        let x: ArrayRef = Arc::new(Float64Array::from(vec![1.0]));
        let fields = Fields::from(vec![Field::new("x", DataType::Float64, false)]);
        let array = StructArray::new(fields, vec![x], None);
        let err = SeparatedCoordBuffer::from_arrow(&array).unwrap_err();
        assert!(matches!(err, CatchmentError::UnsupportedGeometryShape(_)));
    }
}
