//! Coordinate buffers for the vertex level of the multipolygon layout.
//!
//! Coordinates can be either _interleaved_, where they're represented as a `FixedSizeList`, or
//! _separated_, where they're represented with a `StructArray`.

pub mod interleaved;
pub mod separated;

pub use interleaved::InterleavedCoordBuffer;
pub use separated::SeparatedCoordBuffer;

use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, Float64Array};
use arrow_cast::{can_cast_types, cast};
use arrow_schema::DataType;

use crate::error::{CatchmentError, Result};
use crate::geometry::Vertex;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordType {
    Interleaved,
    #[default]
    Separated,
}

/// A buffer of coordinates, in either layout.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordBuffer {
    Interleaved(InterleavedCoordBuffer),
    Separated(SeparatedCoordBuffer),
}

impl CoordBuffer {
    pub fn coord_type(&self) -> CoordType {
        match self {
            CoordBuffer::Interleaved(_) => CoordType::Interleaved,
            CoordBuffer::Separated(_) => CoordType::Separated,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CoordBuffer::Interleaved(c) => c.len(),
            CoordBuffer::Separated(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The vertex at `index`, or `None` when it is null.
    #[inline]
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        match self {
            CoordBuffer::Interleaved(c) => c.vertex(index),
            CoordBuffer::Separated(c) => c.vertex(index),
        }
    }

    /// Decode the innermost vertices array of a geometry column.
    pub fn from_arrow(array: &dyn Array) -> Result<Self> {
        match array.data_type() {
            DataType::Struct(_) => Ok(CoordBuffer::Separated(
                SeparatedCoordBuffer::from_arrow(array.as_struct())?,
            )),
            DataType::FixedSizeList(_, _) => Ok(CoordBuffer::Interleaved(
                InterleavedCoordBuffer::from_arrow(array.as_fixed_size_list())?,
            )),
            dt => Err(CatchmentError::UnsupportedGeometryShape(
                format!("unexpected vertex type: {dt:?}").into(),
            )),
        }
    }
}

/// View a numeric coordinate array as `Float64`, casting other numeric types.
pub(crate) fn float64_values(array: &dyn Array) -> Result<Float64Array> {
    match array.data_type() {
        DataType::Float64 => Ok(array.as_primitive::<Float64Type>().clone()),
        dt if dt.is_numeric() && can_cast_types(dt, &DataType::Float64) => {
            let casted = cast(array, &DataType::Float64)?;
            Ok(casted.as_primitive::<Float64Type>().clone())
        }
        dt => Err(CatchmentError::UnsupportedGeometryShape(
            format!("coordinates must be numeric, got {dt:?}").into(),
        )),
    }
}
