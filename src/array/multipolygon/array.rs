use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, GenericListArray};
use arrow_buffer::{NullBuffer, OffsetBuffer};
use arrow_schema::{DataType, Field};

use crate::array::coord::{CoordBuffer, SeparatedCoordBuffer};
use crate::error::{CatchmentError, Result};
use crate::scalar::MultiPolygon;
use crate::trait_::GeometryArrayTrait;
use crate::util::{offsets_buffer_i64_to_i32, OffsetBufferUtils};

/// Arrow extension name of the native multipolygon encoding.
pub const MULTIPOLYGON_EXTENSION_NAME: &str = "geoarrow.multipolygon";

/// An immutable array of MultiPolygon geometries using GeoArrow's in-memory representation.
///
/// This is semantically equivalent to `Vec<Option<MultiPolygon>>`, except that validity is
/// tracked at every level: polygons, rings and vertices may each be null as well.
#[derive(Debug, Clone)]
pub struct MultiPolygonArray {
    pub(crate) coords: CoordBuffer,

    /// Offsets into the polygon array where each geometry starts
    pub(crate) geom_offsets: OffsetBuffer<i32>,

    /// Offsets into the ring array where each polygon starts
    pub(crate) polygon_offsets: OffsetBuffer<i32>,

    /// Offsets into the coordinate array where each ring starts
    pub(crate) ring_offsets: OffsetBuffer<i32>,

    /// Validity bitmap of the geometries
    pub(crate) validity: Option<NullBuffer>,

    /// Validity of each polygon entry, indexed by the values of `geom_offsets`
    pub(crate) polygon_validity: Option<NullBuffer>,

    /// Validity of each ring entry, indexed by the values of `polygon_offsets`
    pub(crate) ring_validity: Option<NullBuffer>,
}

pub(super) fn check(
    coords: &CoordBuffer,
    geom_offsets: &OffsetBuffer<i32>,
    polygon_offsets: &OffsetBuffer<i32>,
    ring_offsets: &OffsetBuffer<i32>,
    validity_len: Option<usize>,
    polygon_validity_len: Option<usize>,
    ring_validity_len: Option<usize>,
) -> Result<()> {
    if validity_len.is_some_and(|len| len != geom_offsets.len_proxy()) {
        return Err(CatchmentError::General(
            "validity mask length must match the number of values".to_string(),
        ));
    }
    if polygon_validity_len.is_some_and(|len| len < *geom_offsets.last() as usize) {
        return Err(CatchmentError::General(
            "polygon validity mask is shorter than the polygon array".to_string(),
        ));
    }
    if ring_validity_len.is_some_and(|len| len < *polygon_offsets.last() as usize) {
        return Err(CatchmentError::General(
            "ring validity mask is shorter than the ring array".to_string(),
        ));
    }

    // Offsets of sliced children may stop short of the end of the child array
    if *ring_offsets.last() as usize > coords.len() {
        return Err(CatchmentError::General(
            "largest ring offset must not exceed coords length".to_string(),
        ));
    }
    if *polygon_offsets.last() as usize > ring_offsets.len_proxy() {
        return Err(CatchmentError::General(
            "largest polygon offset must not exceed ring offsets length".to_string(),
        ));
    }
    if *geom_offsets.last() as usize > polygon_offsets.len_proxy() {
        return Err(CatchmentError::General(
            "largest geometry offset must not exceed polygon offsets length".to_string(),
        ));
    }

    Ok(())
}

impl MultiPolygonArray {
    /// Create a new MultiPolygonArray from parts
    ///
    /// # Implementation
    ///
    /// This function is `O(1)`.
    ///
    /// # Errors
    ///
    /// - if a validity buffer is not `None` and its length is different from the number of
    ///   entries at its level
    /// - if the largest ring offset exceeds the number of coordinates
    /// - if the largest polygon offset exceeds the size of ring offsets
    /// - if the largest geometry offset exceeds the size of polygon offsets
    pub fn try_new(
        coords: CoordBuffer,
        geom_offsets: OffsetBuffer<i32>,
        polygon_offsets: OffsetBuffer<i32>,
        ring_offsets: OffsetBuffer<i32>,
        validity: Option<NullBuffer>,
        polygon_validity: Option<NullBuffer>,
        ring_validity: Option<NullBuffer>,
    ) -> Result<Self> {
        check(
            &coords,
            &geom_offsets,
            &polygon_offsets,
            &ring_offsets,
            validity.as_ref().map(|v| v.len()),
            polygon_validity.as_ref().map(|v| v.len()),
            ring_validity.as_ref().map(|v| v.len()),
        )?;
        Ok(Self {
            coords,
            geom_offsets,
            polygon_offsets,
            ring_offsets,
            validity,
            polygon_validity,
            ring_validity,
        })
    }

    /// Access the underlying coordinate buffer
    pub fn coords(&self) -> &CoordBuffer {
        &self.coords
    }

    /// Access the underlying geometry offsets buffer
    pub fn geom_offsets(&self) -> &OffsetBuffer<i32> {
        &self.geom_offsets
    }

    /// Access the underlying polygon offsets buffer
    pub fn polygon_offsets(&self) -> &OffsetBuffer<i32> {
        &self.polygon_offsets
    }

    /// Access the underlying ring offsets buffer
    pub fn ring_offsets(&self) -> &OffsetBuffer<i32> {
        &self.ring_offsets
    }

    #[inline]
    pub(crate) fn is_polygon_valid(&self, polygon_index: usize) -> bool {
        self.polygon_validity
            .as_ref()
            .map_or(true, |v| v.is_valid(polygon_index))
    }

    #[inline]
    pub(crate) fn is_ring_valid(&self, ring_index: usize) -> bool {
        self.ring_validity
            .as_ref()
            .map_or(true, |v| v.is_valid(ring_index))
    }

    /// Slices this [`MultiPolygonArray`] in place.
    ///
    /// # Panic
    ///
    /// This function panics iff `offset + length > self.len()`.
    #[inline]
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset + length <= self.len(),
            "offset + length may not exceed length of array"
        );
        // Only the geometry offsets are sliced; the children keep their absolute positions.
        Self {
            coords: self.coords.clone(),
            geom_offsets: self.geom_offsets.slice(offset, length),
            polygon_offsets: self.polygon_offsets.clone(),
            ring_offsets: self.ring_offsets.clone(),
            validity: self.validity.as_ref().map(|v| v.slice(offset, length)),
            polygon_validity: self.polygon_validity.clone(),
            ring_validity: self.ring_validity.clone(),
        }
    }

    fn vertices_field(&self) -> Arc<Field> {
        let (data_type, nullable) = match &self.coords {
            CoordBuffer::Separated(c) => (SeparatedCoordBuffer::storage_type(), c.nulls.is_some()),
            CoordBuffer::Interleaved(c) => (
                DataType::FixedSizeList(
                    Field::new("xy", DataType::Float64, false).into(),
                    c.size as i32,
                ),
                c.nulls.is_some(),
            ),
        };
        Field::new("vertices", data_type, nullable).into()
    }

    fn rings_field(&self) -> Arc<Field> {
        Field::new_list("rings", self.vertices_field(), self.ring_validity.is_some()).into()
    }

    fn polygons_field(&self) -> Arc<Field> {
        Field::new_list(
            "polygons",
            self.rings_field(),
            self.polygon_validity.is_some(),
        )
        .into()
    }

    /// The Arrow storage type of this array.
    pub fn storage_type(&self) -> DataType {
        DataType::List(self.polygons_field())
    }

    /// A field for this array tagged with the `geoarrow.multipolygon` extension name.
    ///
    /// `crs` is stored verbatim as the extension metadata's `crs` member.
    pub fn extension_field(&self, name: &str, crs: Option<&serde_json::Value>) -> Field {
        let mut metadata = HashMap::from([(
            "ARROW:extension:name".to_string(),
            MULTIPOLYGON_EXTENSION_NAME.to_string(),
        )]);
        let extension_metadata = match crs {
            Some(crs) => serde_json::json!({ "crs": crs }),
            None => serde_json::json!({}),
        };
        metadata.insert(
            "ARROW:extension:metadata".to_string(),
            extension_metadata.to_string(),
        );
        Field::new(name, self.storage_type(), true).with_metadata(metadata)
    }

    pub fn into_arrow(self) -> GenericListArray<i32> {
        let vertices_field = self.vertices_field();
        let rings_field = self.rings_field();
        let polygons_field = self.polygons_field();

        let coord_array: ArrayRef = match self.coords {
            CoordBuffer::Separated(c) => Arc::new(arrow_array::StructArray::from(c)),
            CoordBuffer::Interleaved(c) => {
                let values = arrow_array::Float64Array::new(c.coords, None);
                Arc::new(arrow_array::FixedSizeListArray::new(
                    Field::new("xy", DataType::Float64, false).into(),
                    c.size as i32,
                    Arc::new(values),
                    c.nulls,
                ))
            }
        };
        let ring_array = Arc::new(GenericListArray::new(
            vertices_field,
            self.ring_offsets,
            coord_array,
            self.ring_validity,
        ));
        let polygons_array = Arc::new(GenericListArray::new(
            rings_field,
            self.polygon_offsets,
            ring_array,
            self.polygon_validity,
        ));
        GenericListArray::new(
            polygons_field,
            self.geom_offsets,
            polygons_array,
            self.validity,
        )
    }

    pub fn into_array_ref(self) -> ArrayRef {
        Arc::new(self.into_arrow())
    }
}

impl<'a> GeometryArrayTrait<'a> for MultiPolygonArray {
    type Scalar = MultiPolygon<'a>;

    fn value(&'a self, i: usize) -> Self::Scalar {
        MultiPolygon::new(self, i)
    }

    #[inline]
    fn len(&self) -> usize {
        self.geom_offsets.len_proxy()
    }

    #[inline]
    fn nulls(&self) -> Option<&NullBuffer> {
        self.validity.as_ref()
    }
}

/// Offsets, validity and values of one list level, with offsets normalized to `i32`.
fn list_parts(array: &dyn Array) -> Result<(OffsetBuffer<i32>, Option<NullBuffer>, ArrayRef)> {
    match array.data_type() {
        DataType::List(_) => {
            let list = array.as_list::<i32>();
            Ok((
                list.offsets().clone(),
                list.nulls().cloned(),
                list.values().clone(),
            ))
        }
        DataType::LargeList(_) => {
            let list = array.as_list::<i64>();
            Ok((
                offsets_buffer_i64_to_i32(list.offsets())?,
                list.nulls().cloned(),
                list.values().clone(),
            ))
        }
        dt => Err(CatchmentError::UnsupportedGeometryShape(
            format!("expected a list level, got {dt:?}").into(),
        )),
    }
}

fn is_coord_type(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Struct(_) | DataType::FixedSizeList(_, _))
}

impl TryFrom<&dyn Array> for MultiPolygonArray {
    type Error = CatchmentError;

    /// Decode a native multipolygon column, `list<list<list<vertex>>>`, or a native polygon
    /// column, `list<list<vertex>>`, whose rows become single-polygon multipolygons.
    fn try_from(value: &dyn Array) -> Result<Self> {
        let (outer_offsets, outer_validity, outer_values) = list_parts(value)?;
        let (middle_offsets, middle_validity, middle_values) = list_parts(outer_values.as_ref())?;

        if is_coord_type(middle_values.data_type()) {
            let coords = CoordBuffer::from_arrow(middle_values.as_ref())?;
            let num_rows = outer_offsets.len_proxy();
            return Self::try_new(
                coords,
                OffsetBuffer::from_lengths(std::iter::repeat(1).take(num_rows)),
                outer_offsets,
                middle_offsets,
                outer_validity,
                None,
                middle_validity,
            );
        }

        let (inner_offsets, inner_validity, inner_values) = list_parts(middle_values.as_ref())?;
        let coords = CoordBuffer::from_arrow(inner_values.as_ref())?;

        Self::try_new(
            coords,
            outer_offsets,
            middle_offsets,
            inner_offsets,
            outer_validity,
            middle_validity,
            inner_validity,
        )
    }
}

impl TryFrom<ArrayRef> for MultiPolygonArray {
    type Error = CatchmentError;

    fn try_from(value: ArrayRef) -> Result<Self> {
        value.as_ref().try_into()
    }
}
