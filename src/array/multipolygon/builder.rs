use arrow_buffer::{NullBufferBuilder, ScalarBuffer};
use geo_traits::{CoordTrait, LineStringTrait, MultiPolygonTrait, PolygonTrait};

use crate::array::coord::{CoordBuffer, SeparatedCoordBuffer};
use crate::array::offset_builder::OffsetsBuilder;
use crate::array::MultiPolygonArray;
use crate::error::Result;
use crate::geometry::{GeometryCell, MultiPolygon, Polygon, Ring, Vertex};

/// The Arrow equivalent to `Vec<Option<MultiPolygon>>`.
///
/// Always writes separated (`struct<x, y>`) coordinates. Converting a [`MultiPolygonBuilder`]
/// into a [`MultiPolygonArray`] is `O(1)`.
#[derive(Debug)]
pub struct MultiPolygonBuilder {
    x: Vec<f64>,
    y: Vec<f64>,
    coord_validity: NullBufferBuilder,

    /// OffsetsBuilder into the coordinate array where each ring starts
    ring_offsets: OffsetsBuilder,
    ring_validity: NullBufferBuilder,

    /// OffsetsBuilder into the ring array where each polygon starts
    polygon_offsets: OffsetsBuilder,
    polygon_validity: NullBufferBuilder,

    /// OffsetsBuilder into the polygon array where each geometry starts
    geom_offsets: OffsetsBuilder,
    validity: NullBufferBuilder,
}

impl Default for MultiPolygonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiPolygonBuilder {
    /// Creates a new empty [`MultiPolygonBuilder`].
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new [`MultiPolygonBuilder`] with room for `geom_capacity` geometries.
    pub fn with_capacity(geom_capacity: usize) -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            coord_validity: NullBufferBuilder::new(0),
            ring_offsets: OffsetsBuilder::new(),
            ring_validity: NullBufferBuilder::new(0),
            polygon_offsets: OffsetsBuilder::new(),
            polygon_validity: NullBufferBuilder::new(0),
            geom_offsets: OffsetsBuilder::with_capacity(geom_capacity),
            validity: NullBufferBuilder::new(geom_capacity),
        }
    }

    /// The number of geometries pushed so far.
    pub fn len(&self) -> usize {
        self.geom_offsets.len_proxy()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a null geometry.
    pub fn push_null(&mut self) {
        self.geom_offsets.extend_empty();
        self.validity.append_null();
    }

    /// Add an owned geometry cell, keeping nulls at every level.
    pub fn push_cell(&mut self, cell: &GeometryCell) -> Result<()> {
        match cell {
            Some(multi_polygon) => self.push_owned_multi_polygon(multi_polygon),
            None => {
                self.push_null();
                Ok(())
            }
        }
    }

    fn push_owned_multi_polygon(&mut self, multi_polygon: &MultiPolygon) -> Result<()> {
        self.geom_offsets.try_push_usize(multi_polygon.len())?;
        self.validity.append_non_null();
        for polygon in multi_polygon {
            self.push_owned_polygon(polygon.as_ref())?;
        }
        Ok(())
    }

    fn push_owned_polygon(&mut self, polygon: Option<&Polygon>) -> Result<()> {
        let Some(polygon) = polygon else {
            self.polygon_offsets.extend_empty();
            self.polygon_validity.append_null();
            return Ok(());
        };
        self.polygon_offsets.try_push_usize(polygon.len())?;
        self.polygon_validity.append_non_null();
        for ring in polygon {
            self.push_owned_ring(ring.as_ref())?;
        }
        Ok(())
    }

    fn push_owned_ring(&mut self, ring: Option<&Ring>) -> Result<()> {
        let Some(ring) = ring else {
            self.ring_offsets.extend_empty();
            self.ring_validity.append_null();
            return Ok(());
        };
        self.ring_offsets.try_push_usize(ring.len())?;
        self.ring_validity.append_non_null();
        for vertex in ring {
            self.push_vertex(vertex.as_ref());
        }
        Ok(())
    }

    fn push_vertex(&mut self, vertex: Option<&Vertex>) {
        match vertex {
            Some(v) => {
                self.x.push(v.x);
                self.y.push(v.y);
                self.coord_validity.append_non_null();
            }
            None => {
                self.x.push(0.0);
                self.y.push(0.0);
                self.coord_validity.append_null();
            }
        }
    }

    fn push_coord(&mut self, coord: &impl CoordTrait<T = f64>) {
        self.x.push(coord.x());
        self.y.push(coord.y());
        self.coord_validity.append_non_null();
    }

    fn push_ring_trait(&mut self, ring: &impl LineStringTrait<T = f64>) -> Result<()> {
        self.ring_offsets.try_push_usize(ring.num_coords())?;
        self.ring_validity.append_non_null();
        for coord in ring.coords() {
            self.push_coord(&coord);
        }
        Ok(())
    }

    fn push_polygon_rings(&mut self, polygon: &impl PolygonTrait<T = f64>) -> Result<()> {
        let num_rings = usize::from(polygon.exterior().is_some()) + polygon.num_interiors();
        self.polygon_offsets.try_push_usize(num_rings)?;
        self.polygon_validity.append_non_null();
        if let Some(exterior) = polygon.exterior() {
            self.push_ring_trait(&exterior)?;
        }
        for interior in polygon.interiors() {
            self.push_ring_trait(&interior)?;
        }
        Ok(())
    }

    /// Add a polygon as a single-polygon multipolygon.
    pub fn push_polygon(&mut self, polygon: &impl PolygonTrait<T = f64>) -> Result<()> {
        self.geom_offsets.try_push_usize(1)?;
        self.validity.append_non_null();
        self.push_polygon_rings(polygon)
    }

    /// Add a multipolygon.
    pub fn push_multi_polygon(
        &mut self,
        multi_polygon: &impl MultiPolygonTrait<T = f64>,
    ) -> Result<()> {
        self.geom_offsets
            .try_push_usize(multi_polygon.num_polygons())?;
        self.validity.append_non_null();
        for polygon in multi_polygon.polygons() {
            self.push_polygon_rings(&polygon)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> MultiPolygonArray {
        let coords = SeparatedCoordBuffer {
            x: ScalarBuffer::from(self.x),
            y: ScalarBuffer::from(self.y),
            nulls: self.coord_validity.finish(),
        };
        MultiPolygonArray {
            coords: CoordBuffer::Separated(coords),
            geom_offsets: self.geom_offsets.finish(),
            polygon_offsets: self.polygon_offsets.finish(),
            ring_offsets: self.ring_offsets.finish(),
            validity: self.validity.finish(),
            polygon_validity: self.polygon_validity.finish(),
            ring_validity: self.ring_validity.finish(),
        }
    }
}

impl From<Vec<GeometryCell>> for MultiPolygonArray {
    fn from(cells: Vec<GeometryCell>) -> Self {
        cells.as_slice().into()
    }
}

impl From<&[GeometryCell]> for MultiPolygonArray {
    /// # Panics
    ///
    /// Panics if the total number of vertices, rings or polygons overflows 32-bit offsets.
    fn from(cells: &[GeometryCell]) -> Self {
        let mut builder = MultiPolygonBuilder::with_capacity(cells.len());
        for cell in cells {
            builder
                .push_cell(cell)
                .expect("geometry offsets overflowed i32");
        }
        builder.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trait_::GeometryArrayTrait;

    #[test]
    fn null_and_empty_rows() {
        let mut builder = MultiPolygonBuilder::new();
        builder.push_null();
        builder.push_cell(&Some(vec![])).unwrap();
        let arr = builder.finish();

        assert_eq!(arr.len(), 2);
        assert!(arr.is_null(0));
        assert!(!arr.is_null(1));
        assert_eq!(arr.value(1).num_polygons(), 0);
    }

    #[test]
    fn validity_is_omitted_without_nulls() {
        let arr: MultiPolygonArray =
            vec![Some(vec![Some(vec![Some(vec![Some(Vertex::new(1.0, 2.0))])])])].into();
        assert!(arr.validity.is_none());
        assert!(arr.polygon_validity.is_none());
        assert!(arr.ring_validity.is_none());
        assert!(arr.coords.vertex(0).is_some());
    }
}
