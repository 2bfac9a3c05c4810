//! Per-row axis-aligned bounding boxes of multipolygon columns.
//!
//! Absent geometries, polygons, rings and vertices contribute nothing. A vertex with a NaN or
//! infinite coordinate is skipped the same way. A row without any usable vertex has no bounding
//! box: [`BoundingRects::bounding_rects`] yields `None` for it and [`BBoxColumns`] stores NaN in
//! all four columns.

use std::ops::{Add, AddAssign};
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, Float64Array};
use arrow_buffer::{NullBuffer, ScalarBuffer};
use arrow_schema::{DataType, Field};
use tracing::debug;

use crate::array::MultiPolygonArray;
use crate::error::Result;
use crate::geometry::{self, GeometryCell, Vertex};
use crate::scalar::{MultiPolygon, Polygon, Ring};
use crate::trait_::GeometryArrayTrait;

/// Names of the appended bounding box columns, in column order.
pub const BBOX_COLUMN_NAMES: [&str; 4] = ["bbox_minx", "bbox_miny", "bbox_maxx", "bbox_maxy"];

const PROGRESS_INTERVAL: usize = 20_000;

/// A bounding box with at least one vertex inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl From<BBox> for [f64; 4] {
    fn from(value: BBox) -> Self {
        [value.minx, value.miny, value.maxx, value.maxy]
    }
}

/// Running min / max accumulator over vertices.
///
/// The infinite seeds never escape: [`BoundingRect::bbox`] returns `None` until a vertex has been
/// added.
#[derive(Debug, Clone, Copy)]
pub struct BoundingRect {
    minx: f64,
    miny: f64,
    maxx: f64,
    maxy: f64,
    count: usize,
}

impl BoundingRect {
    /// New
    pub fn new() -> Self {
        BoundingRect {
            minx: f64::INFINITY,
            miny: f64::INFINITY,
            maxx: -f64::INFINITY,
            maxy: -f64::INFINITY,
            count: 0,
        }
    }

    /// Number of vertices that contributed to this rect.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn add_vertex(&mut self, vertex: Vertex) {
        if !vertex.is_finite() {
            return;
        }

        if vertex.x < self.minx {
            self.minx = vertex.x;
        }
        if vertex.y < self.miny {
            self.miny = vertex.y;
        }
        if vertex.x > self.maxx {
            self.maxx = vertex.x;
        }
        if vertex.y > self.maxy {
            self.maxy = vertex.y;
        }
        self.count += 1;
    }

    pub fn add_ring(&mut self, ring: &Ring<'_>) {
        for vertex in ring.vertices().flatten() {
            self.add_vertex(vertex);
        }
    }

    pub fn add_polygon(&mut self, polygon: &Polygon<'_>) {
        for ring in polygon.rings().flatten() {
            self.add_ring(&ring);
        }
    }

    pub fn add_multi_polygon(&mut self, multi_polygon: &MultiPolygon<'_>) {
        for polygon in multi_polygon.polygons().flatten() {
            self.add_polygon(&polygon);
        }
    }

    /// Add every vertex of an owned geometry cell.
    pub fn add_geometry_cell(&mut self, cell: &GeometryCell) {
        let vertices = cell
            .iter()
            .flatten()
            .flatten()
            .flat_map(|polygon: &geometry::Polygon| polygon.iter().flatten())
            .flat_map(|ring: &geometry::Ring| ring.iter().flatten());
        for vertex in vertices {
            self.add_vertex(*vertex);
        }
    }

    /// The accumulated box, or `None` if no vertex has been added.
    pub fn bbox(&self) -> Option<BBox> {
        if self.is_empty() {
            return None;
        }
        Some(BBox {
            minx: self.minx,
            miny: self.miny,
            maxx: self.maxx,
            maxy: self.maxy,
        })
    }
}

impl Default for BoundingRect {
    fn default() -> Self {
        Self::new()
    }
}

impl Add for BoundingRect {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        BoundingRect {
            minx: self.minx.min(rhs.minx),
            miny: self.miny.min(rhs.miny),
            maxx: self.maxx.max(rhs.maxx),
            maxy: self.maxy.max(rhs.maxy),
            count: self.count + rhs.count,
        }
    }
}

impl AddAssign for BoundingRect {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

pub fn bounding_rect_multipolygon(geom: &MultiPolygon<'_>) -> Option<BBox> {
    let mut rect = BoundingRect::new();
    rect.add_multi_polygon(geom);
    rect.bbox()
}

/// The four bounding box columns of a geometry column, lowered to Arrow.
///
/// Rows without a bounding box hold NaN in every column. When built with validity those rows are
/// also marked null.
#[derive(Debug, Clone, PartialEq)]
pub struct BBoxColumns {
    pub minx: Float64Array,
    pub miny: Float64Array,
    pub maxx: Float64Array,
    pub maxy: Float64Array,
}

impl BBoxColumns {
    pub fn from_bboxes(bboxes: &[Option<BBox>], with_validity: bool) -> Self {
        let mut columns: [Vec<f64>; 4] = std::array::from_fn(|_| Vec::with_capacity(bboxes.len()));
        for bbox in bboxes {
            let values: [f64; 4] = bbox.map(Into::into).unwrap_or([f64::NAN; 4]);
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        let nulls = with_validity
            .then(|| NullBuffer::from_iter(bboxes.iter().map(Option::is_some)))
            .filter(|nulls| nulls.null_count() > 0);

        let [minx, miny, maxx, maxy] =
            columns.map(|values| Float64Array::new(ScalarBuffer::from(values), nulls.clone()));
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub fn len(&self) -> usize {
        self.minx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields for the four columns, named by [`BBOX_COLUMN_NAMES`].
    pub fn fields(nullable: bool) -> [Field; 4] {
        BBOX_COLUMN_NAMES.map(|name| Field::new(name, DataType::Float64, nullable))
    }

    /// The columns in `minx, miny, maxx, maxy` order.
    pub fn into_columns(self) -> [ArrayRef; 4] {
        [
            Arc::new(self.minx),
            Arc::new(self.miny),
            Arc::new(self.maxx),
            Arc::new(self.maxy),
        ]
    }
}

/// Compute one bounding box per geometry.
pub trait BoundingRects {
    /// One entry per row, `None` where the row has no usable vertex.
    fn bounding_rects(&self) -> Vec<Option<BBox>>;

    /// The bounding boxes lowered to four `Float64` columns.
    fn bbox_columns(&self, with_validity: bool) -> BBoxColumns {
        BBoxColumns::from_bboxes(&self.bounding_rects(), with_validity)
    }
}

impl BoundingRects for MultiPolygonArray {
    fn bounding_rects(&self) -> Vec<Option<BBox>> {
        let num_rows = self.len();
        debug!(num_rows, "computing bounding boxes");
        self.iter()
            .enumerate()
            .map(|(row, geom)| {
                if row % PROGRESS_INTERVAL == 0 {
                    debug!("row {row}/{num_rows}");
                }
                geom.and_then(|g| bounding_rect_multipolygon(&g))
            })
            .collect()
    }
}

impl BoundingRects for [GeometryCell] {
    fn bounding_rects(&self) -> Vec<Option<BBox>> {
        self.iter()
            .map(|cell| {
                let mut rect = BoundingRect::new();
                rect.add_geometry_cell(cell);
                rect.bbox()
            })
            .collect()
    }
}

#[cfg(feature = "rayon")]
impl MultiPolygonArray {
    /// [`BoundingRects::bounding_rects`], spread over the rayon thread pool.
    ///
    /// Rows are independent, so the result is identical to the sequential one.
    pub fn par_bounding_rects(&self) -> Vec<Option<BBox>> {
        use rayon::prelude::*;

        (0..self.len())
            .into_par_iter()
            .map(|row| self.get(row).and_then(|g| bounding_rect_multipolygon(&g)))
            .collect()
    }

    pub fn par_bbox_columns(&self, with_validity: bool) -> BBoxColumns {
        BBoxColumns::from_bboxes(&self.par_bounding_rects(), with_validity)
    }
}

/// Decode `array` as a multipolygon column and compute its bounding box columns.
pub fn bbox_columns(array: &dyn Array, with_validity: bool) -> Result<BBoxColumns> {
    let multi_polygons = MultiPolygonArray::try_from(array)?;
    Ok(multi_polygons.bbox_columns(with_validity))
}
