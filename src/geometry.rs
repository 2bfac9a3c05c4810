//! Owned geometry cells.
//!
//! Every nesting level is optional: a missing multipolygon, polygon, ring or vertex contributes
//! nothing to any computation over the cell. These types are what [`MultiPolygonBuilder`] accepts
//! and what the borrowed [scalars](crate::scalar) can be converted back into.
//!
//! [`MultiPolygonBuilder`]: crate::array::MultiPolygonBuilder

/// A single 2D vertex. Any z or m values present upstream are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite (neither NaN nor infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Vertex {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

/// An ordered sequence of vertices.
pub type Ring = Vec<Option<Vertex>>;

/// An ordered sequence of rings. The first ring is conventionally the exterior.
pub type Polygon = Vec<Option<Ring>>;

/// An ordered sequence of polygons.
pub type MultiPolygon = Vec<Option<Polygon>>;

/// One row of a geometry column. `None` is an absent geometry.
pub type GeometryCell = Option<MultiPolygon>;

/// Build a ring where every vertex is present.
pub fn ring<V: Into<Vertex>>(vertices: impl IntoIterator<Item = V>) -> Ring {
    vertices.into_iter().map(|v| Some(v.into())).collect()
}

/// Build a polygon where every ring is present.
pub fn polygon(rings: impl IntoIterator<Item = Ring>) -> Polygon {
    rings.into_iter().map(Some).collect()
}

/// Build a multipolygon where every polygon is present.
pub fn multi_polygon(polygons: impl IntoIterator<Item = Polygon>) -> MultiPolygon {
    polygons.into_iter().map(Some).collect()
}
