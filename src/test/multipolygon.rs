use crate::array::MultiPolygonArray;
use crate::geometry::{multi_polygon, polygon, ring, MultiPolygon};

/// A square with a square hole.
pub(crate) fn mp0() -> MultiPolygon {
    multi_polygon([polygon([
        ring([(-111., 45.), (-111., 41.), (-104., 41.), (-104., 45.), (-111., 45.)]),
        ring([
            (-110., 44.),
            (-110., 42.),
            (-105., 42.),
            (-105., 44.),
            (-110., 44.),
        ]),
    ])])
}

/// Two disjoint triangles.
pub(crate) fn mp1() -> MultiPolygon {
    multi_polygon([
        polygon([ring([(0., 0.), (2., 0.), (1., 1.5), (0., 0.)])]),
        polygon([ring([(10., -3.), (12., -3.), (11., 8.25), (10., -3.)])]),
    ])
}

pub(crate) fn mp_array() -> MultiPolygonArray {
    vec![Some(mp0()), Some(mp1())].into()
}
