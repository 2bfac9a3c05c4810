use std::collections::BTreeSet;

use arrow_array::cast::AsArray;
use arrow_array::Array;
use arrow_schema::DataType;
use geo_traits::{Dimensions, GeometryTrait, GeometryType};
use wkb::reader::read_wkb;

use crate::array::{MultiPolygonArray, MultiPolygonBuilder};
use crate::error::{CatchmentError, Result};

type WkbValues<'a> = Box<dyn Iterator<Item = Option<&'a [u8]>> + 'a>;

fn wkb_values(array: &dyn Array) -> Result<WkbValues<'_>> {
    match array.data_type() {
        DataType::Binary => Ok(Box::new(array.as_binary::<i32>().iter())),
        DataType::LargeBinary => Ok(Box::new(array.as_binary::<i64>().iter())),
        DataType::BinaryView => Ok(Box::new(array.as_binary_view().iter())),
        dt => Err(CatchmentError::IncorrectType(
            format!("expected a binary WKB column, got {dt:?}").into(),
        )),
    }
}

/// The GeoParquet name of a geometry's type, with its dimension suffix.
fn geometry_type_name(geom: &impl GeometryTrait<T = f64>) -> String {
    let name = match geom.as_type() {
        GeometryType::Point(_) => "Point",
        GeometryType::LineString(_) => "LineString",
        GeometryType::Polygon(_) => "Polygon",
        GeometryType::MultiPoint(_) => "MultiPoint",
        GeometryType::MultiLineString(_) => "MultiLineString",
        GeometryType::MultiPolygon(_) => "MultiPolygon",
        GeometryType::GeometryCollection(_) => "GeometryCollection",
        GeometryType::Rect(_) => "Rect",
        GeometryType::Triangle(_) => "Triangle",
        GeometryType::Line(_) => "Line",
    };
    let suffix = match geom.dim() {
        Dimensions::Xyz => " Z",
        Dimensions::Xym => " M",
        Dimensions::Xyzm => " ZM",
        Dimensions::Xy | Dimensions::Unknown(_) => "",
    };
    format!("{name}{suffix}")
}

/// Decode a WKB column (`Binary`, `LargeBinary` or `BinaryView`).
///
/// Polygons become single-polygon multipolygons and null values stay null. z and m values are
/// dropped.
///
/// # Errors
///
/// - [`CatchmentError::UnsupportedGeometryShape`] if any value is neither a Polygon nor a
///   MultiPolygon.
/// - [`CatchmentError::WkbError`] if any value is not valid WKB.
pub fn from_wkb(array: &dyn Array) -> Result<MultiPolygonArray> {
    let mut builder = MultiPolygonBuilder::with_capacity(array.len());
    for value in wkb_values(array)? {
        let Some(buf) = value else {
            builder.push_null();
            continue;
        };
        let geom = read_wkb(buf)?;
        match geom.as_type() {
            GeometryType::Polygon(polygon) => builder.push_polygon(polygon)?,
            GeometryType::MultiPolygon(multi_polygon) => builder.push_multi_polygon(multi_polygon)?,
            _ => {
                return Err(CatchmentError::UnsupportedGeometryShape(
                    format!(
                        "expected Polygon or MultiPolygon WKB, got {}",
                        geometry_type_name(&geom)
                    )
                    .into(),
                ))
            }
        }
    }
    Ok(builder.finish())
}

/// The distinct geometry types present in a WKB column, named as in GeoParquet metadata.
pub fn wkb_geometry_types(array: &dyn Array) -> Result<BTreeSet<String>> {
    let mut types = BTreeSet::new();
    for buf in wkb_values(array)?.flatten() {
        types.insert(geometry_type_name(&read_wkb(buf)?));
    }
    Ok(types)
}

#[cfg(test)]
mod test {
    use arrow_array::{BinaryArray, LargeBinaryArray, StringArray};

    use super::*;
    use crate::algorithm::native::{BBox, BoundingRects};
    use crate::geometry::{multi_polygon, polygon, ring};
    use crate::test::wkb;
    use crate::trait_::GeometryArrayTrait;

    const EXTERIOR: &[(f64, f64)] = &[(0., 0.), (4., 0.), (4., 3.), (0., 0.)];
    const HOLE: &[(f64, f64)] = &[(1., 1.), (2., 1.), (2., 2.), (1., 1.)];
    const FAR: &[(f64, f64)] = &[(10., 10.), (11., 10.), (11., 12.), (10., 10.)];

    #[test]
    fn polygons_are_promoted() {
        let values = [
            Some(wkb::polygon(&[EXTERIOR, HOLE])),
            None,
            Some(wkb::multi_polygon(&[&[EXTERIOR], &[FAR]])),
        ];
        let array = BinaryArray::from_iter(values.iter().map(|v| v.as_deref()));
        let arr = from_wkb(&array).unwrap();

        assert_eq!(arr.len(), 3);
        assert_eq!(
            arr.value(0).to_owned(),
            multi_polygon([polygon([ring(EXTERIOR.iter().copied()), ring(HOLE.iter().copied())])])
        );
        assert!(arr.is_null(1));
        assert_eq!(arr.value(2).num_polygons(), 2);

        assert_eq!(
            arr.bounding_rects()[2],
            Some(BBox {
                minx: 0.,
                miny: 0.,
                maxx: 11.,
                maxy: 12.
            })
        );
    }

    #[test]
    fn large_binary() {
        let buf = wkb::polygon(&[FAR]);
        let array = LargeBinaryArray::from_iter_values([buf.as_slice()]);
        let arr = from_wkb(&array).unwrap();
        assert_eq!(arr.value(0).polygon(0).unwrap().num_rings(), 1);
    }

    #[test]
    fn points_are_unsupported() {
        let buf = wkb::point(1., 2.);
        let array = BinaryArray::from_iter_values([buf.as_slice()]);
        let err = from_wkb(&array).unwrap_err();
        assert!(
            matches!(err, CatchmentError::UnsupportedGeometryShape(msg) if msg.contains("Point"))
        );
    }

    #[test]
    fn strings_are_not_wkb() {
        let array = StringArray::from(vec!["POLYGON EMPTY"]);
        let err = from_wkb(&array).unwrap_err();
        assert!(matches!(err, CatchmentError::IncorrectType(_)));
    }

    #[test]
    fn geometry_types() {
        let values = [
            wkb::polygon(&[EXTERIOR]),
            wkb::multi_polygon(&[&[FAR]]),
            wkb::polygon(&[HOLE]),
        ];
        let array = BinaryArray::from_iter_values(values.iter());
        let types = wkb_geometry_types(&array).unwrap();
        assert_eq!(
            types.into_iter().collect::<Vec<_>>(),
            ["MultiPolygon", "Polygon"]
        );
    }
}
