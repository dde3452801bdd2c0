//! Engine-only spatial operations
//!
//! ST_ConvexHull, ST_Buffer, ST_Union, ST_Intersection, ST_Difference, ST_SymDifference
//!
//! None of these has a native implementation. Each one asks the [`Kernel`]
//! for the engine first and fails with `UnsupportedGeometry` when it is
//! disabled. Results carry the SRID of the input.

use geo::algorithm::bool_ops::BooleanOps;
use geo::algorithm::Buffer;
use geo::ConvexHull;
use log::debug;

use crate::engine::{from_engine, to_engine, Kernel};
use crate::error::{GeometryError, Result};
use crate::geometry::{Coord, Geometry, GeometryType, LineString, Point, Shape};

fn ensure_matching_srid(a: &Geometry, b: &Geometry) -> Result<Option<u32>> {
    match (a.srid(), b.srid()) {
        (Some(sa), Some(sb)) if sa != sb => Err(GeometryError::unsupported(format!(
            "operation on mixed SRID geometries ({sa} != {sb})"
        ))),
        (sa, sb) => Ok(sa.or(sb)),
    }
}

/// Polygon or MultiPolygon as an engine MultiPolygon.
fn engine_multi_polygon(geom: &Geometry) -> Result<geo::MultiPolygon<f64>> {
    if !matches!(geom, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
        return Err(GeometryError::WrongType("Polygon or MultiPolygon"));
    }
    if geom.is_empty() {
        return Ok(geo::MultiPolygon::new(vec![]));
    }
    match to_engine(geom)? {
        geo::Geometry::Polygon(p) => Ok(geo::MultiPolygon::new(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        _ => Err(GeometryError::WrongType("Polygon or MultiPolygon")),
    }
}

fn binary_polygon_op<F>(kernel: &Kernel, name: &str, a: &Geometry, b: &Geometry, op: F) -> Result<Geometry>
where
    F: FnOnce(&geo::MultiPolygon<f64>, &geo::MultiPolygon<f64>) -> geo::MultiPolygon<f64>,
{
    kernel.require_engine(name)?;
    let srid = ensure_matching_srid(a, b)?;
    let ma = engine_multi_polygon(a)?;
    let mb = engine_multi_polygon(b)?;
    debug!("{name}: delegated to engine");
    let result = from_engine(geo::Geometry::MultiPolygon(op(&ma, &mb)))?;
    Ok(result.with_srid(srid))
}

/// ST_ConvexHull: smallest convex geometry enclosing every vertex.
///
/// Degenerate hulls collapse to a Point (one distinct vertex) or a
/// LineString (collinear vertices).
///
/// # Example
///
/// ```
/// use geowire_core::engine::Kernel;
/// use geowire_core::functions::io::read_wkt;
/// use geowire_core::functions::operations::convex_hull;
/// use geowire_core::geometry::{GeometryType, Shape};
///
/// let pts = read_wkt("MULTIPOINT((0 0),(2 0),(1 1),(2 2),(0 2))").unwrap();
/// let hull = convex_hull(&Kernel::default(), &pts).unwrap();
/// assert_eq!(hull.geometry_type(), GeometryType::Polygon);
/// ```
pub fn convex_hull(kernel: &Kernel, geom: &Geometry) -> Result<Geometry> {
    kernel.require_engine("convex hull")?;
    if geom.is_empty() {
        return Ok(Geometry::empty(GeometryType::Polygon).with_srid(geom.srid()));
    }
    debug!("convex hull: delegated to engine");
    let hull = to_engine(geom)?.convex_hull();

    let mut distinct: Vec<Coord> = Vec::new();
    for c in hull.exterior().coords() {
        let c = Coord::xy(c.x, c.y);
        if distinct.last().map_or(true, |last| !last.same_xy(&c)) {
            distinct.push(c);
        }
    }
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }

    let result = match distinct.len() {
        0 => Geometry::empty(GeometryType::Polygon),
        1 => Point::from_coord(distinct[0]).into(),
        2 => LineString::new(distinct.into_iter().map(Point::from_coord).collect())?.into(),
        _ => from_engine(geo::Geometry::Polygon(hull))?,
    };
    Ok(result.with_srid(geom.srid()))
}

/// ST_Buffer: expand (or, for negative distances, shrink) a geometry.
///
/// A single resulting polygon is returned as a Polygon, several as a
/// MultiPolygon. An empty input gives an empty Polygon.
///
/// # Example
///
/// ```
/// use geowire_core::engine::Kernel;
/// use geowire_core::functions::measurement::area;
/// use geowire_core::functions::operations::buffer;
/// use geowire_core::geometry::Point;
///
/// let buffered = buffer(&Kernel::default(), &Point::new(0.0, 0.0).into(), 1.0).unwrap();
/// // Area of a circle with radius 1 ≈ π
/// assert!((area(&buffered) - std::f64::consts::PI).abs() < 0.1);
/// ```
pub fn buffer(kernel: &Kernel, geom: &Geometry, distance: f64) -> Result<Geometry> {
    kernel.require_engine("buffer")?;
    if geom.is_empty() {
        return Ok(Geometry::empty(GeometryType::Polygon).with_srid(geom.srid()));
    }
    debug!("buffer: delegated to engine");
    let mut polygons = to_engine(geom)?.buffer(distance).0;
    let result = match polygons.pop() {
        None => Geometry::empty(GeometryType::Polygon),
        Some(only) if polygons.is_empty() => from_engine(geo::Geometry::Polygon(only))?,
        Some(last) => {
            polygons.push(last);
            from_engine(geo::Geometry::MultiPolygon(geo::MultiPolygon::new(polygons)))?
        }
    };
    Ok(result.with_srid(geom.srid()))
}

/// ST_Union of two polygonal geometries, as a MultiPolygon.
///
/// # Example
///
/// ```
/// use geowire_core::engine::Kernel;
/// use geowire_core::functions::io::read_wkt;
/// use geowire_core::functions::measurement::area;
/// use geowire_core::functions::operations::union;
///
/// let a = read_wkt("POLYGON((0 0,2 0,2 2,0 2,0 0))").unwrap();
/// let b = read_wkt("POLYGON((1 0,3 0,3 2,1 2,1 0))").unwrap();
/// let u = union(&Kernel::default(), &a, &b).unwrap();
/// assert!((area(&u) - 6.0).abs() < 1e-10);
/// ```
pub fn union(kernel: &Kernel, a: &Geometry, b: &Geometry) -> Result<Geometry> {
    binary_polygon_op(kernel, "union", a, b, |ma, mb| ma.union(mb))
}

/// ST_Intersection of two polygonal geometries.
pub fn intersection(kernel: &Kernel, a: &Geometry, b: &Geometry) -> Result<Geometry> {
    binary_polygon_op(kernel, "intersection", a, b, |ma, mb| ma.intersection(mb))
}

/// ST_Difference: the part of `a` not covered by `b`.
pub fn difference(kernel: &Kernel, a: &Geometry, b: &Geometry) -> Result<Geometry> {
    binary_polygon_op(kernel, "difference", a, b, |ma, mb| ma.difference(mb))
}

/// ST_SymDifference: the parts covered by exactly one input.
pub fn sym_difference(kernel: &Kernel, a: &Geometry, b: &Geometry) -> Result<Geometry> {
    binary_polygon_op(kernel, "symmetric difference", a, b, |ma, mb| ma.xor(mb))
}
