//! Geometry accessor functions.
//!
//! ST_GeometryType, GeometryType, ST_SRID, ST_IsEmpty,
//! ST_X, ST_Y, ST_Z, ST_M, ST_NDims, ST_CoordDim, ST_Zmflag, ST_Dimension,
//! ST_NumPoints, ST_NumGeometries, ST_GeometryN, ST_NumInteriorRings,
//! ST_NumRings, ST_ExteriorRing, ST_InteriorRingN, ST_PointN,
//! ST_StartPoint, ST_EndPoint, ST_Envelope, ST_Dump (explode).
//!
//! Functions that only make sense for one variant fail with
//! [`GeometryError::WrongType`] on the others.

use crate::error::{GeometryError, Result};
use crate::geometry::{Coord, Geometry, LineString, Point, Polygon, Shape};
use crate::wkb::geom_type_name;

/// GeometryType: plain type name, e.g. `"LineString"`.
pub fn geometry_type(geometry: &Geometry) -> &'static str {
    geometry.geometry_type().name()
}

/// ST_GeometryType: PostGIS-style name.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::st_geometry_type;
/// use geowire_core::geometry::{Geometry, Point};
///
/// assert_eq!(st_geometry_type(&Point::new(1.0, 2.0).into()), "ST_Point");
/// ```
pub fn st_geometry_type(geometry: &Geometry) -> &'static str {
    geom_type_name(geometry.geometry_type().code())
}

/// ST_SRID, with 0 standing for "unknown".
pub fn srid(geometry: &Geometry) -> u32 {
    geometry.srid().unwrap_or(0)
}

pub fn is_empty(geometry: &Geometry) -> bool {
    geometry.is_empty()
}

// ── Dimensions ────────────────────────────────────────────────────────────────

/// ST_Dimension: 0 for points, 1 for lines, 2 for polygons; a collection
/// takes the largest dimension among its members (0 when empty).
pub fn dimension(geometry: &Geometry) -> u8 {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => 0,
        Geometry::LineString(_) | Geometry::MultiLineString(_) => 1,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => 2,
        Geometry::GeometryCollection(gc) => gc.iter().map(dimension).max().unwrap_or(0),
    }
}

/// ST_Zmflag: 0 = 2D, 1 = M only, 2 = Z only, 3 = ZM.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::zm_flag;
/// use geowire_core::geometry::Point;
///
/// assert_eq!(zm_flag(&Point::new(1.0, 2.0).into()), 0);
/// assert_eq!(zm_flag(&Point::new_m(1.0, 2.0, 3.0).into()), 1);
/// assert_eq!(zm_flag(&Point::new_zm(1.0, 2.0, 3.0, 4.0).into()), 3);
/// ```
pub fn zm_flag(geometry: &Geometry) -> u8 {
    match (geometry.has_z(), geometry.is_measured()) {
        (false, false) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (true, true) => 3,
    }
}

/// ST_NDims / ST_CoordDim: number of ordinates per coordinate (2, 3 or 4).
pub fn coord_dimension(geometry: &Geometry) -> u8 {
    2 + u8::from(geometry.has_z()) + u8::from(geometry.is_measured())
}

// ── Point ordinates ───────────────────────────────────────────────────────────

fn require_point(geometry: &Geometry) -> Result<&Point> {
    geometry.as_point().ok_or(GeometryError::WrongType("Point"))
}

/// ST_X. `Ok(None)` for the empty point.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::{x, y, z};
/// use geowire_core::geometry::{Geometry, LineString, Point};
///
/// let p: Geometry = Point::new_z(1.0, 2.0, 3.0).into();
/// assert_eq!((x(&p).unwrap(), y(&p).unwrap(), z(&p).unwrap()), (Some(1.0), Some(2.0), Some(3.0)));
///
/// let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)]).unwrap().into();
/// assert!(x(&line).is_err());
/// ```
pub fn x(geometry: &Geometry) -> Result<Option<f64>> {
    Ok(require_point(geometry)?.x())
}

pub fn y(geometry: &Geometry) -> Result<Option<f64>> {
    Ok(require_point(geometry)?.y())
}

pub fn z(geometry: &Geometry) -> Result<Option<f64>> {
    Ok(require_point(geometry)?.z())
}

pub fn m(geometry: &Geometry) -> Result<Option<f64>> {
    Ok(require_point(geometry)?.m())
}

// ── Counts and members ────────────────────────────────────────────────────────

/// ST_NumPoints / ST_NPoints: every point, rings and members included.
pub fn num_points(geometry: &Geometry) -> usize {
    geometry.num_points()
}

/// ST_NumGeometries: member count of a multi-geometry or collection; 1 for a
/// non-empty single geometry, 0 for an empty one.
pub fn num_geometries(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::MultiPoint(g) => g.len(),
        Geometry::MultiLineString(g) => g.len(),
        Geometry::MultiPolygon(g) => g.len(),
        Geometry::GeometryCollection(g) => g.len(),
        single => usize::from(!single.is_empty()),
    }
}

/// ST_GeometryN (1-based). A single geometry is its own first member.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::geometry_n;
/// use geowire_core::geometry::{Geometry, MultiPoint, Point};
///
/// let mp: Geometry = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]).unwrap().into();
/// assert_eq!(geometry_n(&mp, 2), Some(Point::new(5.0, 5.0).into()));
/// assert_eq!(geometry_n(&mp, 0), None);
/// assert_eq!(geometry_n(&mp, 3), None);
/// ```
pub fn geometry_n(geometry: &Geometry, n: usize) -> Option<Geometry> {
    match geometry {
        Geometry::MultiPoint(g) => g.geometry_n(n).cloned().map(Geometry::from),
        Geometry::MultiLineString(g) => g.geometry_n(n).cloned().map(Geometry::from),
        Geometry::MultiPolygon(g) => g.geometry_n(n).cloned().map(Geometry::from),
        Geometry::GeometryCollection(g) => g.geometry_n(n).cloned(),
        single => (n == 1 && !single.is_empty()).then(|| single.clone()),
    }
}

// ── LineString accessors ──────────────────────────────────────────────────────

fn require_line(geometry: &Geometry) -> Result<&LineString> {
    geometry
        .as_line_string()
        .ok_or(GeometryError::WrongType("LineString"))
}

/// ST_PointN (1-based).
pub fn point_n(geometry: &Geometry, n: usize) -> Result<Option<Point>> {
    Ok(require_line(geometry)?.point_n(n).cloned())
}

pub fn start_point(geometry: &Geometry) -> Result<Option<Point>> {
    Ok(require_line(geometry)?.start_point().cloned())
}

pub fn end_point(geometry: &Geometry) -> Result<Option<Point>> {
    Ok(require_line(geometry)?.end_point().cloned())
}

// ── Polygon accessors ─────────────────────────────────────────────────────────

fn require_polygon(geometry: &Geometry) -> Result<&Polygon> {
    geometry
        .as_polygon()
        .ok_or(GeometryError::WrongType("Polygon"))
}

/// ST_ExteriorRing. `Ok(None)` for the empty polygon.
pub fn exterior_ring(geometry: &Geometry) -> Result<Option<LineString>> {
    Ok(require_polygon(geometry)?.exterior().cloned())
}

/// ST_InteriorRingN (1-based).
pub fn interior_ring_n(geometry: &Geometry, n: usize) -> Result<Option<LineString>> {
    Ok(require_polygon(geometry)?.interior_ring_n(n).cloned())
}

pub fn num_interior_rings(geometry: &Geometry) -> Result<usize> {
    Ok(require_polygon(geometry)?.num_interior_rings())
}

/// ST_NumRings: exterior plus holes.
pub fn num_rings(geometry: &Geometry) -> Result<usize> {
    Ok(require_polygon(geometry)?.len())
}

// ── Derived geometries ────────────────────────────────────────────────────────

/// ST_Envelope: the bounding box as a closed rectangle.
///
/// A box without width or height collapses to a two-point LineString, a
/// box without either to a Point. The SRID is carried over; `None` for
/// empty input.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::envelope;
/// use geowire_core::functions::measurement::area;
/// use geowire_core::geometry::{Geometry, GeometryType, LineString, Point, Shape};
///
/// let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 3.0)]).unwrap().into();
/// let env = envelope(&line).unwrap();
/// assert_eq!(env.geometry_type(), GeometryType::Polygon);
/// assert_eq!(area(&env), 6.0);
///
/// let p: Geometry = Point::new(1.0, 1.0).into();
/// assert_eq!(envelope(&p).unwrap().geometry_type(), GeometryType::Point);
/// ```
pub fn envelope(geometry: &Geometry) -> Option<Geometry> {
    let b = geometry.bbox()?;
    let mut out: Geometry = if b.width() == 0.0 && b.height() == 0.0 {
        Point::new(b.minx, b.miny).into()
    } else if b.width() == 0.0 || b.height() == 0.0 {
        LineString::from_xy(&[(b.minx, b.miny), (b.maxx, b.maxy)])
            .ok()?
            .into()
    } else {
        let ring = LineString::from_xy(&[
            (b.minx, b.miny),
            (b.maxx, b.miny),
            (b.maxx, b.maxy),
            (b.minx, b.maxy),
            (b.minx, b.miny),
        ])
        .ok()?;
        Polygon::from_exterior(ring).ok()?.into()
    };
    out.set_srid(geometry.srid());
    Some(out)
}

/// Every segment of the geometry's lines and rings as a two-point
/// LineString, in storage order.
///
/// # Example
///
/// ```
/// use geowire_core::functions::accessors::explode;
/// use geowire_core::geometry::{Geometry, LineString};
///
/// let g: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap().into();
/// assert_eq!(explode(&g).len(), 2);
/// ```
pub fn explode(geometry: &Geometry) -> Vec<LineString> {
    let mut out = Vec::new();
    collect_segments(geometry, &mut out);
    out
}

fn two_point_line(a: &Coord, b: &Coord) -> Option<LineString> {
    LineString::new(vec![Point::from(*a), Point::from(*b)]).ok()
}

fn collect_segments(geometry: &Geometry, out: &mut Vec<LineString>) {
    if let Geometry::GeometryCollection(gc) = geometry {
        gc.iter().for_each(|member| collect_segments(member, out));
        return;
    }
    let mut push_line = |line: &LineString| {
        out.extend(line.segments().filter_map(|(a, b)| two_point_line(a, b)));
    };
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::LineString(ls) => push_line(ls),
        Geometry::Polygon(p) => p.iter().for_each(push_line),
        Geometry::MultiLineString(mls) => mls.iter().for_each(push_line),
        Geometry::MultiPolygon(mp) => mp.iter().flat_map(|p| p.iter()).for_each(push_line),
        Geometry::GeometryCollection(_) => {}
    }
}
