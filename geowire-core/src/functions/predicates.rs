//! Native spatial predicates.
//!
//! Point-in-polygon with explicit boundary/vertex policies, open-interval
//! segment intersection, ST_IsSimple, ST_IsClosed and ST_IsRing.

use crate::error::{GeometryError, Result};
use crate::geometry::{Coord, Geometry, LineString, Point, Polygon, Shape};

/// Where a point lies relative to one ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPosition {
    Outside,
    Inside,
    /// On an edge, away from any vertex.
    Boundary,
    /// Exactly on one of the ring's points.
    Vertex,
}

/// Crossing point of two segments, reported only when both segment
/// parameters lie strictly inside `(0, 1)`.
///
/// Segments that merely share an endpoint, touch at an endpoint, or are
/// parallel/collinear do not intersect under this rule.
///
/// # Example
///
/// ```
/// use geowire_core::functions::predicates::segment_intersection;
/// use geowire_core::geometry::Coord;
///
/// let (a, b) = (Coord::xy(0.0, 0.0), Coord::xy(2.0, 2.0));
/// let hit = segment_intersection(&a, &b, &Coord::xy(0.0, 2.0), &Coord::xy(2.0, 0.0));
/// assert_eq!(hit, Some(Coord::xy(1.0, 1.0)));
///
/// // sharing an endpoint is not an intersection
/// assert!(segment_intersection(&a, &b, &b, &Coord::xy(4.0, 0.0)).is_none());
/// ```
pub fn segment_intersection(p0: &Coord, p1: &Coord, p2: &Coord, p3: &Coord) -> Option<Coord> {
    let (s1x, s1y) = (p1.x - p0.x, p1.y - p0.y);
    let (s2x, s2y) = (p3.x - p2.x, p3.y - p2.y);
    let denom = -s2x * s1y + s1x * s2y;
    if denom == 0.0 {
        return None;
    }
    let s = (-s1y * (p0.x - p2.x) + s1x * (p0.y - p2.y)) / denom;
    let t = (s2x * (p0.y - p2.y) - s2y * (p0.x - p2.x)) / denom;
    let open = |v: f64| v > 0.0 && v < 1.0;
    (open(s) && open(t)).then(|| Coord::xy(p0.x + t * s1x, p0.y + t * s1y))
}

pub fn segments_intersect(p0: &Coord, p1: &Coord, p2: &Coord, p3: &Coord) -> bool {
    segment_intersection(p0, p1, p2, p3).is_some()
}

/// Ray casting along `y = point.y` towards +X.
///
/// A point on a horizontal edge, or exactly where the ray meets an edge, is
/// on the boundary.
pub fn ring_position(ring: &LineString, point: &Coord) -> RingPosition {
    if ring.coords().any(|c| c.same_xy(point)) {
        return RingPosition::Vertex;
    }
    let mut crossings = 0usize;
    for (a, b) in ring.segments() {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        if a.y == b.y && a.y == point.y && point.x > min_x && point.x < max_x {
            return RingPosition::Boundary;
        }
        if point.y > min_y && point.y <= max_y && point.x <= max_x && a.y != b.y {
            let x_cross = (point.y - a.y) * (b.x - a.x) / (b.y - a.y) + a.x;
            if x_cross == point.x {
                return RingPosition::Boundary;
            }
            if a.x == b.x || point.x <= x_cross {
                crossings += 1;
            }
        }
    }
    if crossings % 2 == 1 {
        RingPosition::Inside
    } else {
        RingPosition::Outside
    }
}

/// Point-in-polygon test with independent policies for points on an edge
/// (`point_on_boundary`) and points on a vertex (`point_on_vertex`).
///
/// The exterior ring is tested first; a point inside it is then excluded by
/// any hole that contains it. Hole edges and vertices follow the same
/// policies as the exterior's. Empty inputs are never contained.
///
/// # Example
///
/// ```
/// use geowire_core::functions::predicates::point_in_polygon;
/// use geowire_core::geometry::{LineString, Point, Polygon};
///
/// let shell = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]).unwrap();
/// let poly = Polygon::from_exterior(shell).unwrap();
/// let on_edge = Point::new(2.0, 0.0);
/// assert!(point_in_polygon(&poly, &on_edge, true, true));
/// assert!(!point_in_polygon(&poly, &on_edge, false, true));
/// ```
pub fn point_in_polygon(
    polygon: &Polygon,
    point: &Point,
    point_on_boundary: bool,
    point_on_vertex: bool,
) -> bool {
    let (Some(c), Some(exterior)) = (point.coord(), polygon.exterior()) else {
        return false;
    };
    match ring_position(exterior, c) {
        RingPosition::Outside => false,
        RingPosition::Boundary => point_on_boundary,
        RingPosition::Vertex => point_on_vertex,
        RingPosition::Inside => {
            for hole in polygon.interiors() {
                match ring_position(hole, c) {
                    RingPosition::Inside => return false,
                    RingPosition::Boundary => return point_on_boundary,
                    RingPosition::Vertex => return point_on_vertex,
                    RingPosition::Outside => {}
                }
            }
            true
        }
    }
}

/// [`point_in_polygon`] lifted to Polygon and MultiPolygon geometries.
pub fn contains_point(
    geometry: &Geometry,
    point: &Point,
    point_on_boundary: bool,
    point_on_vertex: bool,
) -> Result<bool> {
    match geometry {
        Geometry::Polygon(p) => Ok(point_in_polygon(p, point, point_on_boundary, point_on_vertex)),
        Geometry::MultiPolygon(mp) => Ok(mp
            .iter()
            .any(|p| point_in_polygon(p, point, point_on_boundary, point_on_vertex))),
        _ => Err(GeometryError::WrongType("Polygon or MultiPolygon")),
    }
}

// ── Simplicity ────────────────────────────────────────────────────────────────

/// No two non-adjacent segments intersect. Pairwise check, O(n²) in the
/// number of segments.
pub fn is_simple_line(line: &LineString) -> bool {
    let segments: Vec<(&Coord, &Coord)> = line.segments().collect();
    for (i, (a1, a2)) in segments.iter().enumerate() {
        for (b1, b2) in segments.iter().skip(i + 2) {
            if segments_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// No two edges, across all rings, intersect. O(n²) in the number of edges.
pub fn is_simple_polygon(polygon: &Polygon) -> bool {
    let edges: Vec<(&Coord, &Coord)> = polygon.iter().flat_map(LineString::segments).collect();
    for (i, (a1, a2)) in edges.iter().enumerate() {
        for (b1, b2) in edges.iter().skip(i + 1) {
            if segments_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// ST_IsSimple.
///
/// Points are simple, multipoints are simple when no two members share a
/// position, collections are simple when every member is. Empty geometries
/// are simple.
///
/// # Example
///
/// ```
/// use geowire_core::functions::predicates::is_simple;
/// use geowire_core::geometry::{Geometry, LineString};
///
/// let bow: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]).unwrap().into();
/// assert!(!is_simple(&bow));
/// let zig: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]).unwrap().into();
/// assert!(is_simple(&zig));
/// ```
pub fn is_simple(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point(_) => true,
        Geometry::LineString(ls) => is_simple_line(ls),
        Geometry::Polygon(p) => is_simple_polygon(p),
        Geometry::MultiPoint(mp) => {
            let points = mp.members();
            points
                .iter()
                .enumerate()
                .all(|(i, p)| points[i + 1..].iter().all(|q| !p.equals_xy(q)))
        }
        Geometry::MultiLineString(mls) => mls.iter().all(is_simple_line),
        Geometry::MultiPolygon(mp) => mp.iter().all(is_simple_polygon),
        Geometry::GeometryCollection(gc) => gc.iter().all(is_simple),
    }
}

// ── Closedness ────────────────────────────────────────────────────────────────

/// ST_IsClosed for LineString and MultiLineString. An empty geometry is not
/// closed.
pub fn is_closed(geometry: &Geometry) -> Result<bool> {
    match geometry {
        Geometry::LineString(ls) => Ok(ls.is_closed()),
        Geometry::MultiLineString(mls) => {
            Ok(!mls.is_empty() && mls.iter().all(LineString::is_closed))
        }
        _ => Err(GeometryError::WrongType("LineString or MultiLineString")),
    }
}

/// ST_IsRing: closed and simple.
pub fn is_ring(line: &LineString) -> bool {
    line.is_closed() && is_simple_line(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryCollection, MultiLineString, MultiPoint};

    fn line(coords: &[(f64, f64)]) -> LineString {
        LineString::from_xy(coords).unwrap()
    }

    fn square(x: f64, y: f64, size: f64) -> LineString {
        line(&[
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ])
    }

    fn donut() -> Polygon {
        Polygon::new(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 2.0)]).unwrap()
    }

    // ── Segment intersection ───────────────────────────────────────

    #[test]
    fn crossing_in_interiors() {
        let hit = segment_intersection(
            &Coord::xy(0.0, 0.0),
            &Coord::xy(4.0, 0.0),
            &Coord::xy(1.0, -1.0),
            &Coord::xy(1.0, 1.0),
        );
        assert_eq!(hit, Some(Coord::xy(1.0, 0.0)));
    }

    #[test]
    fn endpoint_contacts_are_not_intersections() {
        let (a, b) = (Coord::xy(0.0, 0.0), Coord::xy(4.0, 0.0));
        // shared endpoint
        assert!(!segments_intersect(&a, &b, &b, &Coord::xy(4.0, 4.0)));
        // T-junction: one endpoint on the other's interior
        assert!(!segments_intersect(&a, &b, &Coord::xy(2.0, 0.0), &Coord::xy(2.0, 3.0)));
        // disjoint
        assert!(!segments_intersect(&a, &b, &Coord::xy(5.0, -1.0), &Coord::xy(5.0, 1.0)));
    }

    #[test]
    fn parallel_and_collinear_never_intersect() {
        let (a, b) = (Coord::xy(0.0, 0.0), Coord::xy(4.0, 0.0));
        assert!(!segments_intersect(&a, &b, &Coord::xy(0.0, 1.0), &Coord::xy(4.0, 1.0)));
        assert!(!segments_intersect(&a, &b, &Coord::xy(1.0, 0.0), &Coord::xy(3.0, 0.0)));
    }

    // ── Point in polygon ───────────────────────────────────────────

    #[test]
    fn boundary_policy_is_honoured() {
        let poly = Polygon::from_exterior(square(0.0, 0.0, 4.0)).unwrap();
        for edge in [Point::new(2.0, 0.0), Point::new(4.0, 2.0), Point::new(2.0, 4.0), Point::new(0.0, 1.0)] {
            assert!(point_in_polygon(&poly, &edge, true, false), "{edge:?}");
            assert!(!point_in_polygon(&poly, &edge, false, true), "{edge:?}");
        }
    }

    #[test]
    fn vertex_policy_is_independent() {
        let poly = Polygon::from_exterior(square(0.0, 0.0, 4.0)).unwrap();
        let corner = Point::new(4.0, 4.0);
        assert!(point_in_polygon(&poly, &corner, false, true));
        assert!(!point_in_polygon(&poly, &corner, true, false));
    }

    #[test]
    fn interior_and_exterior() {
        let poly = Polygon::from_exterior(square(0.0, 0.0, 4.0)).unwrap();
        assert!(point_in_polygon(&poly, &Point::new(2.0, 2.0), false, false));
        assert!(point_in_polygon(&poly, &Point::new(0.5, 3.9), false, false));
        assert!(!point_in_polygon(&poly, &Point::new(5.0, 2.0), true, true));
        assert!(!point_in_polygon(&poly, &Point::new(-1.0, 0.0), true, true));
        assert!(!point_in_polygon(&poly, &Point::empty(), true, true));
    }

    #[test]
    fn concave_ring() {
        // U shape opening upwards
        let u = Polygon::from_exterior(line(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
            (0.0, 0.0),
        ]))
        .unwrap();
        assert!(!point_in_polygon(&u, &Point::new(1.5, 2.0), true, true));
        assert!(point_in_polygon(&u, &Point::new(0.5, 2.0), false, false));
        assert!(point_in_polygon(&u, &Point::new(2.5, 2.0), false, false));
        assert!(point_in_polygon(&u, &Point::new(1.5, 0.5), false, false));
    }

    #[test]
    fn holes_exclude_and_their_edges_follow_policy() {
        let poly = donut();
        assert!(!point_in_polygon(&poly, &Point::new(2.0, 2.0), true, true));
        assert!(point_in_polygon(&poly, &Point::new(0.5, 0.5), false, false));
        let on_hole_edge = Point::new(2.0, 1.0);
        assert!(point_in_polygon(&poly, &on_hole_edge, true, false));
        assert!(!point_in_polygon(&poly, &on_hole_edge, false, true));
    }

    #[test]
    fn contains_point_wrong_type() {
        let l: Geometry = line(&[(0.0, 0.0), (1.0, 1.0)]).into();
        assert!(matches!(
            contains_point(&l, &Point::new(0.0, 0.0), true, true),
            Err(GeometryError::WrongType(_))
        ));
        assert!(contains_point(&donut().into(), &Point::new(0.5, 0.5), true, true).unwrap());
    }

    // ── Simplicity ─────────────────────────────────────────────────

    #[test]
    fn closed_square_line_is_simple() {
        assert!(is_simple(&square(0.0, 0.0, 1.0).into()));
        assert!(is_ring(&square(0.0, 0.0, 1.0)));
        let bow = line(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
        assert!(bow.is_closed());
        assert!(!is_ring(&bow));
    }

    #[test]
    fn polygon_simplicity_checks_across_rings() {
        assert!(is_simple(&donut().into()));
        let poking = Polygon::new(vec![square(0.0, 0.0, 4.0), square(3.0, 1.0, 2.0)]).unwrap();
        assert!(!is_simple(&poking.into()));
    }

    #[test]
    fn multipoint_duplicates() {
        let dup: Geometry = MultiPoint::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)])
            .unwrap()
            .into();
        assert!(!is_simple(&dup));
        let distinct: Geometry = MultiPoint::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 2.0)])
            .unwrap()
            .into();
        assert!(is_simple(&distinct));
    }

    #[test]
    fn collections_require_every_member_simple() {
        let gc: Geometry = GeometryCollection::new(vec![
            Point::new(0.0, 0.0).into(),
            line(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]).into(),
        ])
        .unwrap()
        .into();
        assert!(!is_simple(&gc));
        assert!(is_simple(&LineString::empty().into()));
    }

    // ── Closedness ─────────────────────────────────────────────────

    #[test]
    fn closedness() {
        let mls: Geometry = MultiLineString::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)])
            .unwrap()
            .into();
        assert!(is_closed(&mls).unwrap());
        let open: Geometry = line(&[(0.0, 0.0), (1.0, 0.0)]).into();
        assert!(!is_closed(&open).unwrap());
        assert!(!is_closed(&LineString::empty().into()).unwrap());
        assert!(!is_closed(&MultiLineString::empty().into()).unwrap());
        assert!(is_closed(&Point::new(0.0, 0.0).into()).is_err());
    }
}
