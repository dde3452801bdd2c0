//! Native measurement kernel.
//!
//! Bounding-box accessors, area, centroid, planar/great-circle/haversine
//! length and minimum distance, computed directly on the in-memory model.
//! Everything here works in the XY plane; Z only enters the 3-D correction of
//! [`great_circle_length`].

use crate::functions::predicates::segment_intersection;
use crate::geometry::{Coord, Geometry, LineString, Point, Polygon, Shape};

/// Earth radius used by [`great_circle_length`] by default, in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

// ── Bounding-box accessors ────────────────────────────────────────────────────

/// ST_XMin. `None` for empty geometries.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::{x_max, x_min, y_max, y_min};
/// use geowire_core::geometry::{Geometry, LineString};
///
/// let g: Geometry = LineString::from_xy(&[(1.0, 2.0), (3.0, 4.0)]).unwrap().into();
/// assert_eq!((x_min(&g), y_min(&g)), (Some(1.0), Some(2.0)));
/// assert_eq!((x_max(&g), y_max(&g)), (Some(3.0), Some(4.0)));
/// ```
pub fn x_min(geometry: &Geometry) -> Option<f64> {
    geometry.bbox().map(|b| b.minx)
}

pub fn x_max(geometry: &Geometry) -> Option<f64> {
    geometry.bbox().map(|b| b.maxx)
}

pub fn y_min(geometry: &Geometry) -> Option<f64> {
    geometry.bbox().map(|b| b.miny)
}

pub fn y_max(geometry: &Geometry) -> Option<f64> {
    geometry.bbox().map(|b| b.maxy)
}

// ── Area ──────────────────────────────────────────────────────────────────────

/// Shoelace sum of a ring divided by two. Positive for counter-clockwise rings.
pub fn ring_signed_area(ring: &LineString) -> f64 {
    ring.segments()
        .map(|(a, b)| a.x * b.y - a.y * b.x)
        .sum::<f64>()
        / 2.0
}

/// Signed exterior area minus the absolute area of every hole.
pub fn polygon_signed_area(polygon: &Polygon) -> f64 {
    match polygon.exterior() {
        Some(exterior) => ring_signed_area(exterior) - holes_area(polygon),
        None => 0.0,
    }
}

/// `|exterior| - Σ|hole|`.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::polygon_area;
/// use geowire_core::geometry::{LineString, Polygon};
///
/// let shell = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]).unwrap();
/// let hole = LineString::from_xy(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]).unwrap();
/// let poly = Polygon::new(vec![shell, hole]).unwrap();
/// assert_eq!(polygon_area(&poly), 12.0);
/// ```
pub fn polygon_area(polygon: &Polygon) -> f64 {
    match polygon.exterior() {
        Some(exterior) => ring_signed_area(exterior).abs() - holes_area(polygon),
        None => 0.0,
    }
}

fn holes_area(polygon: &Polygon) -> f64 {
    polygon
        .interiors()
        .iter()
        .map(|hole| ring_signed_area(hole).abs())
        .sum()
}

/// ST_Area: planar area. Points and lines have none; collections sum their members.
pub fn area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(p) => polygon_area(p),
        Geometry::MultiPolygon(mp) => mp.iter().map(polygon_area).sum(),
        Geometry::GeometryCollection(gc) => gc.iter().map(area).sum(),
        Geometry::Point(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => 0.0,
    }
}

// ── Length ────────────────────────────────────────────────────────────────────

/// Every line of a geometry, polygon rings included.
fn line_work(geometry: &Geometry) -> Vec<&LineString> {
    let mut out = Vec::new();
    collect_lines(geometry, &mut out);
    out
}

fn collect_lines<'a>(geometry: &'a Geometry, out: &mut Vec<&'a LineString>) {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::LineString(ls) => out.push(ls),
        Geometry::Polygon(p) => out.extend(p.iter()),
        Geometry::MultiLineString(mls) => out.extend(mls.iter()),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| out.extend(p.iter())),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| collect_lines(g, out)),
    }
}

fn planar_distance(a: &Coord, b: &Coord) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Running sum of consecutive point distances.
pub fn line_length(line: &LineString) -> f64 {
    line.segments().map(|(a, b)| planar_distance(a, b)).sum()
}

/// ST_Length: planar length of every line, polygon rings included.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::length;
/// use geowire_core::geometry::{Geometry, LineString};
///
/// let g: Geometry = LineString::from_xy(&[(0.0, 0.0), (3.0, 4.0)]).unwrap().into();
/// assert_eq!(length(&g), 5.0);
/// ```
pub fn length(geometry: &Geometry) -> f64 {
    line_work(geometry).into_iter().map(line_length).sum()
}

/// ST_Perimeter: total ring length of the polygons in a geometry.
pub fn perimeter(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(p) => p.iter().map(line_length).sum(),
        Geometry::MultiPolygon(mp) => mp.iter().flat_map(|p| p.iter()).map(line_length).sum(),
        Geometry::GeometryCollection(gc) => gc.iter().map(perimeter).sum(),
        _ => 0.0,
    }
}

/// Great-circle length in the unit of `radius`, for geometries in degrees.
///
/// Each segment's central angle comes from the atan2 form of the spherical
/// law of cosines. When both ends of a segment carry Z, the altitude change
/// is added as the other leg of a right triangle.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::{great_circle_length, EARTH_RADIUS};
/// use geowire_core::geometry::{Geometry, LineString};
///
/// // one degree of longitude along the equator
/// let g: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]).unwrap().into();
/// let metres = great_circle_length(&g, EARTH_RADIUS);
/// assert!((metres - 111_319.49).abs() < 0.01);
/// ```
pub fn great_circle_length(geometry: &Geometry, radius: f64) -> f64 {
    line_work(geometry)
        .into_iter()
        .flat_map(LineString::segments)
        .map(|(a, b)| {
            let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
            let dlon = (b.x - a.x).to_radians();
            let numerator = (lat2.cos() * dlon.sin())
                .hypot(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos());
            let denominator = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
            let arc = radius * numerator.atan2(denominator);
            match (a.z, b.z) {
                (Some(z1), Some(z2)) => arc.hypot(z2 - z1),
                _ => arc,
            }
        })
        .sum()
}

/// Haversine-style length in degrees of arc.
///
/// Sums `acos(sin φ1 sin φ2 + cos φ1 cos φ2 cos |Δλ|)` per segment. Kept apart
/// from [`great_circle_length`]: the result is an angle, Z is ignored and the
/// acos form loses precision for very short segments.
pub fn haversine_length(geometry: &Geometry) -> f64 {
    line_work(geometry)
        .into_iter()
        .flat_map(LineString::segments)
        .map(|(a, b)| {
            let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
            let dlon = (a.x - b.x).abs().to_radians();
            let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
            cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
        })
        .sum()
}

// ── Centroid ──────────────────────────────────────────────────────────────────

/// Length-weighted mean of segment midpoints; a line whose points all
/// coincide yields its start point.
fn line_centroid(line: &LineString) -> Option<Coord> {
    let start = line.coords().next()?;
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for (a, b) in line.segments() {
        let len = planar_distance(a, b);
        if len == 0.0 {
            continue;
        }
        sx += (a.x + b.x) / 2.0 * len;
        sy += (a.y + b.y) / 2.0 * len;
        total += len;
    }
    if total == 0.0 {
        return Some(Coord::xy(start.x, start.y));
    }
    Some(Coord::xy(sx / total, sy / total))
}

/// Centroid of the area enclosed by one ring, given its signed area.
fn ring_centroid(ring: &LineString, signed_area: f64) -> Coord {
    let (mut cx, mut cy) = (0.0, 0.0);
    for (a, b) in ring.segments() {
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Coord::xy(cx / (6.0 * signed_area), cy / (6.0 * signed_area))
}

/// Exterior centroid weighted by its area, holes weighted negatively. A
/// polygon without area yields its first point.
fn polygon_centroid(polygon: &Polygon) -> Option<Coord> {
    let first = polygon.exterior()?.coords().next()?;
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for (index, ring) in polygon.iter().enumerate() {
        let signed = ring_signed_area(ring);
        if signed == 0.0 {
            continue;
        }
        let c = ring_centroid(ring, signed);
        let weight = if index == 0 { signed.abs() } else { -signed.abs() };
        sx += c.x * weight;
        sy += c.y * weight;
        total += weight;
    }
    if total == 0.0 {
        return Some(Coord::xy(first.x, first.y));
    }
    Some(Coord::xy(sx / total, sy / total))
}

/// A leaf component of a collection: its centroid, topological dimension and weight.
struct Part {
    centroid: Coord,
    dimension: u8,
    weight: f64,
}

fn collect_parts(geometry: &Geometry, out: &mut Vec<Part>) {
    if let Geometry::GeometryCollection(gc) = geometry {
        gc.iter().for_each(|g| collect_parts(g, out));
        return;
    }
    let mut push = |centroid: Option<Coord>, dimension: u8, weight: f64| {
        if let Some(centroid) = centroid {
            out.push(Part {
                centroid,
                dimension,
                weight,
            });
        }
    };
    match geometry {
        Geometry::Point(p) => push(p.coord().map(|c| Coord::xy(c.x, c.y)), 0, 1.0),
        Geometry::LineString(ls) => push(line_centroid(ls), 1, line_length(ls)),
        Geometry::Polygon(p) => push(polygon_centroid(p), 2, polygon_area(p)),
        Geometry::MultiPoint(mp) => mp
            .iter()
            .for_each(|p| push(p.coord().map(|c| Coord::xy(c.x, c.y)), 0, 1.0)),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .for_each(|ls| push(line_centroid(ls), 1, line_length(ls))),
        Geometry::MultiPolygon(mp) => mp
            .iter()
            .for_each(|p| push(polygon_centroid(p), 2, polygon_area(p))),
        Geometry::GeometryCollection(_) => {}
    }
}

/// Weighted mean over the highest-dimension parts; plain mean when their
/// weights sum to zero.
fn combine_parts(parts: &[Part]) -> Option<Coord> {
    let dimension = parts.iter().map(|p| p.dimension).max()?;
    let top: Vec<&Part> = parts.iter().filter(|p| p.dimension == dimension).collect();
    let total: f64 = top.iter().map(|p| p.weight).sum();
    if total > 0.0 {
        let x = top.iter().map(|p| p.centroid.x * p.weight).sum::<f64>() / total;
        let y = top.iter().map(|p| p.centroid.y * p.weight).sum::<f64>() / total;
        return Some(Coord::xy(x, y));
    }
    let n = top.len() as f64;
    let x = top.iter().map(|p| p.centroid.x).sum::<f64>() / n;
    let y = top.iter().map(|p| p.centroid.y).sum::<f64>() / n;
    Some(Coord::xy(x, y))
}

/// ST_Centroid: 2-D centroid carrying the input's SRID; `None` when empty.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::centroid;
/// use geowire_core::geometry::{Geometry, LineString, Point};
///
/// let g: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)]).unwrap().into();
/// assert_eq!(centroid(&g), Some(Point::new(0.5, 0.5)));
/// ```
pub fn centroid(geometry: &Geometry) -> Option<Point> {
    let coord = match geometry {
        Geometry::Point(p) => p.coord().map(|c| Coord::xy(c.x, c.y)),
        Geometry::LineString(ls) => line_centroid(ls),
        Geometry::Polygon(p) => polygon_centroid(p),
        _ => {
            let mut parts = Vec::new();
            collect_parts(geometry, &mut parts);
            combine_parts(&parts)
        }
    }?;
    let mut point = Point::from(coord);
    point.set_srid(geometry.srid());
    Some(point)
}

// ── Distance ──────────────────────────────────────────────────────────────────

/// Distance from `p` to the segment `a`-`b`: the projection of `p` onto the
/// segment's line, clamped to the segment.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::point_segment_distance;
/// use geowire_core::geometry::Coord;
///
/// let (a, b) = (Coord::xy(0.0, 0.0), Coord::xy(10.0, 0.0));
/// assert_eq!(point_segment_distance(&Coord::xy(5.0, 3.0), &a, &b), 3.0);
/// assert_eq!(point_segment_distance(&Coord::xy(13.0, 4.0), &a, &b), 5.0);
/// ```
pub fn point_segment_distance(p: &Coord, a: &Coord, b: &Coord) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return planar_distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    planar_distance(p, &Coord::xy(a.x + t * dx, a.y + t * dy))
}

/// Distance between two segments; zero when they cross.
pub fn segment_segment_distance(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> f64 {
    if segment_intersection(a1, a2, b1, b2).is_some() {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

enum Element<'a> {
    Vertex(&'a Coord),
    Segment(&'a Coord, &'a Coord),
}

/// Isolated points and line segments of a geometry.
fn collect_elements<'a>(geometry: &'a Geometry, out: &mut Vec<Element<'a>>) {
    match geometry {
        Geometry::Point(p) => out.extend(p.coord().map(Element::Vertex)),
        Geometry::MultiPoint(mp) => out.extend(mp.iter().filter_map(Point::coord).map(Element::Vertex)),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| collect_elements(g, out)),
        _ => out.extend(
            line_work(geometry)
                .into_iter()
                .flat_map(LineString::segments)
                .map(|(a, b)| Element::Segment(a, b)),
        ),
    }
}

fn element_distance(a: &Element<'_>, b: &Element<'_>) -> f64 {
    match (a, b) {
        (Element::Vertex(p), Element::Vertex(q)) => planar_distance(p, q),
        (Element::Vertex(p), Element::Segment(s1, s2))
        | (Element::Segment(s1, s2), Element::Vertex(p)) => point_segment_distance(p, s1, s2),
        (Element::Segment(a1, a2), Element::Segment(b1, b2)) => {
            segment_segment_distance(a1, a2, b1, b2)
        }
    }
}

/// ST_Distance: minimum planar distance between the points and segments of
/// two geometries, `None` if either is empty.
///
/// Polygons are measured by their rings, so a point inside a polygon is at
/// the distance of the nearest ring. The scan stops at the first crossing
/// segment pair.
///
/// # Example
///
/// ```
/// use geowire_core::functions::measurement::distance;
/// use geowire_core::geometry::{Geometry, LineString, Point};
///
/// let p: Geometry = Point::new(0.0, 0.0).into();
/// let q: Geometry = Point::new(3.0, 4.0).into();
/// assert_eq!(distance(&p, &q), Some(5.0));
///
/// let a: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 2.0)]).unwrap().into();
/// let b: Geometry = LineString::from_xy(&[(0.0, 2.0), (2.0, 0.0)]).unwrap().into();
/// assert_eq!(distance(&a, &b), Some(0.0));
/// ```
pub fn distance(a: &Geometry, b: &Geometry) -> Option<f64> {
    let (mut ea, mut eb) = (Vec::new(), Vec::new());
    collect_elements(a, &mut ea);
    collect_elements(b, &mut eb);
    let mut best: Option<f64> = None;
    for x in &ea {
        for y in &eb {
            let d = element_distance(x, y);
            if d == 0.0 {
                return Some(0.0);
            }
            best = Some(best.map_or(d, |current| current.min(d)));
        }
    }
    best
}
