//! Kernel properties exercised through the public API.

use approx::assert_relative_eq;
use geowire_core::functions::io::read_wkt;
use geowire_core::functions::measurement::{area, centroid, distance, length};
use geowire_core::functions::predicates::{is_simple, point_in_polygon, segments_intersect};
use geowire_core::twkb::{read_twkb, write_twkb, TwkbOptions};
use geowire_core::{
    Coord, EngineConfig, Geometry, GeometryCollection, GeometryError, Kernel, LineString, Point,
    Polygon, Shape,
};

fn ring(coords: &[(f64, f64)]) -> LineString {
    LineString::from_xy(coords).unwrap()
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn construction_rejects_degenerate_shapes() {
    assert!(matches!(
        LineString::new(vec![Point::new(0.0, 0.0)]),
        Err(GeometryError::InvalidGeometry(_))
    ));
    let triangle_open = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]).unwrap();
    assert!(matches!(
        Polygon::new(vec![triangle_open]),
        Err(GeometryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        GeometryCollection::new(vec![Point::empty().into()]),
        Err(GeometryError::InvalidGeometry(_))
    ));
}

#[test]
fn mixed_dimension_line_keeps_z() {
    let line = LineString::new(vec![Point::new_z(0.0, 0.0, 5.0), Point::new(1.0, 1.0)]).unwrap();
    assert!(line.has_z());
    assert_eq!(line.points()[1].z(), None);
    assert_eq!(line.points()[0].z(), Some(5.0));
}

// ── Measurement ───────────────────────────────────────────────────────────────

#[test]
fn area_subtracts_holes() {
    let g: Geometry = Polygon::new(vec![
        ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
        ring(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]),
    ])
    .unwrap()
    .into();
    assert_eq!(area(&g), 12.0);
}

#[test]
fn centroid_of_unit_diagonal() {
    let g: Geometry = ring(&[(0.0, 0.0), (1.0, 1.0)]).into();
    assert_eq!(centroid(&g), Some(Point::new(0.5, 0.5)));
}

#[test]
fn native_and_engine_kernels_agree() {
    let shapes = [
        "POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 4,2 2))",
        "MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((5 5,8 5,8 9,5 9,5 5)))",
        "POLYGON((0 0,6 0,3 5,0 0))",
        "LINESTRING(0 0,3 0,3 4)",
        "MULTIPOINT((0 0),(2 0),(2 2))",
    ];
    let engine = Kernel::new(EngineConfig::default());
    let native = Kernel::new(EngineConfig::native());
    for wkt in shapes {
        let g = read_wkt(wkt).unwrap();
        assert_relative_eq!(
            engine.area(&g).unwrap(),
            native.area(&g).unwrap(),
            epsilon = 1e-9
        );
        let a = engine.centroid(&g).unwrap().unwrap();
        let b = native.centroid(&g).unwrap().unwrap();
        assert_relative_eq!(a.x().unwrap(), b.x().unwrap(), epsilon = 1e-9);
        assert_relative_eq!(a.y().unwrap(), b.y().unwrap(), epsilon = 1e-9);
    }
}

#[test]
fn distance_and_length() {
    let a = read_wkt("LINESTRING(0 0,10 0)").unwrap();
    let b = read_wkt("LINESTRING(0 3,10 3)").unwrap();
    assert_eq!(distance(&a, &b), Some(3.0));
    let crossing = read_wkt("LINESTRING(5 -1,5 1)").unwrap();
    assert_eq!(distance(&a, &crossing), Some(0.0));
    assert_eq!(length(&read_wkt("LINESTRING(0 0,3 4,3 10)").unwrap()), 11.0);
}

// ── Predicates ────────────────────────────────────────────────────────────────

#[test]
fn boundary_policy_is_a_parameter() {
    let poly = Polygon::from_exterior(ring(&[
        (0.0, 0.0),
        (4.0, 0.0),
        (4.0, 4.0),
        (0.0, 4.0),
        (0.0, 0.0),
    ]))
    .unwrap();
    let on_edge = Point::new(4.0, 2.0);
    assert!(point_in_polygon(&poly, &on_edge, true, false));
    assert!(!point_in_polygon(&poly, &on_edge, false, false));
    let corner = Point::new(4.0, 4.0);
    assert!(point_in_polygon(&poly, &corner, false, true));
    assert!(!point_in_polygon(&poly, &corner, true, false));
}

#[test]
fn shared_endpoints_are_not_intersections() {
    let o = Coord::xy(0.0, 0.0);
    let a = Coord::xy(1.0, 1.0);
    let b = Coord::xy(2.0, 0.0);
    assert!(!segments_intersect(&o, &a, &a, &b));
    assert!(segments_intersect(
        &o,
        &Coord::xy(2.0, 2.0),
        &Coord::xy(0.0, 2.0),
        &Coord::xy(2.0, 0.0)
    ));
}

#[test]
fn simplicity_follows_the_open_interval_rule() {
    assert!(is_simple(&read_wkt("LINESTRING(0 0,1 1,2 0,3 1)").unwrap()));
    assert!(!is_simple(&read_wkt("LINESTRING(0 0,2 2,2 0,0 2)").unwrap()));
    assert!(!is_simple(&read_wkt("MULTIPOINT((1 1),(1 1))").unwrap()));
}

// ── TWKB ──────────────────────────────────────────────────────────────────────

#[test]
fn twkb_accumulates_deltas_in_order() {
    for offset in [0.0, 1e6, -3e9] {
        let g: Geometry = ring(&[(offset, offset), (offset + 1.0, offset + 1.0), (offset + 1.0, offset)]).into();
        let back = read_twkb(&write_twkb(&g, &TwkbOptions::with_precision(0)).unwrap()).unwrap();
        assert_eq!(back, g);
    }
}

#[test]
fn engine_toggle_is_isolated_between_kernels() {
    let mut first = Kernel::default();
    let second = Kernel::default();
    first.set_engine_available(false);
    assert!(!first.engine_available());
    assert!(second.engine_available());
    assert_eq!(first.config(), EngineConfig::native());
}
