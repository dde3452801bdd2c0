//! Cross-codec round trips for geowire-core.

use approx::assert_abs_diff_eq;
use geowire_core::binary::ByteOrder;
use geowire_core::functions::io::{read_ewkt, read_geojson, read_wkt, write_ewkt, write_geojson};
use geowire_core::twkb::{read_twkb, read_twkb_hex, write_twkb, write_twkb_hex, TwkbOptions};
use geowire_core::wkb::{
    extract_srid, read_wkb, read_wkb_hex, set_srid, write_ewkb, write_ewkb_hex, write_wkb,
    WkbReader, WkbWriter,
};
use geowire_core::{
    Geometry, GeometryCollection, GeometryError, GeometryType, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon, Shape,
};

fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::from_exterior(
        LineString::from_xy(&[
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ])
        .unwrap(),
    )
    .unwrap()
}

/// One non-empty value of every kind, mixing dimensions.
fn samples() -> Vec<Geometry> {
    let line_z = LineString::new(vec![
        Point::new_z(0.0, 0.0, 1.0),
        Point::new_z(1.0, 2.0, 3.0),
        Point::new_z(-4.5, 2.25, 2.0),
    ])
    .unwrap();
    let line_m = LineString::new(vec![Point::new_m(0.0, 0.0, 7.0), Point::new_m(1.0, 1.0, 8.0)])
        .unwrap();
    vec![
        Point::new(1.0, 2.0).into(),
        Point::new_zm(1.0, 2.0, 3.0, 4.0).into(),
        line_z.clone().into(),
        square(0.0, 0.0, 4.0).into(),
        MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(5.0, -5.0)])
            .unwrap()
            .into(),
        MultiLineString::new(vec![line_m.clone(), line_m]).unwrap().into(),
        MultiPolygon::new(vec![square(0.0, 0.0, 1.0), square(3.0, 3.0, 2.0)])
            .unwrap()
            .into(),
        GeometryCollection::new(vec![
            Point::new(9.0, 9.0).into(),
            line_z.into(),
            GeometryCollection::new(vec![square(-2.0, -2.0, 1.0).into()])
                .unwrap()
                .into(),
        ])
        .unwrap()
        .into(),
    ]
}

fn empties() -> Vec<Geometry> {
    (1..=7)
        .filter_map(GeometryType::from_code)
        .map(Geometry::empty)
        .collect()
}

// ── WKB / EWKB ────────────────────────────────────────────────────────────────

#[test]
fn wkb_round_trips_every_kind_in_both_byte_orders() {
    for g in samples().into_iter().chain(empties()) {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            let bytes = WkbWriter::new(order).write(&g);
            assert_eq!(read_wkb(&bytes).unwrap(), g, "{order:?} {g:?}");
        }
    }
}

#[test]
fn ewkb_round_trip_keeps_srid() {
    for g in samples() {
        let g = g.with_srid(Some(3857));
        let blob = write_ewkb(&g);
        assert_eq!(extract_srid(&blob), Some(3857));
        assert_eq!(read_wkb(&blob).unwrap(), g);
        assert_eq!(extract_srid(&write_wkb(&g)), None);
    }
}

#[test]
fn ewkb_round_trip_preserves_zm_payload() {
    let hex = "01010000C0000000000000F03F000000000000004000000000000008400000000000001040";
    let g = read_wkb_hex(hex).unwrap();
    assert_eq!(g, Point::new_zm(1.0, 2.0, 3.0, 4.0).into());
    assert_eq!(write_ewkb_hex(&g), hex);
}

#[test]
fn ewkb_round_trip_preserves_big_endian_payload() {
    let hex = "00C00000013FF0000000000000400000000000000040080000000000004010000000000000";
    let g = read_wkb_hex(hex).unwrap();
    assert_eq!(WkbWriter::ewkb(ByteOrder::BigEndian).write_hex(&g), hex);
}

#[test]
fn legacy_iso_offsets_are_read_but_never_written() {
    // POINT Z (1 2 3) with type code 1001
    let iso = "01E9030000000000000000F03F00000000000000400000000000000840";
    let g = read_wkb_hex(iso).unwrap();
    assert_eq!(g, Point::new_z(1.0, 2.0, 3.0).into());
    assert_eq!(&write_wkb(&g)[1..5], &[0x01, 0x00, 0x00, 0x80]);
}

#[test]
fn set_srid_rewrites_existing_blob() {
    let blob = write_wkb(&square(0.0, 0.0, 1.0).into());
    let tagged = set_srid(&blob, Some(4326)).unwrap();
    assert_eq!(read_wkb(&tagged).unwrap().srid(), Some(4326));
    let cleared = set_srid(&tagged, None).unwrap();
    assert_eq!(cleared, blob);
}

// ── TWKB ──────────────────────────────────────────────────────────────────────

#[test]
fn twkb_round_trips_within_precision() {
    let line = LineString::new(vec![
        Point::new_z(0.123456, 10.0, 1.25),
        Point::new_z(-3.987654, 11.5, 2.5),
    ])
    .unwrap();
    let options = TwkbOptions {
        precision_xy: 3,
        precision_z: 2,
        ..TwkbOptions::default()
    };
    let back = read_twkb(&write_twkb(&line.clone().into(), &options).unwrap()).unwrap();
    let back = back.as_line_string().unwrap();
    assert!(back.has_z());
    for (a, b) in line.points().iter().zip(back.points()) {
        assert_abs_diff_eq!(a.x().unwrap(), b.x().unwrap(), epsilon = 1e-3);
        assert_abs_diff_eq!(a.y().unwrap(), b.y().unwrap(), epsilon = 1e-3);
        assert_abs_diff_eq!(a.z().unwrap(), b.z().unwrap(), epsilon = 1e-2);
    }
}

#[test]
fn twkb_is_exact_for_representable_values() {
    let options = TwkbOptions::with_precision(2);
    for g in samples().into_iter().chain(empties()) {
        let bytes = write_twkb(&g, &options).unwrap();
        assert_eq!(read_twkb(&bytes).unwrap(), g, "{g:?}");
    }
}

#[test]
fn twkb_size_and_bbox_do_not_change_the_geometry() {
    let options = TwkbOptions {
        precision_xy: 2,
        include_size: true,
        include_bbox: true,
        ..TwkbOptions::default()
    };
    for g in samples() {
        let hex = write_twkb_hex(&g, &options).unwrap();
        assert_eq!(read_twkb_hex(&hex).unwrap(), g);
    }
}

#[test]
fn twkb_is_smaller_than_wkb() {
    let coords: Vec<(f64, f64)> = (0..100).map(|i| (i as f64, (i % 7) as f64)).collect();
    let line: Geometry = LineString::from_xy(&coords).unwrap().into();
    let twkb = write_twkb(&line, &TwkbOptions::with_precision(0)).unwrap();
    assert!(twkb.len() * 4 < write_wkb(&line).len());
}

// ── Across codecs ─────────────────────────────────────────────────────────────

#[test]
fn wkb_to_twkb_to_wkb() {
    for g in samples() {
        let from_wkb = read_wkb(&write_wkb(&g)).unwrap();
        let twkb = write_twkb(&from_wkb, &TwkbOptions::with_precision(2)).unwrap();
        assert_eq!(write_wkb(&read_twkb(&twkb).unwrap()), write_wkb(&g));
    }
}

#[test]
fn text_to_binary_and_back() {
    let g = read_ewkt("SRID=4326;MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((3 3,5 3,5 5,3 5,3 3)))")
        .unwrap();
    assert_eq!(g.srid(), Some(4326));
    let through_ewkb = read_wkb(&write_ewkb(&g)).unwrap();
    assert_eq!(write_ewkt(&through_ewkb).unwrap(), write_ewkt(&g).unwrap());

    let through_twkb = read_twkb(&write_twkb(&g, &TwkbOptions::default()).unwrap()).unwrap();
    assert_eq!(through_twkb.with_srid(Some(4326)), g);

    let json = write_geojson(&g).unwrap();
    assert_eq!(read_geojson(&json).unwrap(), g);
}

#[test]
fn wkt_empties_reach_every_codec() {
    for text in ["POINT EMPTY", "LINESTRING EMPTY", "GEOMETRYCOLLECTION EMPTY"] {
        let g = read_wkt(text).unwrap();
        assert!(g.is_empty());
        assert_eq!(read_wkb(&write_wkb(&g)).unwrap(), g);
        assert_eq!(read_twkb(&write_twkb(&g, &TwkbOptions::default()).unwrap()).unwrap(), g);
    }
}

// ── Adversarial input ─────────────────────────────────────────────────────────

fn nested(levels: usize) -> Geometry {
    let mut g: Geometry = Point::new(1.0, 1.0).into();
    for _ in 0..levels {
        g = GeometryCollection::new(vec![g]).unwrap().into();
    }
    g
}

#[test]
fn nesting_beyond_the_bound_fails_closed() {
    let deep = nested(40);
    assert!(matches!(
        read_wkb(&write_wkb(&deep)),
        Err(GeometryError::UnsupportedGeometry(_))
    ));
    assert!(matches!(
        read_twkb(&write_twkb(&deep, &TwkbOptions::default()).unwrap()),
        Err(GeometryError::UnsupportedGeometry(_))
    ));
    assert_eq!(WkbReader::new(64).read(&write_wkb(&deep)).unwrap(), deep);
    assert_eq!(read_wkb(&write_wkb(&nested(32))).unwrap(), nested(32));
}

#[test]
fn corrupt_counts_fail_immediately() {
    // LINESTRING claiming u32::MAX points
    let blob = [0x01, 0x02, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
    assert!(matches!(
        read_wkb(&blob),
        Err(GeometryError::TruncatedData { .. })
    ));
    // TWKB LINESTRING claiming 2^35 points
    let blob = [0x02, 0x00, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    assert!(matches!(
        read_twkb(&blob),
        Err(GeometryError::TruncatedData { .. })
    ));
}

#[test]
fn truncated_twkb_is_never_an_empty_geometry() {
    let bytes = write_twkb(&square(0.0, 0.0, 2.0).into(), &TwkbOptions::default()).unwrap();
    for cut in 0..bytes.len() {
        assert!(read_twkb(&bytes[..cut]).is_err(), "cut at {cut}");
    }
}
