//! Text collaborators.
//!
//! ST_GeomFromText, ST_GeomFromEWKT, ST_GeomFromGeoJSON, ST_AsText, ST_AsEWKT, ST_AsGeoJSON
//!
//! Parsing and printing go through `geozero`, with WKB as the interchange
//! format in both directions. Z and M survive where the grammar has room for
//! them: WKT carries both, GeoJSON carries Z only. SRID survives in EWKT and
//! as GeoJSON's implied EPSG:4326.

use geozero::geojson::GeoJsonWriter;
use geozero::wkb::Ewkb;
use geozero::wkt::WktDialect;
use geozero::{CoordDimensions, GeozeroGeometry, ToWkb, ToWkt};
use serde_json::Value;

use crate::error::{GeometryError, Result};
use crate::geometry::{Geometry, GeometryType, Shape};
use crate::wkb::{read_wkb, write_wkb};

/// SRID implied by every GeoJSON document.
pub const GEOJSON_SRID: u32 = 4326;

/// A textual geometry format: `read(text) -> Geometry`, `write(Geometry) -> text`.
pub trait TextFormat {
    fn read(&self, text: &str) -> Result<Geometry>;
    fn write(&self, geometry: &Geometry) -> Result<String>;
}

/// Plain WKT; SRID is neither read nor written.
#[derive(Debug, Clone, Copy, Default)]
pub struct WktFormat;

/// WKT with an optional `SRID=n;` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct EwktFormat;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonFormat;

impl TextFormat for WktFormat {
    fn read(&self, text: &str) -> Result<Geometry> {
        read_wkt(text)
    }

    fn write(&self, geometry: &Geometry) -> Result<String> {
        write_wkt(geometry)
    }
}

impl TextFormat for EwktFormat {
    fn read(&self, text: &str) -> Result<Geometry> {
        read_ewkt(text)
    }

    fn write(&self, geometry: &Geometry) -> Result<String> {
        write_ewkt(geometry)
    }
}

impl TextFormat for GeoJsonFormat {
    fn read(&self, text: &str) -> Result<Geometry> {
        read_geojson(text)
    }

    fn write(&self, geometry: &Geometry) -> Result<String> {
        write_geojson(geometry)
    }
}

fn kind_named(name: &str) -> Option<GeometryType> {
    (1..=7)
        .filter_map(GeometryType::from_code)
        .find(|kind| kind.name().eq_ignore_ascii_case(name))
}

/// `<TYPE> EMPTY`, recognised without the engine.
fn wkt_empty(text: &str) -> Option<GeometryType> {
    let mut words = text.split_whitespace();
    let kind = kind_named(words.next()?)?;
    let keyword = words.next()?;
    (keyword.eq_ignore_ascii_case("EMPTY") && words.next().is_none()).then_some(kind)
}

fn geojson_empty(text: &str) -> Option<GeometryType> {
    let value: Value = serde_json::from_str(text).ok()?;
    let kind = kind_named(value.get("type")?.as_str()?)?;
    let members = match kind {
        GeometryType::GeometryCollection => value.get("geometries")?,
        _ => value.get("coordinates")?,
    };
    members.as_array()?.is_empty().then_some(kind)
}

fn dims(z: bool, m: bool) -> CoordDimensions {
    CoordDimensions {
        z,
        m,
        ..CoordDimensions::xy()
    }
}

/// Z and M as announced by the `Z`, `M` and `ZM` tags anywhere in the text,
/// spaced (`POINT Z`) or fused (`POINTZ`).
fn wkt_dims(text: &str) -> CoordDimensions {
    let (mut z, mut m) = (false, false);
    for word in text
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_ascii_uppercase();
        let tag = (1..=7)
            .filter_map(GeometryType::from_code)
            .map(|kind| kind.name().to_ascii_uppercase())
            .find_map(|name| word.strip_prefix(name.as_str()).map(str::to_string))
            .unwrap_or(word);
        match tag.as_str() {
            "Z" => z = true,
            "M" => m = true,
            "ZM" => (z, m) = (true, true),
            _ => {}
        }
    }
    dims(z, m)
}

/// Append ` Z`, ` M` or ` ZM` to every geometry keyword of untagged WKT.
fn tag_wkt(wkt: &str, z: bool, m: bool) -> String {
    let tag = match (z, m) {
        (true, true) => "ZM",
        (true, false) => "Z",
        (false, true) => "M",
        (false, false) => return wkt.to_string(),
    };
    let mut out = String::with_capacity(wkt.len() + 16);
    let mut rest = wkt;
    while let Some(start) = rest.find(|c: char| c.is_ascii_alphabetic()) {
        let (head, tail) = rest.split_at(start);
        let end = tail
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(tail.len());
        let (word, after) = tail.split_at(end);
        out.push_str(head);
        out.push_str(word);
        if kind_named(word).is_some() {
            out.push(' ');
            out.push_str(tag);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// True when any position in a GeoJSON geometry has a third ordinate.
fn geojson_has_z(value: &Value) -> bool {
    fn position_has_z(value: &Value) -> bool {
        match value.as_array() {
            Some(items) if items.first().is_some_and(Value::is_number) => items.len() > 2,
            Some(items) => items.iter().any(position_has_z),
            None => false,
        }
    }
    value.get("coordinates").is_some_and(position_has_z)
        || value
            .get("geometries")
            .and_then(Value::as_array)
            .is_some_and(|members| members.iter().any(geojson_has_z))
}

fn split_srid(text: &str) -> Result<(Option<u32>, &str)> {
    let trimmed = text.trim_start();
    let has_prefix = trimmed
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SRID="));
    if !has_prefix {
        return Ok((None, text));
    }
    let (srid, wkt) = trimmed[5..]
        .split_once(';')
        .ok_or_else(|| GeometryError::invalid("EWKT SRID prefix is missing ';'"))?;
    let srid: u32 = srid
        .trim()
        .parse()
        .map_err(|_| GeometryError::invalid(format!("invalid EWKT SRID '{srid}'")))?;
    Ok(((srid != 0).then_some(srid), wkt))
}

// ── Deserialization ───────────────────────────────────────────────────────────

/// Parse WKT into a geometry without SRID.
///
/// # Example
///
/// ```
/// use geowire_core::functions::io::read_wkt;
/// use geowire_core::geometry::{GeometryType, Shape};
///
/// let g = read_wkt("LINESTRING(0 0,1 1,2 2)").unwrap();
/// assert_eq!(g.geometry_type(), GeometryType::LineString);
/// assert_eq!(g.num_points(), 3);
/// ```
pub fn read_wkt(text: &str) -> Result<Geometry> {
    if let Some(kind) = wkt_empty(text) {
        return Ok(Geometry::empty(kind));
    }
    let wkb = geozero::wkt::Wkt(text.as_bytes()).to_wkb(wkt_dims(text))?;
    read_wkb(&wkb)
}

/// Parse EWKT (`SRID=n;WKT`, prefix optional).
///
/// # Example
///
/// ```
/// use geowire_core::functions::io::read_ewkt;
/// use geowire_core::geometry::Shape;
///
/// let g = read_ewkt("SRID=4326;POINT(1 2)").unwrap();
/// assert_eq!(g.srid(), Some(4326));
/// ```
pub fn read_ewkt(text: &str) -> Result<Geometry> {
    let (srid, wkt) = split_srid(text)?;
    Ok(read_wkt(wkt)?.with_srid(srid))
}

/// Parse a GeoJSON geometry object; the result carries SRID 4326.
pub fn read_geojson(text: &str) -> Result<Geometry> {
    let geometry = match geojson_empty(text) {
        Some(kind) => Geometry::empty(kind),
        None => {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| GeometryError::invalid(format!("invalid GeoJSON: {e}")))?;
            let wkb = geozero::geojson::GeoJson(text).to_wkb(dims(geojson_has_z(&value), false))?;
            read_wkb(&wkb)?
        }
    };
    Ok(geometry.with_srid(Some(GEOJSON_SRID)))
}

// ── Serialization ─────────────────────────────────────────────────────────────

/// Print a geometry as WKT.
///
/// # Example
///
/// ```
/// use geowire_core::functions::io::write_wkt;
/// use geowire_core::geometry::Point;
///
/// assert_eq!(write_wkt(&Point::new(1.0, 2.0).into()).unwrap(), "POINT(1 2)");
/// assert_eq!(write_wkt(&Point::empty().into()).unwrap(), "POINT EMPTY");
/// assert_eq!(write_wkt(&Point::new_z(1.0, 2.0, 3.0).into()).unwrap(), "POINT Z(1 2 3)");
/// ```
pub fn write_wkt(geometry: &Geometry) -> Result<String> {
    if geometry.is_empty() {
        return Ok(format!(
            "{} EMPTY",
            geometry.geometry_type().name().to_ascii_uppercase()
        ));
    }
    let (z, m) = (geometry.has_z(), geometry.is_measured());
    let wkb = write_wkb(geometry);
    let wkt = Ewkb(wkb.as_slice()).to_wkt_with_opts(WktDialect::Wkt, dims(z, m), None)?;
    Ok(tag_wkt(&wkt, z, m))
}

/// Print a geometry as EWKT, prefixed with `SRID=n;` when it has one.
pub fn write_ewkt(geometry: &Geometry) -> Result<String> {
    let wkt = write_wkt(geometry)?;
    match geometry.srid() {
        Some(s) => Ok(format!("SRID={s};{wkt}")),
        None => Ok(wkt),
    }
}

/// Print a geometry as a GeoJSON geometry object. Z is kept, M is dropped.
///
/// # Example
///
/// ```
/// use geowire_core::functions::io::write_geojson;
/// use geowire_core::geometry::Point;
///
/// let json = write_geojson(&Point::new(1.0, 2.0).into()).unwrap();
/// assert!(json.contains("Point"));
/// assert!(json.contains("coordinates"));
/// ```
pub fn write_geojson(geometry: &Geometry) -> Result<String> {
    if geometry.is_empty() {
        let name = geometry.geometry_type().name();
        return Ok(match geometry.geometry_type() {
            GeometryType::GeometryCollection => format!(r#"{{"type":"{name}","geometries":[]}}"#),
            _ => format!(r#"{{"type":"{name}","coordinates":[]}}"#),
        });
    }
    let wkb = write_wkb(geometry);
    let mut out = Vec::new();
    {
        let mut writer = GeoJsonWriter::with_dims(&mut out, dims(geometry.has_z(), false));
        Ewkb(wkb.as_slice()).process_geom(&mut writer)?;
    }
    String::from_utf8(out).map_err(|e| GeometryError::invalid(format!("GeoJSON output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryCollection, LineString, MultiPoint, Point, Polygon};

    #[test]
    fn invalid_text_returns_err() {
        assert!(read_wkt("NOT_VALID_WKT").is_err());
        assert!(read_geojson("{not json}").is_err());
        assert!(read_ewkt("SRID=abc;POINT(1 2)").is_err());
        assert!(read_ewkt("SRID=4326 POINT(1 2)").is_err());
    }

    #[test]
    fn wkt_round_trip() {
        let square = read_wkt("POLYGON((0 0,1 0,1 1,0 1,0 0))").unwrap();
        let expected: Geometry = Polygon::from_exterior(
            LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
                .unwrap(),
        )
        .unwrap()
        .into();
        assert_eq!(square, expected);
        assert_eq!(read_wkt(&write_wkt(&square).unwrap()).unwrap(), square);
    }

    #[test]
    fn empties_round_trip_through_text() {
        for kind in (1..=7).filter_map(GeometryType::from_code) {
            let empty = Geometry::empty(kind);
            assert_eq!(read_wkt(&write_wkt(&empty).unwrap()).unwrap(), empty);
            let from_json = read_geojson(&write_geojson(&empty).unwrap()).unwrap();
            assert_eq!(from_json, empty.with_srid(Some(GEOJSON_SRID)));
        }
        assert_eq!(read_wkt("point empty").unwrap(), Point::empty().into());
    }

    #[test]
    fn point_empty_geojson_matches_postgis() {
        assert_eq!(
            write_geojson(&Point::empty().into()).unwrap(),
            r#"{"type":"Point","coordinates":[]}"#
        );
    }

    #[test]
    fn ewkt_with_and_without_srid() {
        let g = Geometry::from(Point::new(1.0, 2.0)).with_srid(Some(4326));
        let ewkt = write_ewkt(&g).unwrap();
        assert!(ewkt.starts_with("SRID=4326;"));
        assert_eq!(read_ewkt(&ewkt).unwrap(), g);

        let plain = write_ewkt(&Point::new(1.0, 2.0).into()).unwrap();
        assert!(!plain.contains("SRID="));
        assert_eq!(read_ewkt(&plain).unwrap().srid(), None);
        assert_eq!(read_ewkt("srid=0;POINT(1 2)").unwrap().srid(), None);
    }

    #[test]
    fn geojson_round_trip_carries_4326() {
        let g: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.5, 2.5)]).unwrap().into();
        let json = write_geojson(&g).unwrap();
        let back = read_geojson(&json).unwrap();
        assert_eq!(back.srid(), Some(4326));
        assert_eq!(back.with_srid(None), g);
    }

    #[test]
    fn wkt_keeps_z_and_m() {
        let point = read_wkt("POINT Z (1 2 3)").unwrap();
        assert_eq!(point, Point::new_z(1.0, 2.0, 3.0).into());

        let line = read_wkt("LINESTRING ZM (0 0 1 5,2 2 3 6)").unwrap();
        let expected: Geometry = LineString::new(vec![
            Point::new_zm(0.0, 0.0, 1.0, 5.0),
            Point::new_zm(2.0, 2.0, 3.0, 6.0),
        ])
        .unwrap()
        .into();
        assert_eq!(line, expected);
        assert_eq!(read_wkt("LINESTRINGZM(0 0 1 5,2 2 3 6)").unwrap(), expected);

        let measured = read_wkt("POINT M (1 2 9)").unwrap();
        assert!(measured.is_measured());
        assert!(!measured.has_z());

        for g in [point, line, measured] {
            assert_eq!(read_wkt(&write_wkt(&g).unwrap()).unwrap(), g);
        }
    }

    #[test]
    fn collections_keep_z_through_wkt() {
        let g: Geometry = GeometryCollection::new(vec![
            Point::new_z(1.0, 2.0, 3.0).into(),
            MultiPoint::new(vec![Point::new_z(0.0, 0.0, 1.0), Point::new_z(4.0, 4.0, 2.0)])
                .unwrap()
                .into(),
        ])
        .unwrap()
        .into();
        let text = write_wkt(&g).unwrap();
        assert!(text.starts_with("GEOMETRYCOLLECTION Z"));
        assert_eq!(read_wkt(&text).unwrap(), g);
    }

    #[test]
    fn ewkt_keeps_z_and_srid() {
        let g = Geometry::from(Point::new_z(1.0, 2.0, 3.0)).with_srid(Some(3857));
        let back = read_ewkt(&write_ewkt(&g).unwrap()).unwrap();
        assert_eq!(back, g);
        assert!(back.has_z());
    }

    #[test]
    fn geojson_keeps_z_and_drops_m() {
        let g = read_geojson(r#"{"type":"LineString","coordinates":[[0,0,1],[1,1,2]]}"#).unwrap();
        assert!(g.has_z());
        let back = read_geojson(&write_geojson(&g).unwrap()).unwrap();
        assert_eq!(back, g);

        let flat = read_geojson(r#"{"type":"Point","coordinates":[1,2]}"#).unwrap();
        assert!(!flat.has_z());

        let zm: Geometry = Point::new_zm(1.0, 2.0, 3.0, 4.0).into();
        let back = read_geojson(&write_geojson(&zm).unwrap()).unwrap();
        assert_eq!(back.with_srid(None), Point::new_z(1.0, 2.0, 3.0).into());
    }

    #[test]
    fn formats_share_one_contract() {
        let formats: [&dyn TextFormat; 3] = [&WktFormat, &EwktFormat, &GeoJsonFormat];
        let g: Geometry = Point::new(3.0, 4.0).into();
        for format in formats {
            let back = format.read(&format.write(&g).unwrap()).unwrap();
            assert_eq!(back.with_srid(None), g);
        }
    }
}
