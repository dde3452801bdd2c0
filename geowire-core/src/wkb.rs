//! WKB / EWKB codec.
//!
//! Wire format (per geometry, nested members included):
//!   [0x01|0x00]   byte order marker (little-endian or big-endian)
//!   [u32]         geometry type with flags (in the declared byte order)
//!                   Bit 29 (0x20000000): SRID present (EWKB)
//!                   Bit 31 (0x80000000): Z dimension
//!                   Bit 30 (0x40000000): M dimension
//!                   Legacy ISO offsets +1000 (Z), +2000 (M), +3000 (ZM)
//!                   are accepted on read; only the bit flags are written.
//!   [u32]         SRID (only when the SRID flag is set)
//!   ...           payload: Point = X Y [Z] [M] doubles, LineString =
//!                   count + points, Polygon = count + rings, Multi* and
//!                   GeometryCollection = count + complete nested geometries

use crate::binary::{BinaryReader, BinaryWriter, ByteOrder};
use crate::error::{GeometryError, Result};
use crate::geometry::{
    Coord, Geometry, GeometryCollection, GeometryType, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Shape,
};

// ── EWKB flag constants ───────────────────────────────────────────────────────
pub const EWKB_SRID_FLAG: u32 = 0x20000000;
pub const EWKB_Z_FLAG: u32 = 0x80000000;
pub const EWKB_M_FLAG: u32 = 0x40000000;

// ── Geometry type codes (ISO WKB) ─────────────────────────────────────────────
pub const WKB_POINT: u32 = 1;
pub const WKB_LINESTRING: u32 = 2;
pub const WKB_POLYGON: u32 = 3;
pub const WKB_MULTIPOINT: u32 = 4;
pub const WKB_MULTILINESTRING: u32 = 5;
pub const WKB_MULTIPOLYGON: u32 = 6;
pub const WKB_GEOMETRYCOLLECTION: u32 = 7;

/// Default bound on collection nesting accepted by the readers.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Smallest possible nested geometry: byte order + type code.
const MIN_GEOMETRY_BYTES: usize = 5;

/// Decoded type word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCode {
    pub geometry_type: GeometryType,
    pub has_z: bool,
    pub has_m: bool,
    pub has_srid: bool,
}

impl TypeCode {
    /// Split a raw type word into kind and flags, accepting both the bit-mask
    /// and the `+1000/+2000/+3000` dimension schemes.
    ///
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::GeometryType;
    /// use geowire_core::wkb::{TypeCode, EWKB_Z_FLAG};
    ///
    /// let legacy = TypeCode::decode(1002).unwrap();
    /// let masked = TypeCode::decode(2 | EWKB_Z_FLAG).unwrap();
    /// assert_eq!(legacy, masked);
    /// assert_eq!(legacy.geometry_type, GeometryType::LineString);
    /// assert!(legacy.has_z);
    /// ```
    pub fn decode(raw: u32) -> Result<Self> {
        let has_srid = raw & EWKB_SRID_FLAG != 0;
        let mut has_z = raw & EWKB_Z_FLAG != 0;
        let mut has_m = raw & EWKB_M_FLAG != 0;
        let code = raw & 0x1FFF_FFFF;
        match code / 1000 {
            0 => {}
            1 => has_z = true,
            2 => has_m = true,
            3 => {
                has_z = true;
                has_m = true;
            }
            _ => {
                return Err(GeometryError::unsupported(format!(
                    "unknown WKB type code {raw}"
                )))
            }
        }
        let geometry_type = GeometryType::from_code(code % 1000).ok_or_else(|| {
            GeometryError::unsupported(format!("unknown WKB type code {raw}"))
        })?;
        Ok(Self {
            geometry_type,
            has_z,
            has_m,
            has_srid,
        })
    }

    /// Bit-mask encoding; the legacy offsets are never produced.
    pub fn encode(&self) -> u32 {
        let mut raw = self.geometry_type.code();
        if self.has_z {
            raw |= EWKB_Z_FLAG;
        }
        if self.has_m {
            raw |= EWKB_M_FLAG;
        }
        if self.has_srid {
            raw |= EWKB_SRID_FLAG;
        }
        raw
    }
}

/// Parsed WKB/EWKB header metadata.
#[derive(Debug, Clone)]
pub struct WkbHeader {
    pub geometry_type: GeometryType,
    /// SRID embedded in the EWKB, if the SRID flag is set.
    pub srid: Option<u32>,
    pub has_z: bool,
    pub has_m: bool,
    /// Byte offset where the geometry payload starts (after header + optional SRID).
    pub data_offset: usize,
    pub byte_order: ByteOrder,
}

/// Peek at the header without parsing the geometry.
///
/// # Example
///
/// ```
/// use geowire_core::geometry::{Geometry, GeometryType, Point};
/// use geowire_core::wkb::{parse_wkb_header, write_ewkb};
///
/// let blob = write_ewkb(&Geometry::from(Point::new(1.0, 2.0)).with_srid(Some(4326)));
/// let hdr = parse_wkb_header(&blob).unwrap();
/// assert_eq!(hdr.geometry_type, GeometryType::Point);
/// assert_eq!(hdr.srid, Some(4326));
/// assert_eq!(hdr.data_offset, 9);
/// ```
pub fn parse_wkb_header(blob: &[u8]) -> Result<WkbHeader> {
    let mut r = BinaryReader::new(blob, ByteOrder::LittleEndian);
    let byte_order = ByteOrder::from_marker(r.read_u8()?)?;
    r.set_byte_order(byte_order);
    let code = TypeCode::decode(r.read_u32()?)?;
    let srid = if code.has_srid {
        Some(r.read_u32()?)
    } else {
        None
    };
    Ok(WkbHeader {
        geometry_type: code.geometry_type,
        srid,
        has_z: code.has_z,
        has_m: code.has_m,
        data_offset: r.position(),
        byte_order,
    })
}

/// Extract only the SRID (cheap, no geometry parsing). SRID 0 reads as `None`.
pub fn extract_srid(blob: &[u8]) -> Option<u32> {
    parse_wkb_header(blob)
        .ok()
        .and_then(|h| h.srid)
        .filter(|s| *s != 0)
}

/// Rewrite the SRID of an existing blob without re-encoding the payload.
///
/// The payload is validated first so malformed input cannot be "fixed" by
/// adding an SRID. `None` (or 0) removes the SRID and its flag.
///
/// # Example
///
/// ```
/// use geowire_core::geometry::{Geometry, Point};
/// use geowire_core::wkb::{extract_srid, set_srid, write_wkb};
///
/// let blob = write_wkb(&Geometry::from(Point::new(1.0, 2.0)));
/// let updated = set_srid(&blob, Some(3857)).unwrap();
/// assert_eq!(extract_srid(&updated), Some(3857));
/// ```
pub fn set_srid(blob: &[u8], srid: Option<u32>) -> Result<Vec<u8>> {
    WkbReader::default().read(blob)?;
    let header = parse_wkb_header(blob)?;
    let srid = srid.filter(|s| *s != 0);

    let mut r = BinaryReader::new(&blob[1..], header.byte_order);
    let raw_type = r.read_u32()?;
    let raw_type = match srid {
        Some(_) => raw_type | EWKB_SRID_FLAG,
        None => raw_type & !EWKB_SRID_FLAG,
    };

    let mut w = BinaryWriter::new(header.byte_order);
    w.write_u8(header.byte_order.marker());
    w.write_u32(raw_type);
    if let Some(s) = srid {
        w.write_u32(s);
    }
    // Skip old SRID bytes if they were present, copy remaining payload
    w.write_bytes(&blob[header.data_offset..]);
    Ok(w.into_bytes())
}

/// PostGIS-style type name for a raw type word.
///
/// # Example
///
/// ```
/// use geowire_core::wkb::{geom_type_name, WKB_POINT, WKB_POLYGON};
///
/// assert_eq!(geom_type_name(WKB_POINT), "ST_Point");
/// assert_eq!(geom_type_name(WKB_POLYGON | 0x80000000), "ST_Polygon");
/// assert_eq!(geom_type_name(999), "ST_Unknown");
/// ```
pub fn geom_type_name(raw_type: u32) -> &'static str {
    match TypeCode::decode(raw_type).map(|c| c.geometry_type) {
        Ok(GeometryType::Point) => "ST_Point",
        Ok(GeometryType::LineString) => "ST_LineString",
        Ok(GeometryType::Polygon) => "ST_Polygon",
        Ok(GeometryType::MultiPoint) => "ST_MultiPoint",
        Ok(GeometryType::MultiLineString) => "ST_MultiLineString",
        Ok(GeometryType::MultiPolygon) => "ST_MultiPolygon",
        Ok(GeometryType::GeometryCollection) => "ST_GeometryCollection",
        Err(_) => "ST_Unknown",
    }
}

#[derive(Debug, Clone, Copy)]
struct Dims {
    z: bool,
    m: bool,
}

impl Dims {
    fn of<S: Shape>(shape: &S) -> Self {
        Self {
            z: shape.has_z(),
            m: shape.is_measured(),
        }
    }

    fn ordinates(self) -> usize {
        2 + usize::from(self.z) + usize::from(self.m)
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Decoder for WKB and EWKB, with a bound on collection nesting.
#[derive(Debug, Clone, Copy)]
pub struct WkbReader {
    max_depth: usize,
}

impl Default for WkbReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl WkbReader {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decode one geometry. Bytes after it are ignored.
    pub fn read(&self, bytes: &[u8]) -> Result<Geometry> {
        let mut r = BinaryReader::new(bytes, ByteOrder::LittleEndian);
        self.read_geometry(&mut r, 0)
    }

    pub fn read_hex(&self, text: &str) -> Result<Geometry> {
        self.read(&hex::decode(text.trim())?)
    }

    fn read_geometry(&self, r: &mut BinaryReader<'_>, depth: usize) -> Result<Geometry> {
        if depth > self.max_depth {
            return Err(GeometryError::unsupported(format!(
                "geometry nesting exceeds {} levels",
                self.max_depth
            )));
        }
        let outer_order = r.byte_order();
        let marker = r.read_u8()?;
        r.set_byte_order(ByteOrder::from_marker(marker)?);
        let code = TypeCode::decode(r.read_u32()?)?;
        let srid = if code.has_srid {
            Some(r.read_u32()?)
        } else {
            None
        };
        let dims = Dims {
            z: code.has_z,
            m: code.has_m,
        };

        let mut geometry: Geometry = match code.geometry_type {
            GeometryType::Point => read_point(r, dims)?.into(),
            GeometryType::LineString => read_line_string(r, dims)?.into(),
            GeometryType::Polygon => read_polygon(r, dims)?.into(),
            GeometryType::MultiPoint => MultiPoint::new(self.read_members(
                r,
                depth,
                GeometryType::MultiPoint,
                |g| match g {
                    Geometry::Point(p) => Some(p),
                    _ => None,
                },
            )?)?
            .into(),
            GeometryType::MultiLineString => MultiLineString::new(self.read_members(
                r,
                depth,
                GeometryType::MultiLineString,
                |g| match g {
                    Geometry::LineString(ls) => Some(ls),
                    _ => None,
                },
            )?)?
            .into(),
            GeometryType::MultiPolygon => MultiPolygon::new(self.read_members(
                r,
                depth,
                GeometryType::MultiPolygon,
                |g| match g {
                    Geometry::Polygon(p) => Some(p),
                    _ => None,
                },
            )?)?
            .into(),
            GeometryType::GeometryCollection => GeometryCollection::new(self.read_members(
                r,
                depth,
                GeometryType::GeometryCollection,
                Some,
            )?)?
            .into(),
        };
        geometry.set_srid(srid);
        r.set_byte_order(outer_order);
        Ok(geometry)
    }

    fn read_members<T>(
        &self,
        r: &mut BinaryReader<'_>,
        depth: usize,
        parent: GeometryType,
        extract: impl Fn(Geometry) -> Option<T>,
    ) -> Result<Vec<T>> {
        let count = read_count(r, MIN_GEOMETRY_BYTES)?;
        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            let member = self.read_geometry(r, depth + 1)?;
            let kind = member.geometry_type();
            match extract(member) {
                Some(m) => members.push(m),
                None => {
                    return Err(GeometryError::invalid(format!(
                        "{parent} cannot contain a {kind}"
                    )))
                }
            }
        }
        Ok(members)
    }
}

/// Read a u32 count and reject it outright if the remaining buffer cannot
/// possibly hold that many items.
fn read_count(r: &mut BinaryReader<'_>, min_item_bytes: usize) -> Result<usize> {
    let count = r.read_u32()? as usize;
    let needed = count.saturating_mul(min_item_bytes);
    if needed > r.remaining() {
        return Err(GeometryError::TruncatedData {
            offset: r.position(),
            needed,
            available: r.remaining(),
        });
    }
    Ok(count)
}

fn read_ordinate(r: &mut BinaryReader<'_>) -> Result<Option<f64>> {
    let v = r.read_f64()?;
    Ok((!v.is_nan()).then_some(v))
}

fn read_coord(r: &mut BinaryReader<'_>, dims: Dims) -> Result<Option<Coord>> {
    let x = r.read_f64()?;
    let y = r.read_f64()?;
    let z = if dims.z { read_ordinate(r)? } else { None };
    let m = if dims.m { read_ordinate(r)? } else { None };
    if x.is_nan() && y.is_nan() {
        return Ok(None);
    }
    Ok(Some(Coord { x, y, z, m }))
}

fn read_point(r: &mut BinaryReader<'_>, dims: Dims) -> Result<Point> {
    Ok(read_coord(r, dims)?.map(Point::from).unwrap_or_default())
}

fn read_line_string(r: &mut BinaryReader<'_>, dims: Dims) -> Result<LineString> {
    let count = read_count(r, dims.ordinates() * 8)?;
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        points.push(read_point(r, dims)?);
    }
    LineString::new(points)
}

fn read_polygon(r: &mut BinaryReader<'_>, dims: Dims) -> Result<Polygon> {
    let count = read_count(r, 4)?;
    let mut rings = Vec::with_capacity(count);
    for _ in 0..count {
        rings.push(read_line_string(r, dims)?);
    }
    Polygon::new(rings)
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Encoder for WKB (`with_srid = false`) and EWKB (`with_srid = true`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WkbWriter {
    byte_order: ByteOrder,
    with_srid: bool,
}

impl WkbWriter {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            with_srid: false,
        }
    }

    /// EWKB writer: the root SRID, when set, is emitted after the type word.
    pub fn ewkb(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            with_srid: true,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn write(&self, geometry: &Geometry) -> Vec<u8> {
        let mut w = BinaryWriter::new(self.byte_order);
        let srid = if self.with_srid {
            geometry.srid()
        } else {
            None
        };
        self.write_geometry(&mut w, geometry, srid);
        w.into_bytes()
    }

    /// Uppercase hex rendering of [`WkbWriter::write`].
    pub fn write_hex(&self, geometry: &Geometry) -> String {
        hex::encode_upper(self.write(geometry))
    }

    fn write_header<S: Shape>(&self, w: &mut BinaryWriter, shape: &S, srid: Option<u32>) {
        w.write_u8(self.byte_order.marker());
        let code = TypeCode {
            geometry_type: shape.geometry_type(),
            has_z: shape.has_z(),
            has_m: shape.is_measured(),
            has_srid: srid.is_some(),
        };
        w.write_u32(code.encode());
        if let Some(s) = srid {
            w.write_u32(s);
        }
    }

    fn write_geometry(&self, w: &mut BinaryWriter, geometry: &Geometry, srid: Option<u32>) {
        match geometry {
            Geometry::Point(p) => self.write_point(w, p, srid),
            Geometry::LineString(ls) => self.write_line_string(w, ls, srid),
            Geometry::Polygon(p) => self.write_polygon(w, p, srid),
            Geometry::MultiPoint(mp) => {
                self.write_header(w, mp, srid);
                write_len(w, mp.len());
                mp.iter().for_each(|p| self.write_point(w, p, None));
            }
            Geometry::MultiLineString(mls) => {
                self.write_header(w, mls, srid);
                write_len(w, mls.len());
                mls.iter().for_each(|ls| self.write_line_string(w, ls, None));
            }
            Geometry::MultiPolygon(mp) => {
                self.write_header(w, mp, srid);
                write_len(w, mp.len());
                mp.iter().for_each(|p| self.write_polygon(w, p, None));
            }
            Geometry::GeometryCollection(gc) => {
                self.write_header(w, gc, srid);
                write_len(w, gc.len());
                gc.iter().for_each(|g| self.write_geometry(w, g, None));
            }
        }
    }

    fn write_point(&self, w: &mut BinaryWriter, point: &Point, srid: Option<u32>) {
        self.write_header(w, point, srid);
        match point.coord() {
            Some(c) => write_coord(w, c, Dims::of(point)),
            None => {
                w.write_f64(f64::NAN);
                w.write_f64(f64::NAN);
            }
        }
    }

    fn write_line_string(&self, w: &mut BinaryWriter, line: &LineString, srid: Option<u32>) {
        self.write_header(w, line, srid);
        write_points(w, line, Dims::of(line));
    }

    fn write_polygon(&self, w: &mut BinaryWriter, polygon: &Polygon, srid: Option<u32>) {
        self.write_header(w, polygon, srid);
        let dims = Dims::of(polygon);
        write_len(w, polygon.len());
        polygon.iter().for_each(|ring| write_points(w, ring, dims));
    }
}

fn write_len(w: &mut BinaryWriter, len: usize) {
    // Counts above u32::MAX cannot be represented on the wire.
    w.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
}

/// Missing ordinates inside a Z/M geometry are written as NaN.
fn write_coord(w: &mut BinaryWriter, c: &Coord, dims: Dims) {
    w.write_f64(c.x);
    w.write_f64(c.y);
    if dims.z {
        w.write_f64(c.z.unwrap_or(f64::NAN));
    }
    if dims.m {
        w.write_f64(c.m.unwrap_or(f64::NAN));
    }
}

fn write_points(w: &mut BinaryWriter, line: &LineString, dims: Dims) {
    write_len(w, line.num_points());
    line.coords().for_each(|c| write_coord(w, c, dims));
}

// ── Convenience entry points ──────────────────────────────────────────────────

/// Decode WKB or EWKB with the default nesting bound.
///
/// # Example
///
/// ```
/// use geowire_core::geometry::{Geometry, LineString};
/// use geowire_core::wkb::{read_wkb, write_wkb};
///
/// let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)]).unwrap().into();
/// assert_eq!(read_wkb(&write_wkb(&line)).unwrap(), line);
/// ```
pub fn read_wkb(bytes: &[u8]) -> Result<Geometry> {
    WkbReader::default().read(bytes)
}

pub fn read_wkb_hex(text: &str) -> Result<Geometry> {
    WkbReader::default().read_hex(text)
}

/// Little-endian WKB without SRID.
pub fn write_wkb(geometry: &Geometry) -> Vec<u8> {
    WkbWriter::default().write(geometry)
}

pub fn write_wkb_hex(geometry: &Geometry) -> String {
    WkbWriter::default().write_hex(geometry)
}

/// Little-endian EWKB carrying the root SRID when one is set.
pub fn write_ewkb(geometry: &Geometry) -> Vec<u8> {
    WkbWriter::ewkb(ByteOrder::LittleEndian).write(geometry)
}

pub fn write_ewkb_hex(geometry: &Geometry) -> String {
    WkbWriter::ewkb(ByteOrder::LittleEndian).write_hex(geometry)
}
