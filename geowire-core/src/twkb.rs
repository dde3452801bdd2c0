//! TWKB (Tiny Well-Known Binary) codec.
//!
//! Layout of one geometry:
//!   [type_and_precision u8]  low nibble: type code 1..=7,
//!                            high nibble: zig-zag XY decimal precision
//!   [metadata u8]            0x01 bbox, 0x02 size, 0x04 id list,
//!                            0x08 extended precision, 0x10 empty
//!   [extended u8]            0x01 Z, 0x02 M, bits 2..4 Z precision,
//!                            bits 5..7 M precision (only if flagged)
//!   [size uvarint]           byte length of bbox + body (only if flagged)
//!   [bbox svarint*]          (min, max - min) per axis (only if flagged)
//!   [body]
//!
//! Coordinates are scaled by `10^precision`, rounded, and written as signed
//! varint deltas from the previous coordinate of the same geometry. The delta
//! state runs across rings and multi-geometry members; members of a
//! GeometryCollection are complete TWKB geometries with their own header.

use crate::binary::{zigzag_decode, zigzag_encode, BinaryReader, BinaryWriter, ByteOrder};
use crate::error::{GeometryError, Result};
use crate::geometry::{
    Coord, Geometry, GeometryCollection, GeometryType, LineString, Metadata, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon, Shape,
};
use crate::wkb::DEFAULT_MAX_DEPTH;

pub const TWKB_HAS_BBOX: u8 = 0x01;
pub const TWKB_HAS_SIZE: u8 = 0x02;
pub const TWKB_HAS_IDS: u8 = 0x04;
pub const TWKB_HAS_EXTENDED_PRECISION: u8 = 0x08;
pub const TWKB_IS_EMPTY: u8 = 0x10;

/// Metadata key holding a multi-geometry's TWKB ID list (JSON array of integers).
pub const TWKB_IDS_KEY: &str = "twkb_ids";

/// Largest scaled magnitude that stays an exact integer and cannot overflow a delta.
const MAX_SCALED: f64 = 9_007_199_254_740_992.0;

/// Encoder settings. Precision is the number of decimal digits kept per axis;
/// negative XY precision rounds to tens, hundreds, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwkbOptions {
    pub precision_xy: i8,
    pub precision_z: u8,
    pub precision_m: u8,
    pub include_size: bool,
    pub include_bbox: bool,
}

impl Default for TwkbOptions {
    fn default() -> Self {
        Self {
            precision_xy: 5,
            precision_z: 0,
            precision_m: 0,
            include_size: false,
            include_bbox: false,
        }
    }
}

impl TwkbOptions {
    pub fn with_precision(precision_xy: i8) -> Self {
        Self {
            precision_xy,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(-8..=7).contains(&self.precision_xy) {
            return Err(GeometryError::unsupported(format!(
                "TWKB XY precision {} outside -8..=7",
                self.precision_xy
            )));
        }
        if self.precision_z > 7 || self.precision_m > 7 {
            return Err(GeometryError::unsupported(format!(
                "TWKB Z/M precision ({}, {}) outside 0..=7",
                self.precision_z, self.precision_m
            )));
        }
        Ok(())
    }
}

/// Decoded TWKB header of a single geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwkbHeader {
    pub geometry_type: GeometryType,
    pub precision_xy: i8,
    pub precision_z: u8,
    pub precision_m: u8,
    pub has_z: bool,
    pub has_m: bool,
    pub has_bbox: bool,
    pub has_ids: bool,
    pub is_empty: bool,
    pub size: Option<u64>,
}

impl TwkbHeader {
    fn read(r: &mut BinaryReader<'_>) -> Result<Self> {
        let type_and_precision = r.read_u8()?;
        let code = u32::from(type_and_precision & 0x0F);
        let geometry_type = GeometryType::from_code(code)
            .ok_or_else(|| GeometryError::unsupported(format!("unknown TWKB type {code}")))?;
        let precision_xy = zigzag_decode(u64::from(type_and_precision >> 4)) as i8;

        let metadata = r.read_u8()?;
        let (mut has_z, mut has_m, mut precision_z, mut precision_m) = (false, false, 0, 0);
        if metadata & TWKB_HAS_EXTENDED_PRECISION != 0 {
            let ext = r.read_u8()?;
            has_z = ext & 0x01 != 0;
            has_m = ext & 0x02 != 0;
            precision_z = (ext >> 2) & 0x07;
            precision_m = (ext >> 5) & 0x07;
        }
        let size = if metadata & TWKB_HAS_SIZE != 0 {
            Some(r.read_uvarint()?)
        } else {
            None
        };
        Ok(Self {
            geometry_type,
            precision_xy,
            precision_z,
            precision_m,
            has_z,
            has_m,
            has_bbox: metadata & TWKB_HAS_BBOX != 0,
            has_ids: metadata & TWKB_HAS_IDS != 0,
            is_empty: metadata & TWKB_IS_EMPTY != 0,
            size,
        })
    }

    fn dims(&self) -> Dims {
        Dims {
            z: self.has_z,
            m: self.has_m,
        }
    }

    fn scale(&self) -> Scale {
        Scale::new(self.precision_xy, self.precision_z, self.precision_m)
    }
}

/// Peek at the header of a TWKB blob.
///
/// # Example
///
/// ```
/// use geowire_core::geometry::{Geometry, GeometryType, Point};
/// use geowire_core::twkb::{parse_twkb_header, write_twkb, TwkbOptions};
///
/// let blob = write_twkb(&Point::new_z(1.0, 2.0, 3.0).into(), &TwkbOptions::with_precision(2)).unwrap();
/// let hdr = parse_twkb_header(&blob).unwrap();
/// assert_eq!(hdr.geometry_type, GeometryType::Point);
/// assert_eq!(hdr.precision_xy, 2);
/// assert!(hdr.has_z);
/// ```
pub fn parse_twkb_header(bytes: &[u8]) -> Result<TwkbHeader> {
    TwkbHeader::read(&mut BinaryReader::new(bytes, ByteOrder::LittleEndian))
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

    fn axes(self) -> usize {
        2 + usize::from(self.z) + usize::from(self.m)
    }

    fn any(self) -> bool {
        self.z || self.m
    }
}

/// Per-axis decimal precision, one value per geometry.
#[derive(Debug, Clone, Copy)]
struct Scale {
    xy: i32,
    z: i32,
    m: i32,
}

impl Scale {
    fn new(xy: i8, z: u8, m: u8) -> Self {
        Self {
            xy: i32::from(xy),
            z: i32::from(z),
            m: i32::from(m),
        }
    }

    fn precision(&self, axis: usize) -> i32 {
        match axis {
            0 | 1 => self.xy,
            2 => self.z,
            _ => self.m,
        }
    }

    fn to_int(&self, axis: usize, value: f64) -> Result<i64> {
        let p = self.precision(axis);
        let scaled = if p >= 0 {
            value * 10f64.powi(p)
        } else {
            value / 10f64.powi(-p)
        }
        .round();
        if !scaled.is_finite() || scaled.abs() > MAX_SCALED {
            return Err(GeometryError::unsupported(format!(
                "coordinate {value} cannot be encoded at precision {p}"
            )));
        }
        Ok(scaled as i64)
    }

    fn to_float(&self, axis: usize, value: i64) -> f64 {
        let p = self.precision(axis);
        if p >= 0 {
            value as f64 / 10f64.powi(p)
        } else {
            value as f64 * 10f64.powi(-p)
        }
    }
}

/// Axis slots in delta state: x, y, z, m.
fn active_axes(dims: Dims) -> impl Iterator<Item = usize> {
    [Some(0), Some(1), dims.z.then_some(2), dims.m.then_some(3)]
        .into_iter()
        .flatten()
}

fn coord_values(c: &Coord) -> [f64; 4] {
    // TWKB has no null ordinate: a missing Z/M inside a Z/M geometry is 0.
    [c.x, c.y, c.z.unwrap_or(0.0), c.m.unwrap_or(0.0)]
}

// ── Writer ────────────────────────────────────────────────────────────────────

struct DeltaEncoder {
    last: [i64; 4],
    dims: Dims,
    scale: Scale,
}

impl DeltaEncoder {
    fn new(dims: Dims, scale: Scale) -> Self {
        Self {
            last: [0; 4],
            dims,
            scale,
        }
    }

    fn write_coord(&mut self, w: &mut BinaryWriter, c: &Coord) -> Result<()> {
        let values = coord_values(c);
        for axis in active_axes(self.dims) {
            let v = self.scale.to_int(axis, values[axis])?;
            w.write_svarint(v - self.last[axis]);
            self.last[axis] = v;
        }
        Ok(())
    }

    fn write_line(&mut self, w: &mut BinaryWriter, line: &LineString) -> Result<()> {
        w.write_uvarint(line.num_points() as u64);
        for c in line.coords() {
            self.write_coord(w, c)?;
        }
        Ok(())
    }

    fn write_polygon(&mut self, w: &mut BinaryWriter, polygon: &Polygon) -> Result<()> {
        w.write_uvarint(polygon.len() as u64);
        for ring in polygon.iter() {
            self.write_line(w, ring)?;
        }
        Ok(())
    }
}

/// Encoder with fixed [`TwkbOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TwkbWriter {
    options: TwkbOptions,
}

impl TwkbWriter {
    pub fn new(options: TwkbOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TwkbOptions {
        &self.options
    }

    pub fn write(&self, geometry: &Geometry) -> Result<Vec<u8>> {
        self.options.validate()?;
        let mut w = BinaryWriter::default();
        self.write_geometry(&mut w, geometry)?;
        Ok(w.into_bytes())
    }

    /// Uppercase hex rendering of [`TwkbWriter::write`].
    pub fn write_hex(&self, geometry: &Geometry) -> Result<String> {
        Ok(hex::encode_upper(self.write(geometry)?))
    }

    fn write_geometry(&self, w: &mut BinaryWriter, geometry: &Geometry) -> Result<()> {
        let opts = &self.options;
        let dims = Dims::of(geometry);
        let scale = Scale::new(opts.precision_xy, opts.precision_z, opts.precision_m);

        let type_and_precision = geometry.geometry_type().code() as u8
            | ((zigzag_encode(i64::from(opts.precision_xy)) as u8) << 4);
        let mut metadata = 0u8;
        if dims.any() {
            metadata |= TWKB_HAS_EXTENDED_PRECISION;
        }

        if geometry.is_empty() {
            w.write_u8(type_and_precision);
            w.write_u8(metadata | TWKB_IS_EMPTY);
            if dims.any() {
                w.write_u8(self.extended_precision(dims));
            }
            return Ok(());
        }

        let ids = member_ids(geometry);
        if ids.is_some() {
            metadata |= TWKB_HAS_IDS;
        }
        if opts.include_size {
            metadata |= TWKB_HAS_SIZE;
        }
        if opts.include_bbox {
            metadata |= TWKB_HAS_BBOX;
        }

        let mut body = BinaryWriter::default();
        if opts.include_bbox {
            write_bbox(&mut body, geometry, dims, scale)?;
        }
        self.write_body(&mut body, geometry, dims, scale, ids.as_deref())?;

        w.write_u8(type_and_precision);
        w.write_u8(metadata);
        if dims.any() {
            w.write_u8(self.extended_precision(dims));
        }
        if opts.include_size {
            w.write_uvarint(body.len() as u64);
        }
        w.write_bytes(body.as_bytes());
        Ok(())
    }

    fn extended_precision(&self, dims: Dims) -> u8 {
        let mut ext = 0u8;
        if dims.z {
            ext |= 0x01 | ((self.options.precision_z & 0x07) << 2);
        }
        if dims.m {
            ext |= 0x02 | ((self.options.precision_m & 0x07) << 5);
        }
        ext
    }

    fn write_body(
        &self,
        w: &mut BinaryWriter,
        geometry: &Geometry,
        dims: Dims,
        scale: Scale,
        ids: Option<&[i64]>,
    ) -> Result<()> {
        let mut enc = DeltaEncoder::new(dims, scale);
        match geometry {
            Geometry::Point(p) => match p.coord() {
                Some(c) => enc.write_coord(w, c),
                None => Ok(()),
            },
            Geometry::LineString(ls) => enc.write_line(w, ls),
            Geometry::Polygon(p) => enc.write_polygon(w, p),
            Geometry::MultiPoint(mp) => {
                write_member_count(w, mp.len(), ids);
                mp.iter()
                    .filter_map(Point::coord)
                    .try_for_each(|c| enc.write_coord(w, c))
            }
            Geometry::MultiLineString(mls) => {
                write_member_count(w, mls.len(), ids);
                mls.iter().try_for_each(|ls| enc.write_line(w, ls))
            }
            Geometry::MultiPolygon(mp) => {
                write_member_count(w, mp.len(), ids);
                mp.iter().try_for_each(|p| enc.write_polygon(w, p))
            }
            Geometry::GeometryCollection(gc) => {
                write_member_count(w, gc.len(), ids);
                gc.iter().try_for_each(|g| self.write_geometry(w, g))
            }
        }
    }
}

fn write_member_count(w: &mut BinaryWriter, count: usize, ids: Option<&[i64]>) {
    w.write_uvarint(count as u64);
    if let Some(ids) = ids {
        ids.iter().for_each(|id| w.write_svarint(*id));
    }
}

/// ID list from metadata, used only when it matches the member count.
fn member_ids(geometry: &Geometry) -> Option<Vec<i64>> {
    let count = match geometry {
        Geometry::MultiPoint(g) => g.len(),
        Geometry::MultiLineString(g) => g.len(),
        Geometry::MultiPolygon(g) => g.len(),
        Geometry::GeometryCollection(g) => g.len(),
        _ => return None,
    };
    let ids = geometry
        .metadata()
        .get(TWKB_IDS_KEY)?
        .as_array()?
        .iter()
        .map(serde_json::Value::as_i64)
        .collect::<Option<Vec<_>>>()?;
    (ids.len() == count).then_some(ids)
}

fn write_bbox(w: &mut BinaryWriter, geometry: &Geometry, dims: Dims, scale: Scale) -> Result<()> {
    let mut bounds: [Option<(i64, i64)>; 4] = [None; 4];
    for point in geometry.points() {
        let Some(c) = point.coord() else { continue };
        let values = coord_values(c);
        for axis in active_axes(dims) {
            let v = scale.to_int(axis, values[axis])?;
            bounds[axis] = Some(match bounds[axis] {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    for axis in active_axes(dims) {
        let (lo, hi) = bounds[axis].unwrap_or((0, 0));
        w.write_svarint(lo);
        w.write_svarint(hi - lo);
    }
    Ok(())
}

// ── Reader ────────────────────────────────────────────────────────────────────

struct DeltaDecoder {
    last: [i64; 4],
    dims: Dims,
    scale: Scale,
}

impl DeltaDecoder {
    fn new(header: &TwkbHeader) -> Self {
        Self {
            last: [0; 4],
            dims: header.dims(),
            scale: header.scale(),
        }
    }

    fn read_coord(&mut self, r: &mut BinaryReader<'_>) -> Result<Coord> {
        let mut values = [0.0f64; 4];
        for axis in active_axes(self.dims) {
            let delta = r.read_svarint()?;
            self.last[axis] = self.last[axis].wrapping_add(delta);
            values[axis] = self.scale.to_float(axis, self.last[axis]);
        }
        Ok(Coord {
            x: values[0],
            y: values[1],
            z: self.dims.z.then_some(values[2]),
            m: self.dims.m.then_some(values[3]),
        })
    }

    fn read_points(&mut self, r: &mut BinaryReader<'_>) -> Result<Vec<Point>> {
        let count = read_count(r, self.dims.axes())?;
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(Point::from(self.read_coord(r)?));
        }
        Ok(points)
    }

    fn read_line(&mut self, r: &mut BinaryReader<'_>) -> Result<LineString> {
        LineString::new(self.read_points(r)?)
    }

    /// Rings that do not end where they start get a synthesized closing point.
    fn read_polygon(&mut self, r: &mut BinaryReader<'_>) -> Result<Polygon> {
        let count = read_count(r, 1)?;
        let mut rings = Vec::with_capacity(count);
        for _ in 0..count {
            let mut points = self.read_points(r)?;
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if !first.equals_xy(last) {
                    points.push(first.clone());
                }
            }
            rings.push(LineString::new(points)?);
        }
        Polygon::new(rings)
    }
}

fn read_count(r: &mut BinaryReader<'_>, min_item_bytes: usize) -> Result<usize> {
    let count = r.read_uvarint()?;
    let needed = usize::try_from(count)
        .unwrap_or(usize::MAX)
        .saturating_mul(min_item_bytes);
    if needed > r.remaining() {
        return Err(GeometryError::TruncatedData {
            offset: r.position(),
            needed,
            available: r.remaining(),
        });
    }
    Ok(count as usize)
}

fn read_ids(r: &mut BinaryReader<'_>, count: usize) -> Result<serde_json::Value> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(serde_json::Value::from(r.read_svarint()?));
    }
    Ok(serde_json::Value::Array(ids))
}

/// Decoder with a bound on GeometryCollection nesting.
#[derive(Debug, Clone, Copy)]
pub struct TwkbReader {
    max_depth: usize,
}

impl Default for TwkbReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl TwkbReader {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

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
        let header = TwkbHeader::read(r)?;
        if let Some(size) = header.size {
            let size = usize::try_from(size).unwrap_or(usize::MAX);
            if size > r.remaining() {
                return Err(GeometryError::TruncatedData {
                    offset: r.position(),
                    needed: size,
                    available: r.remaining(),
                });
            }
        }
        if header.is_empty {
            return Ok(Geometry::empty(header.geometry_type));
        }
        if header.has_bbox {
            // The box is derivable from the body; it is validated for length only.
            for _ in 0..header.dims().axes() * 2 {
                r.read_svarint()?;
            }
        }

        let mut dec = DeltaDecoder::new(&header);
        let mut ids = None;
        let geometry: Geometry = match header.geometry_type {
            GeometryType::Point => Point::from(dec.read_coord(r)?).into(),
            GeometryType::LineString => dec.read_line(r)?.into(),
            GeometryType::Polygon => dec.read_polygon(r)?.into(),
            GeometryType::MultiPoint => {
                let count = self.read_member_header(r, &header, header.dims().axes(), &mut ids)?;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    points.push(Point::from(dec.read_coord(r)?));
                }
                MultiPoint::new(points)?.into()
            }
            GeometryType::MultiLineString => {
                let count = self.read_member_header(r, &header, 1, &mut ids)?;
                let mut lines = Vec::with_capacity(count);
                for _ in 0..count {
                    lines.push(dec.read_line(r)?);
                }
                MultiLineString::new(lines)?.into()
            }
            GeometryType::MultiPolygon => {
                let count = self.read_member_header(r, &header, 1, &mut ids)?;
                let mut polygons = Vec::with_capacity(count);
                for _ in 0..count {
                    polygons.push(dec.read_polygon(r)?);
                }
                MultiPolygon::new(polygons)?.into()
            }
            GeometryType::GeometryCollection => {
                let count = self.read_member_header(r, &header, 2, &mut ids)?;
                let mut members = Vec::with_capacity(count);
                for _ in 0..count {
                    members.push(self.read_geometry(r, depth + 1)?);
                }
                GeometryCollection::new(members)?.into()
            }
        };
        Ok(attach_ids(geometry, ids))
    }

    fn read_member_header(
        &self,
        r: &mut BinaryReader<'_>,
        header: &TwkbHeader,
        min_member_bytes: usize,
        ids: &mut Option<serde_json::Value>,
    ) -> Result<usize> {
        let count = read_count(r, min_member_bytes)?;
        if header.has_ids {
            *ids = Some(read_ids(r, count)?);
        }
        Ok(count)
    }
}

fn attach_ids(mut geometry: Geometry, ids: Option<serde_json::Value>) -> Geometry {
    if let Some(ids) = ids {
        let metadata: &mut Metadata = geometry.metadata_mut();
        metadata.insert(TWKB_IDS_KEY.to_string(), ids);
    }
    geometry
}

// ── Convenience entry points ──────────────────────────────────────────────────

/// Encode with the given options.
///
/// # Example
///
/// ```
/// use geowire_core::geometry::{Geometry, LineString};
/// use geowire_core::twkb::{read_twkb, write_twkb, TwkbOptions};
///
/// let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]).unwrap().into();
/// let blob = write_twkb(&line, &TwkbOptions::with_precision(0)).unwrap();
/// assert_eq!(blob, vec![0x02, 0x00, 0x03, 0x00, 0x00, 0x02, 0x02, 0x00, 0x01]);
/// assert_eq!(read_twkb(&blob).unwrap(), line);
/// ```
pub fn write_twkb(geometry: &Geometry, options: &TwkbOptions) -> Result<Vec<u8>> {
    TwkbWriter::new(*options).write(geometry)
}

pub fn write_twkb_hex(geometry: &Geometry, options: &TwkbOptions) -> Result<String> {
    TwkbWriter::new(*options).write_hex(geometry)
}

pub fn read_twkb(bytes: &[u8]) -> Result<Geometry> {
    TwkbReader::default().read(bytes)
}

pub fn read_twkb_hex(text: &str) -> Result<Geometry> {
    TwkbReader::default().read_hex(text)
}
