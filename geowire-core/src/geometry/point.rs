use super::{normalize_srid, BoundingBox, GeometryType, Metadata, Shape};
use crate::error::{GeometryError, Result};

/// A single position: X and Y are always present, Z and M independently optional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub const fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    /// Planar equality; Z and M are ignored.
    pub fn same_xy(&self, other: &Coord) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// 0-dimensional geometry. A point without a coordinate is the empty point.
#[derive(Debug, Clone, Default)]
pub struct Point {
    coord: Option<Coord>,
    srid: Option<u32>,
    metadata: Metadata,
}

impl Point {
    /// Build a 2D point.
    ///
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::{Point, Shape};
    ///
    /// let p = Point::new(1.0, 2.0);
    /// assert_eq!(p.x(), Some(1.0));
    /// assert!(!p.has_z());
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self::from_coord(Coord::xy(x, y))
    }

    pub fn new_z(x: f64, y: f64, z: f64) -> Self {
        Self::from_coord(Coord {
            x,
            y,
            z: Some(z),
            m: None,
        })
    }

    pub fn new_m(x: f64, y: f64, m: f64) -> Self {
        Self::from_coord(Coord {
            x,
            y,
            z: None,
            m: Some(m),
        })
    }

    pub fn new_zm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self::from_coord(Coord {
            x,
            y,
            z: Some(z),
            m: Some(m),
        })
    }

    pub fn from_coord(coord: Coord) -> Self {
        Self {
            coord: Some(coord),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a point from loose ordinates, enforcing that X and Y are given
    /// together and that Z/M never appear on an empty point.
    ///
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::Point;
    ///
    /// assert!(Point::from_ordinates(None, None, None, None).unwrap().coord().is_none());
    /// assert!(Point::from_ordinates(Some(1.0), None, None, None).is_err());
    /// ```
    pub fn from_ordinates(
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        m: Option<f64>,
    ) -> Result<Self> {
        match (x, y) {
            (Some(x), Some(y)) => Ok(Self::from_coord(Coord { x, y, z, m })),
            (None, None) if z.is_none() && m.is_none() => Ok(Self::empty()),
            (None, None) => Err(GeometryError::invalid(
                "empty point cannot carry Z or M ordinates",
            )),
            _ => Err(GeometryError::invalid(
                "point needs both X and Y, or neither",
            )),
        }
    }

    pub fn coord(&self) -> Option<&Coord> {
        self.coord.as_ref()
    }

    pub fn x(&self) -> Option<f64> {
        self.coord.map(|c| c.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.coord.map(|c| c.y)
    }

    pub fn z(&self) -> Option<f64> {
        self.coord.and_then(|c| c.z)
    }

    pub fn m(&self) -> Option<f64> {
        self.coord.and_then(|c| c.m)
    }

    /// Planar equality of two points; two empty points are equal.
    pub fn equals_xy(&self, other: &Point) -> bool {
        match (&self.coord, &other.coord) {
            (Some(a), Some(b)) => a.same_xy(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Coordinate and SRID; metadata does not take part.
impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord && self.srid == other.srid
    }
}

impl From<Coord> for Point {
    fn from(coord: Coord) -> Self {
        Self::from_coord(coord)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Shape for Point {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Point
    }

    fn is_empty(&self) -> bool {
        self.coord.is_none()
    }

    fn has_z(&self) -> bool {
        self.z().is_some()
    }

    fn is_measured(&self) -> bool {
        self.m().is_some()
    }

    fn bbox(&self) -> Option<BoundingBox> {
        self.coord.as_ref().map(BoundingBox::from_coord)
    }

    fn srid(&self) -> Option<u32> {
        self.srid
    }

    fn set_srid(&mut self, srid: Option<u32>) {
        self.srid = normalize_srid(srid);
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
