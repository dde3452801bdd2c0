//! In-memory geometry model.
//!
//! A closed sum type ([`Geometry`]) over seven concrete variants. Every
//! collection-like variant is a thin newtype over [`Collection`], which owns
//! its children and derives the Z/M flags from them once, at construction.

use std::collections::BTreeMap;
use std::fmt;

/// Delegate the [`Shape`] plumbing of a collection newtype to its inner
/// [`Collection`].
macro_rules! impl_collection_shape {
    ($ty:ident, $member:ty, $kind:expr) => {
        impl std::ops::Deref for $ty {
            type Target = $crate::geometry::Collection<$member>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl $crate::geometry::Shape for $ty {
            fn geometry_type(&self) -> $crate::geometry::GeometryType {
                $kind
            }

            fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            fn has_z(&self) -> bool {
                self.0.has_z()
            }

            fn is_measured(&self) -> bool {
                self.0.is_measured()
            }

            fn bbox(&self) -> Option<$crate::geometry::BoundingBox> {
                self.0.bbox()
            }

            fn srid(&self) -> Option<u32> {
                self.0.srid()
            }

            fn set_srid(&mut self, srid: Option<u32>) {
                self.0.set_srid(srid)
            }

            fn metadata(&self) -> &$crate::geometry::Metadata {
                self.0.metadata()
            }

            fn metadata_mut(&mut self) -> &mut $crate::geometry::Metadata {
                self.0.metadata_mut()
            }
        }
    };
}

mod bounding_box;
mod collection;
mod line_string;
mod multi;
mod point;
mod polygon;

pub use bounding_box::BoundingBox;
pub use collection::Collection;
pub use line_string::LineString;
pub use multi::{GeometryCollection, MultiLineString, MultiPoint, MultiPolygon};
pub use point::{Coord, Point};
pub use polygon::Polygon;

/// Opaque key/value pairs attached to a geometry. Core algorithms ignore it.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// SRID 0 is the conventional "unknown" and is stored as absent.
pub(crate) fn normalize_srid(srid: Option<u32>) -> Option<u32> {
    srid.filter(|s| *s != 0)
}

/// Behaviour shared by every geometry variant.
pub trait Shape {
    fn geometry_type(&self) -> GeometryType;

    /// True when the geometry holds no coordinate data.
    fn is_empty(&self) -> bool;

    fn has_z(&self) -> bool;

    fn is_measured(&self) -> bool;

    /// Planar extent, `None` for empty geometries.
    fn bbox(&self) -> Option<BoundingBox>;

    fn srid(&self) -> Option<u32>;

    fn set_srid(&mut self, srid: Option<u32>);

    /// Opaque caller data. Equality and the binary codecs ignore it, except
    /// for the TWKB ID list (see [`crate::twkb::TWKB_IDS_KEY`]).
    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;
}

/// Geometry kinds, numbered with their WKB/TWKB type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Map a base type code (1..=7) back to its kind.
    ///
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::GeometryType;
    ///
    /// assert_eq!(GeometryType::from_code(3), Some(GeometryType::Polygon));
    /// assert_eq!(GeometryType::from_code(8), None);
    /// ```
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Point),
            2 => Some(Self::LineString),
            3 => Some(Self::Polygon),
            4 => Some(Self::MultiPoint),
            5 => Some(Self::MultiLineString),
            6 => Some(Self::MultiPolygon),
            7 => Some(Self::GeometryCollection),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any geometry value.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
}

macro_rules! dispatch {
    ($value:expr, $g:ident => $body:expr) => {
        match $value {
            Geometry::Point($g) => $body,
            Geometry::LineString($g) => $body,
            Geometry::Polygon($g) => $body,
            Geometry::MultiPoint($g) => $body,
            Geometry::MultiLineString($g) => $body,
            Geometry::MultiPolygon($g) => $body,
            Geometry::GeometryCollection($g) => $body,
        }
    };
}

impl Shape for Geometry {
    fn geometry_type(&self) -> GeometryType {
        dispatch!(self, g => g.geometry_type())
    }

    fn is_empty(&self) -> bool {
        dispatch!(self, g => Shape::is_empty(g))
    }

    fn has_z(&self) -> bool {
        dispatch!(self, g => Shape::has_z(g))
    }

    fn is_measured(&self) -> bool {
        dispatch!(self, g => Shape::is_measured(g))
    }

    fn bbox(&self) -> Option<BoundingBox> {
        dispatch!(self, g => Shape::bbox(g))
    }

    fn srid(&self) -> Option<u32> {
        dispatch!(self, g => Shape::srid(g))
    }

    fn set_srid(&mut self, srid: Option<u32>) {
        dispatch!(self, g => Shape::set_srid(g, srid))
    }

    fn metadata(&self) -> &Metadata {
        dispatch!(self, g => Shape::metadata(g))
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        dispatch!(self, g => Shape::metadata_mut(g))
    }
}

impl Geometry {
    /// Every point of the geometry in storage order, rings and members included.
    pub fn points(&self) -> Vec<&Point> {
        let mut out = Vec::new();
        self.collect_points(&mut out);
        out
    }

    fn collect_points<'a>(&'a self, out: &mut Vec<&'a Point>) {
        match self {
            Geometry::Point(p) => {
                if !p.is_empty() {
                    out.push(p);
                }
            }
            Geometry::LineString(ls) => out.extend(ls.iter()),
            Geometry::Polygon(poly) => poly.iter().for_each(|r| out.extend(r.iter())),
            Geometry::MultiPoint(mp) => out.extend(mp.iter()),
            Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| out.extend(ls.iter())),
            Geometry::MultiPolygon(mp) => mp
                .iter()
                .flat_map(|poly| poly.iter())
                .for_each(|r| out.extend(r.iter())),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| g.collect_points(out)),
        }
    }

    pub fn num_points(&self) -> usize {
        self.points().len()
    }

    /// Topological dimension: 0 for points, 1 for lines, 2 for surfaces.
    pub fn dimension(&self) -> u8 {
        crate::functions::accessors::dimension(self)
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line_string(&self) -> Option<&LineString> {
        match self {
            Geometry::LineString(ls) => Some(ls),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Geometry::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_multi_point(&self) -> Option<&MultiPoint> {
        match self {
            Geometry::MultiPoint(mp) => Some(mp),
            _ => None,
        }
    }

    pub fn as_multi_line_string(&self) -> Option<&MultiLineString> {
        match self {
            Geometry::MultiLineString(mls) => Some(mls),
            _ => None,
        }
    }

    pub fn as_multi_polygon(&self) -> Option<&MultiPolygon> {
        match self {
            Geometry::MultiPolygon(mp) => Some(mp),
            _ => None,
        }
    }

    pub fn as_geometry_collection(&self) -> Option<&GeometryCollection> {
        match self {
            Geometry::GeometryCollection(gc) => Some(gc),
            _ => None,
        }
    }

    /// Empty geometry of the given kind.
    pub fn empty(kind: GeometryType) -> Self {
        match kind {
            GeometryType::Point => Point::empty().into(),
            GeometryType::LineString => LineString::empty().into(),
            GeometryType::Polygon => Polygon::empty().into(),
            GeometryType::MultiPoint => MultiPoint::empty().into(),
            GeometryType::MultiLineString => MultiLineString::empty().into(),
            GeometryType::MultiPolygon => MultiPolygon::empty().into(),
            GeometryType::GeometryCollection => GeometryCollection::empty().into(),
        }
    }

    /// Builder-style SRID assignment for the root geometry.
    pub fn with_srid(mut self, srid: Option<u32>) -> Self {
        self.set_srid(srid);
        self
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Geometry {
                fn from(g: $variant) -> Self {
                    Geometry::$variant(g)
                }
            }
        )*
    };
}

impl_from_variant!(
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection
);

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_exterior(
            LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn type_codes_round_trip() {
        for code in 1..=7 {
            let kind = GeometryType::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(GeometryType::from_code(0), None);
        assert_eq!(GeometryType::MultiPolygon.to_string(), "MultiPolygon");
    }

    #[test]
    fn points_flatten_rings_and_members() {
        let gc = GeometryCollection::new(vec![
            Point::new(9.0, 9.0).into(),
            square().into(),
        ])
        .unwrap();
        let g = Geometry::from(gc);
        assert_eq!(g.num_points(), 6);
        assert_eq!(g.points()[0], &Point::new(9.0, 9.0));
    }

    #[test]
    fn empty_constructors_are_empty() {
        for code in 1..=7 {
            let kind = GeometryType::from_code(code).unwrap();
            let g = Geometry::empty(kind);
            assert!(g.is_empty());
            assert_eq!(g.geometry_type(), kind);
            assert!(g.bbox().is_none());
        }
    }

    #[test]
    fn srid_is_set_on_root_only() {
        let g = Geometry::from(
            MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap(),
        )
        .with_srid(Some(4326));
        assert_eq!(g.srid(), Some(4326));
        let mp = g.as_multi_point().unwrap();
        assert!(mp.iter().all(|p| p.srid().is_none()));
    }

    #[test]
    fn collection_flags_from_nested_members() {
        let gc = GeometryCollection::new(vec![
            Point::new(0.0, 0.0).into(),
            MultiPoint::new(vec![Point::new_z(1.0, 1.0, 1.0)]).unwrap().into(),
        ])
        .unwrap();
        assert!(gc.has_z());
        assert!(!gc.is_measured());
    }
}
