use super::{Collection, Geometry, GeometryType, LineString, Point, Polygon};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPoint(Collection<Point>);

impl_collection_shape!(MultiPoint, Point, GeometryType::MultiPoint);

impl MultiPoint {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        Ok(Self(Collection::new(points)?))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiLineString(Collection<LineString>);

impl_collection_shape!(MultiLineString, LineString, GeometryType::MultiLineString);

impl MultiLineString {
    pub fn new(lines: Vec<LineString>) -> Result<Self> {
        Ok(Self(Collection::new(lines)?))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPolygon(Collection<Polygon>);

impl_collection_shape!(MultiPolygon, Polygon, GeometryType::MultiPolygon);

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Result<Self> {
        Ok(Self(Collection::new(polygons)?))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Heterogeneous collection; may nest multi-geometries and other collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCollection(Collection<Geometry>);

impl_collection_shape!(GeometryCollection, Geometry, GeometryType::GeometryCollection);

impl GeometryCollection {
    pub fn new(geometries: Vec<Geometry>) -> Result<Self> {
        Ok(Self(Collection::new(geometries)?))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}
