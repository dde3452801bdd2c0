#![doc = include_str!("../../README.md")]
//! Crate-specific API surface for `geowire-core`.

pub mod binary;
pub mod engine;
pub mod error;
pub mod functions;
pub mod geometry;
pub mod twkb;
pub mod wkb;

pub use engine::{EngineConfig, Kernel};
pub use error::{GeometryError, Result};
pub use geometry::{
    BoundingBox, Coord, Geometry, GeometryCollection, GeometryType, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon, Shape,
};
