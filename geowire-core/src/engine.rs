//! Bridge to the external computational-geometry engine.
//!
//! The engine is the [`geo`] crate. It never touches the in-memory tree:
//! geometries cross over as WKB (decoded into `geo` types by `geozero`) and
//! results come back through the WKB reader, so every invariant of the model
//! is re-checked on the way in. The crossing is XY only.
//!
//! Whether the engine may be used is an explicit [`EngineConfig`] carried by
//! each [`Kernel`], never process-wide state, so native and delegated paths
//! can be exercised side by side.

use geo::{Area, Centroid};
use geozero::wkb::Ewkb;
use geozero::{CoordDimensions, ToGeo, ToWkb};
use log::debug;

use crate::binary::ByteOrder;
use crate::error::{GeometryError, Result};
use crate::functions::measurement;
use crate::geometry::{Geometry, GeometryType, Point, Shape};
use crate::wkb::{WkbReader, WkbWriter};

/// Capability flags handed to a [`Kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine_available: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_available: true,
        }
    }
}

impl EngineConfig {
    /// Native kernel only; engine-only operations fail.
    pub const fn native() -> Self {
        Self {
            engine_available: false,
        }
    }
}

/// Entry point for operations that may be delegated to the engine.
///
/// # Example
///
/// ```
/// use geowire_core::engine::{EngineConfig, Kernel};
/// use geowire_core::geometry::{Geometry, LineString, Polygon};
///
/// let shell = LineString::from_xy(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]).unwrap();
/// let square: Geometry = Polygon::from_exterior(shell).unwrap().into();
///
/// let mut kernel = Kernel::new(EngineConfig::default());
/// let delegated = kernel.area(&square).unwrap();
/// kernel.set_engine_available(false);
/// assert_eq!(kernel.area(&square).unwrap(), delegated);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Kernel {
    config: EngineConfig,
}

impl Kernel {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn native() -> Self {
        Self::new(EngineConfig::native())
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn engine_available(&self) -> bool {
        self.config.engine_available
    }

    /// Flip engine use for this kernel only.
    pub fn set_engine_available(&mut self, available: bool) {
        self.config.engine_available = available;
    }

    /// Fail with [`GeometryError::UnsupportedGeometry`] unless the engine may be used.
    pub fn require_engine(&self, operation: &str) -> Result<()> {
        if self.engine_available() {
            Ok(())
        } else {
            Err(GeometryError::unsupported(format!(
                "{operation} requires the geometry engine, which is disabled"
            )))
        }
    }

    /// Planar area; delegated when the engine is available.
    pub fn area(&self, geometry: &Geometry) -> Result<f64> {
        if !self.engine_available() || geometry.is_empty() {
            debug!("area: native kernel");
            return Ok(measurement::area(geometry));
        }
        debug!("area: delegated to engine");
        Ok(to_engine(geometry)?.unsigned_area())
    }

    /// 2-D centroid carrying the input SRID; delegated when the engine is available.
    pub fn centroid(&self, geometry: &Geometry) -> Result<Option<Point>> {
        if !self.engine_available() || geometry.is_empty() {
            debug!("centroid: native kernel");
            return Ok(measurement::centroid(geometry));
        }
        debug!("centroid: delegated to engine");
        let Some(c) = to_engine(geometry)?.centroid() else {
            return Ok(None);
        };
        let mut point = Point::new(c.x(), c.y());
        point.set_srid(geometry.srid());
        Ok(Some(point))
    }
}

/// Hand a non-empty geometry to the engine as XY.
pub(crate) fn to_engine(geometry: &Geometry) -> Result<geo::Geometry<f64>> {
    let wkb = WkbWriter::new(ByteOrder::LittleEndian).write(geometry);
    Ok(Ewkb(wkb.as_slice()).to_geo()?)
}

/// Bring an engine result back into the model.
///
/// The engine represents empty polygons as polygons with an empty exterior;
/// those become empty model geometries instead of invalid rings.
pub(crate) fn from_engine(geometry: geo::Geometry<f64>) -> Result<Geometry> {
    let geometry = match geometry {
        geo::Geometry::Polygon(p) if p.exterior().0.is_empty() => {
            return Ok(Geometry::empty(GeometryType::Polygon));
        }
        geo::Geometry::MultiPolygon(mp) => {
            let polygons: Vec<_> = mp
                .0
                .into_iter()
                .filter(|p| !p.exterior().0.is_empty())
                .collect();
            if polygons.is_empty() {
                return Ok(Geometry::empty(GeometryType::MultiPolygon));
            }
            geo::Geometry::MultiPolygon(geo::MultiPolygon::new(polygons))
        }
        other => other,
    };
    let wkb = geometry.to_wkb(CoordDimensions::xy())?;
    WkbReader::default().read(&wkb)
}
