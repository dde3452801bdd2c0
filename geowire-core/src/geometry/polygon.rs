use super::{Collection, GeometryType, LineString};
use crate::error::{GeometryError, Result};

/// Closed rings: ring 0 is the exterior, the rest are holes.
///
/// Every ring holds at least four points and ends where it starts. Holes are
/// expected to lie inside the exterior but this is not checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon(Collection<LineString>);

impl_collection_shape!(Polygon, LineString, GeometryType::Polygon);

impl Polygon {
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::{LineString, Polygon};
    ///
    /// let shell = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]).unwrap();
    /// assert!(Polygon::new(vec![shell]).is_ok());
    ///
    /// let triangle_open = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]).unwrap();
    /// assert!(Polygon::new(vec![triangle_open]).is_err());
    /// ```
    pub fn new(rings: Vec<LineString>) -> Result<Self> {
        for (index, ring) in rings.iter().enumerate() {
            if ring.num_points() < 4 {
                return Err(GeometryError::invalid(format!(
                    "polygon ring {index} has {} point(s), at least 4 required",
                    ring.num_points()
                )));
            }
            if !ring.is_closed() {
                return Err(GeometryError::invalid(format!(
                    "polygon ring {index} is not closed"
                )));
            }
        }
        Ok(Self(Collection::new(rings)?))
    }

    pub fn from_exterior(exterior: LineString) -> Result<Self> {
        Self::new(vec![exterior])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rings(&self) -> &[LineString] {
        self.members()
    }

    pub fn exterior(&self) -> Option<&LineString> {
        self.members().first()
    }

    pub fn interiors(&self) -> &[LineString] {
        self.members().get(1..).unwrap_or(&[])
    }

    pub fn num_interior_rings(&self) -> usize {
        self.interiors().len()
    }

    /// 1-based hole access.
    pub fn interior_ring_n(&self, n: usize) -> Option<&LineString> {
        n.checked_sub(1).and_then(|i| self.interiors().get(i))
    }
}
