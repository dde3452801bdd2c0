use super::{Collection, Coord, GeometryType, Point};
use crate::error::{GeometryError, Result};

/// Ordered sequence of points: either empty or at least two points long.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineString(Collection<Point>);

impl_collection_shape!(LineString, Point, GeometryType::LineString);

impl LineString {
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::{LineString, Point};
    ///
    /// let line = LineString::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap();
    /// assert_eq!(line.num_points(), 2);
    /// assert!(LineString::new(vec![Point::new(0.0, 0.0)]).is_err());
    /// ```
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() == 1 {
            return Err(GeometryError::invalid(
                "a linestring needs zero or at least two points",
            ));
        }
        Ok(Self(Collection::new(points)?))
    }

    /// Convenience constructor from planar `(x, y)` pairs.
    pub fn from_xy(coords: &[(f64, f64)]) -> Result<Self> {
        Self::new(coords.iter().copied().map(Point::from).collect())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point] {
        self.members()
    }

    pub fn num_points(&self) -> usize {
        self.len()
    }

    /// Coordinates in order. Members are never empty, so none are skipped.
    pub fn coords(&self) -> impl Iterator<Item = &Coord> + '_ {
        self.iter().filter_map(Point::coord)
    }

    /// Consecutive coordinate pairs (the "exploded" segments).
    pub fn segments(&self) -> impl Iterator<Item = (&Coord, &Coord)> + '_ {
        self.coords().zip(self.coords().skip(1))
    }

    pub fn start_point(&self) -> Option<&Point> {
        self.members().first()
    }

    pub fn end_point(&self) -> Option<&Point> {
        self.members().last()
    }

    /// 1-based point access.
    pub fn point_n(&self, n: usize) -> Option<&Point> {
        self.geometry_n(n)
    }

    /// First and last points coincide in the plane. Empty lines are not closed.
    pub fn is_closed(&self) -> bool {
        match (self.start_point(), self.end_point()) {
            (Some(a), Some(b)) => a.equals_xy(b),
            _ => false,
        }
    }

    /// Closed and simple; see [`crate::functions::predicates::is_ring`].
    pub fn is_ring(&self) -> bool {
        crate::functions::predicates::is_ring(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;

    #[test]
    fn single_point_is_rejected() {
        let err = LineString::new(vec![Point::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidGeometry(_)));
    }

    #[test]
    fn zero_points_is_the_empty_line() {
        let ls = LineString::new(vec![]).unwrap();
        assert!(ls.is_empty());
        assert!(!ls.is_closed());
        assert_eq!(ls.segments().count(), 0);
    }

    #[test]
    fn mixed_dimensions_keep_z() {
        let ls = LineString::new(vec![Point::new_z(0.0, 0.0, 5.0), Point::new(1.0, 1.0)]).unwrap();
        assert!(ls.has_z());
        assert_eq!(ls.points()[1].z(), None);
        assert_eq!(ls.points()[0].z(), Some(5.0));
    }

    #[test]
    fn segments_pair_consecutive_points() {
        let ls = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap();
        let segs: Vec<_> = ls.segments().map(|(a, b)| ((a.x, a.y), (b.x, b.y))).collect();
        assert_eq!(segs, vec![((0.0, 0.0), (1.0, 0.0)), ((1.0, 0.0), (1.0, 1.0))]);
    }

    #[test]
    fn closed_and_endpoints() {
        let ring = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap();
        assert!(ring.is_closed());
        assert_eq!(ring.start_point(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(ring.point_n(2), Some(&Point::new(1.0, 0.0)));
        let open = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]).unwrap();
        assert!(!open.is_closed());
    }
}
