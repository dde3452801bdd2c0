use super::{normalize_srid, BoundingBox, Metadata, Shape};
use crate::error::{GeometryError, Result};

/// Ordered, exclusively owned sequence of non-empty child geometries.
///
/// The Z/M flags are the OR over the children and are fixed when the
/// collection is built.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    members: Vec<T>,
    has_z: bool,
    is_measured: bool,
    srid: Option<u32>,
    metadata: Metadata,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            has_z: false,
            is_measured: false,
            srid: None,
            metadata: Metadata::new(),
        }
    }
}

/// Members, flags and SRID; metadata does not take part.
impl<T: PartialEq> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
            && self.has_z == other.has_z
            && self.is_measured == other.is_measured
            && self.srid == other.srid
    }
}

impl<T: Shape> Collection<T> {
    /// Take ownership of `members`, rejecting any empty child.
    ///
    /// # Example
    ///
    /// ```
    /// use geowire_core::geometry::{Collection, Point};
    ///
    /// let ok = Collection::new(vec![Point::new(0.0, 0.0), Point::new_z(1.0, 1.0, 2.0)]).unwrap();
    /// assert!(ok.has_z());
    /// assert!(Collection::new(vec![Point::empty()]).is_err());
    /// ```
    pub fn new(members: Vec<T>) -> Result<Self> {
        if let Some(index) = members.iter().position(Shape::is_empty) {
            return Err(GeometryError::invalid(format!(
                "member {index} of a collection is empty"
            )));
        }
        let has_z = members.iter().any(Shape::has_z);
        let is_measured = members.iter().any(Shape::is_measured);
        Ok(Self {
            members,
            has_z,
            is_measured,
            ..Self::default()
        })
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::fold(self.members.iter().map(Shape::bbox))
    }
}

impl<T> Collection<T> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn into_members(self) -> Vec<T> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    /// 1-based member access, as in the OGC accessors.
    pub fn geometry_n(&self, n: usize) -> Option<&T> {
        n.checked_sub(1).and_then(|i| self.members.get(i))
    }

    pub fn has_z(&self) -> bool {
        self.has_z
    }

    pub fn is_measured(&self) -> bool {
        self.is_measured
    }

    pub fn srid(&self) -> Option<u32> {
        self.srid
    }

    pub fn set_srid(&mut self, srid: Option<u32>) {
        self.srid = normalize_srid(srid);
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn flags_are_or_of_children() {
        let c = Collection::new(vec![
            Point::new(0.0, 0.0),
            Point::new_m(1.0, 1.0, 3.0),
        ])
        .unwrap();
        assert!(!c.has_z());
        assert!(c.is_measured());
    }

    #[test]
    fn empty_child_is_rejected() {
        let err = Collection::new(vec![Point::new(0.0, 0.0), Point::empty()]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidGeometry(_)));
        assert!(format!("{err}").contains("member 1"));
    }

    #[test]
    fn bbox_folds_children() {
        let c = Collection::new(vec![Point::new(3.0, -1.0), Point::new(-2.0, 4.0)]).unwrap();
        assert_eq!(c.bbox(), Some(BoundingBox::new(-2.0, -1.0, 3.0, 4.0)));
        assert_eq!(Collection::<Point>::empty().bbox(), None);
    }

    #[test]
    fn geometry_n_is_one_based() {
        let c = Collection::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]).unwrap();
        assert_eq!(c.geometry_n(0), None);
        assert_eq!(c.geometry_n(2), Some(&Point::new(2.0, 2.0)));
        assert_eq!(c.geometry_n(3), None);
    }
}
