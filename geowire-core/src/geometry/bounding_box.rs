use super::Coord;

/// Axis-aligned planar extent. Empty geometries have no box at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    /// Degenerate box with both corners on `coord`.
    pub fn from_coord(coord: &Coord) -> Self {
        Self::new(coord.x, coord.y, coord.x, coord.y)
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn expand_to(&mut self, coord: &Coord) {
        self.minx = self.minx.min(coord.x);
        self.miny = self.miny.min(coord.y);
        self.maxx = self.maxx.max(coord.x);
        self.maxy = self.maxy.max(coord.y);
    }

    pub fn merge(self, other: BoundingBox) -> Self {
        Self::new(
            self.minx.min(other.minx),
            self.miny.min(other.miny),
            self.maxx.max(other.maxx),
            self.maxy.max(other.maxy),
        )
    }

    pub fn contains_coord(&self, coord: &Coord) -> bool {
        coord.x >= self.minx && coord.x <= self.maxx && coord.y >= self.miny && coord.y <= self.maxy
    }

    /// Fold optional boxes; `None` entries (empty parts) are skipped.
    pub fn fold<I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<BoundingBox>>,
    {
        boxes
            .into_iter()
            .flatten()
            .reduce(BoundingBox::merge)
    }
}
