/// A planar coordinate. The simple geometry engine treats the plane as a
/// grid and measures Manhattan distance in input distance units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn manhattan_distance(&self, to: &Location) -> f64 {
        (self.x() - to.x()).abs() + (self.y() - to.y()).abs()
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point
    }
}
