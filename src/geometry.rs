use std::fmt;

#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Point2d {
    pub x_coord: f64,
    pub y_coord: f64,
}

impl Point2d {
    pub fn new(x_coord: f64, y_coord: f64) -> Point2d {
        Point2d{x_coord, y_coord}
    }

    pub fn plus(&self, other: &Point2d) -> Point2d {
        Point2d::new(self.x_coord + other.x_coord, self.y_coord + other.y_coord)
    }

    pub fn minus(&self, other: &Point2d) -> Point2d {
        Point2d::new(self.x_coord - other.x_coord, self.y_coord - other.y_coord)
    }

    pub fn times(&self, factor: f64) -> Point2d {
        Point2d::new(self.x_coord * factor, self.y_coord * factor)
    }

    pub fn euclidean_distance(&self, other: &Point2d) -> f64 {
        let diff = self.minus(other);
        (diff.x_coord.powi(2) + diff.y_coord.powi(2)).sqrt()
    }

    /// Linear interpolation towards `other`.  `ratio` of 0 gives `self`, 1 gives `other`.
    pub fn lerp(&self, other: &Point2d, ratio: f64) -> Point2d {
        self.plus(&other.minus(self).times(ratio))
    }

    /// Unit vector perpendicular (counter-clockwise) to the direction from `self` to `other`.
    /// Zero if the two points coincide.
    pub fn unit_normal_towards(&self, other: &Point2d) -> Point2d {
        let length = self.euclidean_distance(other);
        if length == 0.0 {
            return Point2d::default();
        }
        let dir = other.minus(self).times(1.0 / length);
        Point2d::new(-dir.y_coord, dir.x_coord)
    }
}

impl fmt::Display for Point2d {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x_coord, self.y_coord)
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn test_lerp() {
        let aa = Point2d::new(0.0, 0.0);
        let bb = Point2d::new(4.0, -2.0);
        assert_eq!(aa.lerp(&bb, 0.0), aa);
        assert_eq!(aa.lerp(&bb, 1.0), bb);
        let mid = aa.lerp(&bb, 0.25);
        assert_relative_eq!(mid.x_coord, 1.0);
        assert_relative_eq!(mid.y_coord, -0.5);
    }

    #[test]
    fn test_unit_normal() {
        let aa = Point2d::new(1.0, 1.0);
        let normal = aa.unit_normal_towards(&Point2d::new(3.0, 1.0));
        assert_relative_eq!(normal.x_coord, 0.0);
        assert_relative_eq!(normal.y_coord, 1.0);
        // degenerate segments have no direction
        assert_eq!(aa.unit_normal_towards(&aa), Point2d::default());
    }
}
