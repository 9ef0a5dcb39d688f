use serde::{Deserialize, Serialize};

/// 2D coordinate in screen space: X grows right, Y grows down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle described by its min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point2D,
    pub max: Point2D,
}

impl Rect {
    /// Degenerate rectangle covering a single point.
    pub fn at(point: Point2D) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: Point2D) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn mid(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_grows_to_enclose_points() {
        let mut rect = Rect::at(Point2D::ORIGIN);
        rect.include(Point2D::new(4.0, -2.0));
        rect.include(Point2D::new(-1.0, 3.0));
        assert_eq!(rect.min, Point2D::new(-1.0, -2.0));
        assert_eq!(rect.max, Point2D::new(4.0, 3.0));
        assert_eq!(rect.width(), 5.0);
        assert_eq!(rect.height(), 5.0);
        assert_eq!(rect.mid(), Point2D::new(1.5, 0.5));
        assert!(rect.contains(&Point2D::ORIGIN));
    }

    #[test]
    fn degenerate_rect_has_zero_extent() {
        let rect = Rect::at(Point2D::new(2.0, 2.0));
        assert_eq!(rect.width(), 0.0);
        assert_eq!(rect.height(), 0.0);
    }
}
