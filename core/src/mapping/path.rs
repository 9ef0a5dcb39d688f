use crate::geometry::heading::heading_to_math_radians;
use crate::geometry::{Point2D, Rect};
use crate::survey::Waypoint;
use serde::{Deserialize, Serialize};

/// Polyline and extent produced by replaying a waypoint log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedPath {
    pub origin: Point2D,
    /// One point per waypoint; the origin itself is not repeated here.
    pub polyline: Vec<Point2D>,
    /// Encloses the origin and every polyline point.
    pub bounding_box: Rect,
}

impl ReconstructedPath {
    pub fn end(&self) -> Point2D {
        self.polyline.last().copied().unwrap_or(self.origin)
    }

    pub fn is_empty(&self) -> bool {
        self.polyline.is_empty()
    }
}

/// Screen-space displacement (X right, Y down) for one leg.
pub fn leg_delta(distance: f64, heading: f64) -> (f64, f64) {
    let angle = heading_to_math_radians(heading);
    (distance * angle.cos(), -(distance * angle.sin()))
}

/// Dead-reckons the waypoint log from `origin` in log order.
pub fn reconstruct(origin: Point2D, waypoints: &[Waypoint]) -> ReconstructedPath {
    let mut current = origin;
    let mut bounding_box = Rect::at(origin);
    let mut polyline = Vec::with_capacity(waypoints.len());

    for waypoint in waypoints {
        let (dx, dy) = leg_delta(waypoint.distance, waypoint.heading);
        current = current.offset(dx, dy);
        bounding_box.include(current);
        polyline.push(current);
    }

    ReconstructedPath {
        origin,
        polyline,
        bounding_box,
    }
}
