use cavecore::geometry::{Point2D, Rect};
use cavecore::mapping::reconstruct;
use cavecore::survey::{SessionSnapshot, SourceKind};
use serde::{Deserialize, Serialize};

/// Depth label anchored at a manual station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationLabel {
    pub sequence_number: u64,
    pub position: Point2D,
    pub depth: f64,
}

/// Everything the stick-map view needs in one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapModel {
    pub snapshot: SessionSnapshot,
    pub origin: Point2D,
    pub polyline: Vec<Point2D>,
    pub bounding_box: Rect,
    pub stations: Vec<StationLabel>,
}

impl Default for MapModel {
    fn default() -> Self {
        Self::from_snapshot(SessionSnapshot::default())
    }
}

impl MapModel {
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let path = reconstruct(Point2D::ORIGIN, &snapshot.waypoints);
        let stations = snapshot
            .waypoints
            .iter()
            .zip(path.polyline.iter())
            .filter(|(waypoint, _)| waypoint.source_kind == SourceKind::Manual)
            .map(|(waypoint, position)| StationLabel {
                sequence_number: waypoint.sequence_number,
                position: *position,
                depth: waypoint.depth,
            })
            .collect();

        Self {
            snapshot,
            origin: path.origin,
            polyline: path.polyline,
            bounding_box: path.bounding_box,
            stations,
        }
    }
}
