use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a waypoint entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Recorded on an accepted wheel revolution.
    Auto,
    /// Station entered by the surveyor, usually with a depth.
    Manual,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Auto => "auto",
            SourceKind::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One survey leg: distance walked since the previous waypoint along `heading`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub sequence_number: u64,
    /// Meters, never negative.
    pub distance: f64,
    /// Compass degrees in `[0, 360)`.
    pub heading: f64,
    /// Meters, signed.
    pub depth: f64,
    pub source_kind: SourceKind,
}

/// Append-only, insertion-ordered waypoint log.
///
/// Entries sit behind an `Arc` so snapshots can share them; an append copies
/// the list only while an older snapshot still holds it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointLog {
    entries: Arc<Vec<Waypoint>>,
    next_sequence: u64,
}

impl WaypointLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from persisted entries, continuing their numbering.
    pub fn from_waypoints(entries: Vec<Waypoint>) -> Self {
        let next_sequence = entries
            .iter()
            .map(|waypoint| waypoint.sequence_number + 1)
            .max()
            .unwrap_or(0);
        Self {
            entries: Arc::new(entries),
            next_sequence,
        }
    }

    pub fn append(
        &mut self,
        distance: f64,
        heading: f64,
        depth: f64,
        source_kind: SourceKind,
    ) -> Waypoint {
        let waypoint = Waypoint {
            sequence_number: self.next_sequence,
            distance: distance.max(0.0),
            heading,
            depth,
            source_kind,
        };
        self.next_sequence += 1;
        Arc::make_mut(&mut self.entries).push(waypoint);
        waypoint
    }

    /// Drops every entry and restarts numbering; only used by a full survey reset.
    pub fn clear(&mut self) {
        self.entries = Arc::default();
        self.next_sequence = 0;
    }

    pub fn entries(&self) -> &[Waypoint] {
        &self.entries
    }

    /// Cheap handle on the current entries; later appends do not show through.
    pub fn shared(&self) -> Arc<Vec<Waypoint>> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.entries.last()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Sum of all leg lengths in meters.
    pub fn total_distance(&self) -> f64 {
        self.entries.iter().map(|waypoint| waypoint.distance).sum()
    }

    pub fn last_manual_depth(&self) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|waypoint| waypoint.source_kind == SourceKind::Manual)
            .map(|waypoint| waypoint.depth)
    }
}
