pub mod export;
pub mod session;
pub mod waypoint;

pub use export::{export_csv, write_csv};
pub use session::{SessionSnapshot, SurveySession};
pub use waypoint::{SourceKind, Waypoint, WaypointLog};
