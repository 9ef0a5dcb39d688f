//! Core odometer processing for the cave survey platform.
//!
//! A wheel-mounted magnet is counted through hysteresis peak detection on the
//! magnetometer magnitude, revolutions become walked distance, and the
//! resulting waypoint log is replayed into a north-up stick map.

pub mod detection;
pub mod geometry;
pub mod mapping;
pub mod pipeline;
pub mod prelude;
pub mod storage;
pub mod survey;
pub mod telemetry;

pub use prelude::{CoreError, CoreResult, DetectionEvent, FieldSample, HeadingReading};
