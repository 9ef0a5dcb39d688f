use crate::detection::{MagnitudeHistory, PeakDetector};
use crate::geometry::heading::{calibration_needed, normalize_heading, round_centi};
use crate::geometry::Point2D;
use crate::mapping::{reconstruct, ReconstructedPath};
use crate::prelude::{CoreResult, DetectionEvent, FieldSample, HeadingReading, SensorStatus};
use crate::storage::{Settings, SurveyState};
use crate::survey::{SourceKind, Waypoint, WaypointLog};
use crate::telemetry::LogManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Read-only view of a session handed to display and export collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub running: bool,
    pub sensor_status: SensorStatus,
    pub armed: bool,
    pub revolutions: u64,
    pub current_field: FieldSample,
    pub current_magnitude: f64,
    pub history: Vec<f64>,
    pub distance_m: f64,
    pub heading: Option<HeadingReading>,
    pub calibration_needed: bool,
    pub settings: Settings,
    /// Shared with the session until the next append.
    pub waypoints: Arc<Vec<Waypoint>>,
}

/// Live odometer session: detector, heading, and the waypoint log it feeds.
///
/// Every accepted revolution appends an auto waypoint whose distance is the
/// leg walked since the previous waypoint, so replaying the log through
/// [`reconstruct`] draws the walked path. Revolutions are priced at the wheel
/// circumference in force when they were counted; changing the wheel settles
/// the distance walked so far.
pub struct SurveySession {
    settings: Settings,
    detector: PeakDetector,
    history: MagnitudeHistory,
    log: WaypointLog,
    settled_cm: f64,
    settled_revolutions: u64,
    current_field: FieldSample,
    current_magnitude: f64,
    heading: Option<HeadingReading>,
    calibration_needed: bool,
    running: bool,
    sensor_status: SensorStatus,
    logger: LogManager,
}

impl SurveySession {
    pub fn new(settings: Settings) -> CoreResult<Self> {
        Self::restore(SurveyState {
            settings,
            ..Default::default()
        })
    }

    pub fn restore(state: SurveyState) -> CoreResult<Self> {
        state.settings.validate()?;
        let thresholds = state.settings.thresholds()?;
        let settled_cm = state
            .distance_cm
            .filter(|cm| cm.is_finite() && *cm >= 0.0)
            .unwrap_or(state.revolutions as f64 * state.settings.wheel_circumference_cm);
        let logger = LogManager::new("session");
        logger.trace(&format!(
            "restoring {} revolutions, {} waypoints",
            state.revolutions,
            state.waypoints.len()
        ));

        Ok(Self {
            settings: state.settings,
            detector: PeakDetector::with_count(thresholds, state.revolutions),
            history: MagnitudeHistory::default(),
            log: WaypointLog::from_waypoints(state.waypoints),
            settled_cm,
            settled_revolutions: state.revolutions,
            current_field: FieldSample::default(),
            current_magnitude: 0.0,
            heading: None,
            calibration_needed: false,
            running: false,
            sensor_status: SensorStatus::Available,
            logger,
        })
    }

    pub fn with_sensor_status(mut self, status: SensorStatus) -> Self {
        self.sensor_status = status;
        self
    }

    /// Begins accepting samples. Without a magnetometer the session stays stopped.
    pub fn start(&mut self) -> SensorStatus {
        if self.sensor_status == SensorStatus::Unavailable {
            self.logger.warn("magnetometer unavailable, monitoring not started");
            return self.sensor_status;
        }
        if !self.running {
            self.running = true;
            self.logger.record("monitoring started");
        }
        self.sensor_status
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.logger.record("monitoring stopped");
        }
    }

    /// Feeds one field sample; returns the auto waypoint when a revolution is accepted.
    pub fn ingest_field(&mut self, sample: FieldSample) -> Option<Waypoint> {
        if !self.running {
            return None;
        }

        let magnitude = sample.magnitude();
        self.current_field = sample;
        self.current_magnitude = magnitude;
        self.history.push(magnitude);

        match self.detector.observe(magnitude) {
            DetectionEvent::PeakAccepted => {
                let waypoint = self.append_waypoint(0.0, SourceKind::Auto);
                self.logger.trace(&format!(
                    "revolution {} at magnitude {:.2}",
                    self.detector.revolutions(),
                    magnitude
                ));
                Some(waypoint)
            }
            DetectionEvent::None => None,
        }
    }

    pub fn update_heading(&mut self, reading: HeadingReading) {
        self.calibration_needed = calibration_needed(reading.accuracy);
        self.heading = Some(reading);
    }

    /// Appends a surveyor-entered station at the current position.
    pub fn record_manual(&mut self, depth: f64) -> Waypoint {
        let waypoint = self.append_waypoint(depth, SourceKind::Manual);
        self.logger.record(&format!(
            "manual station {} depth {:.2} m",
            waypoint.sequence_number, depth
        ));
        waypoint
    }

    fn append_waypoint(&mut self, depth: f64, source_kind: SourceKind) -> Waypoint {
        let leg = round_centi(self.rounded_distance_m() - self.log.total_distance());
        let heading = self.rounded_heading().unwrap_or(0.0);
        self.log.append(leg, heading, depth, source_kind)
    }

    /// Zeroes the revolution count and wipes the diagnostic history and the log.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.settled_cm = 0.0;
        self.settled_revolutions = 0;
        self.history.clear();
        self.log.clear();
        self.logger.record("survey data reset");
    }

    /// Swaps thresholds and circumference; the revolution count is kept and
    /// distance already walked keeps the circumference it was walked with.
    pub fn apply_settings(&mut self, settings: Settings) -> CoreResult<()> {
        settings.validate()?;
        self.detector.set_thresholds(settings.thresholds()?);
        if settings.wheel_circumference_cm != self.settings.wheel_circumference_cm {
            self.settled_cm = self.distance_cm();
            self.settled_revolutions = self.detector.revolutions();
            self.logger.record(&format!(
                "wheel circumference {:.2} cm -> {:.2} cm at {:.2} m",
                self.settings.wheel_circumference_cm,
                settings.wheel_circumference_cm,
                self.settled_cm / 100.0
            ));
        }
        self.settings = settings;
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_armed(&self) -> bool {
        self.detector.is_armed()
    }

    pub fn revolutions(&self) -> u64 {
        self.detector.revolutions()
    }

    pub fn current_magnitude(&self) -> f64 {
        self.current_magnitude
    }

    pub fn history(&self) -> &MagnitudeHistory {
        &self.history
    }

    pub fn heading(&self) -> Option<HeadingReading> {
        self.heading
    }

    pub fn calibration_needed(&self) -> bool {
        self.calibration_needed
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.log.entries()
    }

    pub fn distance_cm(&self) -> f64 {
        let unsettled = self
            .detector
            .revolutions()
            .saturating_sub(self.settled_revolutions);
        self.settled_cm + unsettled as f64 * self.settings.wheel_circumference_cm
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_cm() / 100.0
    }

    pub fn rounded_distance_m(&self) -> f64 {
        round_centi(self.distance_m())
    }

    pub fn rounded_heading(&self) -> Option<f64> {
        self.heading
            .map(|reading| normalize_heading(round_centi(reading.magnetic)))
    }

    pub fn rounded_true_heading(&self) -> Option<f64> {
        self.heading
            .and_then(|reading| reading.true_heading)
            .map(|heading| normalize_heading(round_centi(heading)))
    }

    /// Depth of the most recent manual station, used to prefill the next one.
    pub fn last_manual_depth(&self) -> f64 {
        self.log.last_manual_depth().unwrap_or(0.0)
    }

    pub fn path(&self, origin: Point2D) -> ReconstructedPath {
        reconstruct(origin, self.log.entries())
    }

    pub fn to_state(&self) -> SurveyState {
        SurveyState {
            settings: self.settings,
            revolutions: self.detector.revolutions(),
            distance_cm: Some(self.distance_cm()),
            waypoints: self.log.entries().to_vec(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            running: self.running,
            sensor_status: self.sensor_status,
            armed: self.detector.is_armed(),
            revolutions: self.detector.revolutions(),
            current_field: self.current_field,
            current_magnitude: self.current_magnitude,
            history: self.history.to_vec(),
            distance_m: self.distance_m(),
            heading: self.heading,
            calibration_needed: self.calibration_needed,
            settings: self.settings,
            waypoints: self.log.shared(),
        }
    }
}
