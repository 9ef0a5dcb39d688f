use crate::prelude::{CoreError, CoreResult, DetectionEvent};
use serde::{Deserialize, Serialize};

/// Validated hysteresis band. `high` is always strictly above `low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    high: f64,
    low: f64,
}

#[derive(Deserialize)]
struct RawThresholds {
    high: f64,
    low: f64,
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = CoreError;

    fn try_from(raw: RawThresholds) -> CoreResult<Self> {
        Self::new(raw.high, raw.low)
    }
}

impl Thresholds {
    pub fn new(high: f64, low: f64) -> CoreResult<Self> {
        if !high.is_finite() || !low.is_finite() {
            return Err(CoreError::InvalidConfig(format!(
                "thresholds must be finite (high {}, low {})",
                high, low
            )));
        }
        if high <= low {
            return Err(CoreError::InvalidConfig(format!(
                "high threshold {} must exceed low threshold {}",
                high, low
            )));
        }
        Ok(Self { high, low })
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }
}

/// Schmitt-trigger revolution counter over field magnitudes.
///
/// A peak is accepted when an armed detector sees a magnitude above the high
/// threshold; it then stays disarmed until the magnitude falls below the low
/// threshold, so noise inside the band cannot double count a magnet pass.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    thresholds: Thresholds,
    armed: bool,
    revolutions: u64,
}

impl PeakDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_count(thresholds, 0)
    }

    /// Starts from a revolution count restored from storage.
    pub fn with_count(thresholds: Thresholds, revolutions: u64) -> Self {
        Self {
            thresholds,
            armed: true,
            revolutions,
        }
    }

    pub fn observe(&mut self, magnitude: f64) -> DetectionEvent {
        if self.armed && magnitude > self.thresholds.high {
            self.revolutions += 1;
            self.armed = false;
            DetectionEvent::PeakAccepted
        } else if !self.armed && magnitude < self.thresholds.low {
            self.armed = true;
            DetectionEvent::None
        } else {
            DetectionEvent::None
        }
    }

    pub fn reset(&mut self) {
        self.revolutions = 0;
        self.armed = true;
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn revolutions(&self) -> u64 {
        self.revolutions
    }
}
