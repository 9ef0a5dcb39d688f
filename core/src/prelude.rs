use serde::{Deserialize, Serialize};

/// Instantaneous tri-axial magnetic field reading in microtesla.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FieldSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Compass reading delivered by the heading source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingReading {
    pub magnetic: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_heading: Option<f64>,
    /// Accuracy in degrees; negative means the reading is invalid.
    pub accuracy: f64,
}

impl HeadingReading {
    pub fn new(magnetic: f64, accuracy: f64) -> Self {
        Self {
            magnetic,
            true_heading: None,
            accuracy,
        }
    }
}

/// Outcome of feeding one magnitude into the peak detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionEvent {
    None,
    PeakAccepted,
}

/// Availability of the magnetometer backing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorStatus {
    #[default]
    Available,
    Unavailable,
}

/// Common error type for the fallible edges of the core.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("export failure: {0}")]
    Export(#[from] csv::Error),
    #[error("nothing to export: {0}")]
    EmptyExport(String),
    #[error("pipeline failure: {0}")]
    Pipeline(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
