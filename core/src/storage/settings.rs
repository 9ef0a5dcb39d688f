use crate::detection::Thresholds;
use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HIGH_THRESHOLD: f64 = 1170.0;
pub const DEFAULT_LOW_THRESHOLD: f64 = 1000.0;
pub const DEFAULT_WHEEL_CIRCUMFERENCE_CM: f64 = 11.78;

/// User-tunable odometer settings persisted across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub wheel_circumference_cm: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
            wheel_circumference_cm: DEFAULT_WHEEL_CIRCUMFERENCE_CM,
        }
    }
}

impl Settings {
    pub fn thresholds(&self) -> CoreResult<Thresholds> {
        Thresholds::new(self.high_threshold, self.low_threshold)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.thresholds()?;
        if !self.wheel_circumference_cm.is_finite() || self.wheel_circumference_cm <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "wheel circumference must be positive, got {}",
                self.wheel_circumference_cm
            )));
        }
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.thresholds().unwrap().high(), 1170.0);
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let settings = Settings {
            high_threshold: 900.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn circumference_must_be_positive() {
        let mut settings = Settings {
            wheel_circumference_cm: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        settings.reset_to_defaults();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"high_threshold": 1500.0}"#).unwrap();
        assert_eq!(settings.high_threshold, 1500.0);
        assert_eq!(settings.low_threshold, DEFAULT_LOW_THRESHOLD);
        assert_eq!(settings.wheel_circumference_cm, DEFAULT_WHEEL_CIRCUMFERENCE_CM);
    }
}
