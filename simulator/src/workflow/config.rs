use crate::generator::profile::{GeneratorConfig, SurveyLeg};
use anyhow::Context;
use cavecore::storage::Settings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_channel_capacity() -> usize {
    256
}

/// Survey scenario: odometer settings, signal model and the legs to walk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_legs")]
    pub legs: Vec<SurveyLeg>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// A short loop around a chamber with two depth stations.
pub fn default_legs() -> Vec<SurveyLeg> {
    vec![
        SurveyLeg {
            heading_deg: 15.0,
            distance_m: 4.0,
            depth_m: Some(-3.5),
        },
        SurveyLeg {
            heading_deg: 100.0,
            distance_m: 2.5,
            depth_m: None,
        },
        SurveyLeg {
            heading_deg: 190.0,
            distance_m: 3.0,
            depth_m: Some(-5.0),
        },
        SurveyLeg {
            heading_deg: 285.0,
            distance_m: 2.0,
            depth_m: None,
        },
    ]
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .settings
            .validate()
            .with_context(|| format!("validating settings in {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(high_threshold: f64, low_threshold: f64, wheel_circumference_cm: f64) -> Self {
        Self {
            settings: Settings {
                high_threshold,
                low_threshold,
                wheel_circumference_cm,
            },
            generator: GeneratorConfig::default(),
            legs: default_legs(),
            channel_capacity: default_channel_capacity(),
        }
    }

    pub fn planned_distance_m(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_m.max(0.0)).sum()
    }
}
