use crate::generator::template::magnet_pulse;
use anyhow::{bail, Context};
use cavecore::geometry::heading::normalize_heading;
use cavecore::pipeline::SurveyEvent;
use cavecore::storage::Settings;
use cavecore::{FieldSample, HeadingReading};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Unit direction of the synthetic field; only the magnitude varies.
const FIELD_DIRECTION: (f64, f64, f64) = (0.36, 0.48, 0.8);

/// Heading changes smaller than this are not reported, like a compass heading filter.
const HEADING_FILTER_DEG: f64 = 1.0;

/// Parameters of the synthetic magnetometer stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Field magnitude with the magnet far from the sensor.
    pub baseline: f64,
    /// Extra magnitude at the magnet's closest approach.
    pub peak: f64,
    pub samples_per_revolution: usize,
    pub noise: f64,
    pub heading_jitter: f64,
    pub heading_accuracy: f64,
    pub seed: u64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            baseline: 600.0,
            peak: 1200.0,
            samples_per_revolution: 8,
            noise: 25.0,
            heading_jitter: 0.5,
            heading_accuracy: 5.0,
            seed: 0,
            description: None,
            scenario: None,
        }
    }
}

/// One straight stretch of passage walked on a constant bearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyLeg {
    pub heading_deg: f64,
    pub distance_m: f64,
    /// Depth recorded as a manual station at the end of the leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_m: Option<f64>,
}

impl GeneratorConfig {
    /// Checks the synthetic signal crosses both thresholds cleanly.
    pub fn validate(&self, settings: &Settings) -> anyhow::Result<()> {
        if self.samples_per_revolution < 4 {
            bail!(
                "samples_per_revolution must be at least 4, got {}",
                self.samples_per_revolution
            );
        }
        if self.noise < 0.0 || !self.noise.is_finite() {
            bail!("noise must be a finite non-negative amplitude");
        }
        if self.baseline + self.noise >= settings.low_threshold {
            bail!(
                "baseline {} + noise {} never re-arms below low threshold {}",
                self.baseline,
                self.noise,
                settings.low_threshold
            );
        }
        if self.baseline + self.peak - self.noise <= settings.high_threshold {
            bail!(
                "peak {} above baseline {} cannot clear high threshold {}",
                self.peak,
                self.baseline,
                settings.high_threshold
            );
        }
        Ok(())
    }
}

/// Whole revolutions the wheel turns over `distance_m`.
pub fn revolutions_for(distance_m: f64, circumference_cm: f64) -> u64 {
    (distance_m.max(0.0) * 100.0 / circumference_cm).round() as u64
}

fn field_sample(magnitude: f64) -> FieldSample {
    let (x, y, z) = FIELD_DIRECTION;
    FieldSample::new(x * magnitude, y * magnitude, z * magnitude)
}

fn angular_gap(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Builds the ordered event stream for walking `legs` with a magnet wheel.
pub fn build_survey_events(
    config: &GeneratorConfig,
    legs: &[SurveyLeg],
    settings: &Settings,
) -> anyhow::Result<Vec<SurveyEvent>> {
    settings
        .validate()
        .context("validating odometer settings for generator")?;
    config.validate(settings)?;

    let spr = config.samples_per_revolution;
    let centre = (spr / 2) as f64;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut events = vec![SurveyEvent::Start];
    let mut last_heading: Option<f64> = None;

    for leg in legs {
        let revolutions = revolutions_for(leg.distance_m, settings.wheel_circumference_cm);
        for _ in 0..revolutions {
            let jitter = if config.heading_jitter > 0.0 {
                rng.gen_range(-config.heading_jitter..config.heading_jitter)
            } else {
                0.0
            };
            let heading = normalize_heading(leg.heading_deg + jitter);
            let report = match last_heading {
                Some(previous) => angular_gap(previous, heading) >= HEADING_FILTER_DEG,
                None => true,
            };
            if report {
                events.push(SurveyEvent::Heading(HeadingReading::new(
                    heading,
                    config.heading_accuracy,
                )));
                last_heading = Some(heading);
            }

            for index in 0..spr {
                let offset = (index as f64 - centre) / spr as f64;
                let noise = if config.noise > 0.0 {
                    rng.gen_range(-config.noise..config.noise)
                } else {
                    0.0
                };
                let magnitude = config.baseline + config.peak * magnet_pulse(offset) + noise;
                events.push(SurveyEvent::Field(field_sample(magnitude)));
            }
        }

        if let Some(depth) = leg.depth_m {
            events.push(SurveyEvent::ManualStation { depth });
        }
    }

    events.push(SurveyEvent::Stop);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cavecore::detection::PeakDetector;
    use cavecore::DetectionEvent;

    fn legs() -> Vec<SurveyLeg> {
        vec![
            SurveyLeg {
                heading_deg: 0.0,
                distance_m: 1.0,
                depth_m: None,
            },
            SurveyLeg {
                heading_deg: 90.0,
                distance_m: 0.5,
                depth_m: Some(-3.0),
            },
        ]
    }

    #[test]
    fn revolutions_round_to_nearest_turn() {
        assert_eq!(revolutions_for(1.0, 11.78), 8);
        assert_eq!(revolutions_for(0.5, 11.78), 4);
        assert_eq!(revolutions_for(-2.0, 11.78), 0);
    }

    #[test]
    fn generated_stream_yields_one_peak_per_revolution() {
        let settings = Settings::default();
        let config = GeneratorConfig {
            seed: 42,
            ..Default::default()
        };
        let events = build_survey_events(&config, &legs(), &settings).unwrap();

        let mut detector = PeakDetector::new(settings.thresholds().unwrap());
        let peaks = events
            .iter()
            .filter_map(|event| match event {
                SurveyEvent::Field(sample) => Some(detector.observe(sample.magnitude())),
                _ => None,
            })
            .filter(|event| *event == DetectionEvent::PeakAccepted)
            .count();
        assert_eq!(peaks, 12);
        assert_eq!(events.first(), Some(&SurveyEvent::Start));
        assert_eq!(events.last(), Some(&SurveyEvent::Stop));
    }

    #[test]
    fn manual_station_closes_leg_with_depth() {
        let events =
            build_survey_events(&GeneratorConfig::default(), &legs(), &Settings::default())
                .unwrap();
        let stations: Vec<&SurveyEvent> = events
            .iter()
            .filter(|event| matches!(event, SurveyEvent::ManualStation { .. }))
            .collect();
        assert_eq!(stations, vec![&SurveyEvent::ManualStation { depth: -3.0 }]);
    }

    #[test]
    fn same_seed_reproduces_stream() {
        let config = GeneratorConfig {
            seed: 7,
            ..Default::default()
        };
        let first = build_survey_events(&config, &legs(), &Settings::default()).unwrap();
        let second = build_survey_events(&config, &legs(), &Settings::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn signal_that_cannot_rearm_is_rejected() {
        let config = GeneratorConfig {
            baseline: 990.0,
            ..Default::default()
        };
        assert!(build_survey_events(&config, &legs(), &Settings::default()).is_err());
    }
}
