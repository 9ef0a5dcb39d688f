use serde::Serialize;
use std::sync::Mutex;

/// Counters describing the work done by a session worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub samples_processed: usize,
    pub samples_dropped: usize,
    pub peaks_accepted: usize,
    pub waypoints_recorded: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_sample(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.samples_processed += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.samples_dropped += 1;
        }
    }

    pub fn record_peak(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.peaks_accepted += 1;
        }
    }

    pub fn record_waypoint(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.waypoints_recorded += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_accumulates_counts() {
        let recorder = MetricsRecorder::new();
        recorder.record_sample();
        recorder.record_sample();
        recorder.record_dropped();
        recorder.record_peak();
        recorder.record_waypoint();

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.samples_processed, 2);
        assert_eq!(snapshot.samples_dropped, 1);
        assert_eq!(snapshot.peaks_accepted, 1);
        assert_eq!(snapshot.waypoints_recorded, 1);
    }
}
