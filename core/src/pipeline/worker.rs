use crate::prelude::{CoreError, CoreResult, FieldSample, HeadingReading};
use crate::storage::{Settings, StateStore};
use crate::survey::{SessionSnapshot, SurveySession};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};

/// Field samples between snapshot publications when nothing else changed.
pub const SNAPSHOT_EVERY: usize = 8;

/// Everything that may mutate a survey, funnelled through one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SurveyEvent {
    Field(FieldSample),
    Heading(HeadingReading),
    ManualStation { depth: f64 },
    ApplySettings(Settings),
    Start,
    Stop,
    Reset,
    Save,
}

/// Caller side of a session worker: pushes events, observes snapshots.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SurveyEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
    metrics: Arc<MetricsRecorder>,
}

impl SessionHandle {
    pub async fn send(&self, event: SurveyEvent) -> CoreResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| CoreError::Pipeline("session worker has shut down".into()))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }
}

/// Single owner of a [`SurveySession`]; applies events in arrival order.
pub struct SessionWorker {
    session: SurveySession,
    events: mpsc::Receiver<SurveyEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    store: Option<Arc<dyn StateStore>>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    since_snapshot: usize,
    pending_save: Option<JoinHandle<CoreResult<()>>>,
}

/// Wires a worker and its handle around a bounded event queue.
pub fn session_channel(
    session: SurveySession,
    store: Option<Arc<dyn StateStore>>,
    capacity: usize,
) -> (SessionWorker, SessionHandle) {
    let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
    let metrics = Arc::new(MetricsRecorder::new());

    let worker = SessionWorker {
        session,
        events: event_rx,
        snapshots: snapshot_tx,
        store,
        metrics: metrics.clone(),
        logger: LogManager::new("worker"),
        since_snapshot: 0,
        pending_save: None,
    };
    let handle = SessionHandle {
        events: event_tx,
        snapshots: snapshot_rx,
        metrics,
    };
    (worker, handle)
}

impl SessionWorker {
    /// Drains events until every handle is dropped, then persists and returns the session.
    pub async fn run(mut self) -> CoreResult<SurveySession> {
        self.logger.record("session worker started");
        while let Some(event) = self.events.recv().await {
            self.apply(event).await;
        }

        self.session.stop();
        self.publish();
        if self.store.is_some() {
            self.persist().await;
            if let Some(save) = self.pending_save.take() {
                save.await.map_err(|err| {
                    CoreError::Pipeline(format!("final save task failed: {}", err))
                })??;
            }
        }
        let metrics = self.metrics.snapshot();
        self.logger.record(&format!(
            "session worker finished: {} samples, {} dropped, {} peaks, {} waypoints",
            metrics.samples_processed,
            metrics.samples_dropped,
            metrics.peaks_accepted,
            metrics.waypoints_recorded
        ));
        Ok(self.session)
    }

    async fn apply(&mut self, event: SurveyEvent) {
        match event {
            SurveyEvent::Field(sample) => self.apply_field(sample).await,
            SurveyEvent::Heading(reading) => {
                self.session.update_heading(reading);
                self.publish();
            }
            SurveyEvent::ManualStation { depth } => {
                if !depth.is_finite() {
                    self.logger.warn("ignoring manual station with non-finite depth");
                    return;
                }
                self.session.record_manual(depth);
                self.metrics.record_waypoint();
                self.persist().await;
                self.publish();
            }
            SurveyEvent::ApplySettings(settings) => {
                match self.session.apply_settings(settings) {
                    Ok(()) => self.persist().await,
                    Err(err) => self.logger.warn(&format!("settings rejected: {}", err)),
                }
                self.publish();
            }
            SurveyEvent::Start => {
                self.session.start();
                self.publish();
            }
            SurveyEvent::Stop => {
                self.session.stop();
                self.publish();
            }
            SurveyEvent::Reset => {
                self.session.reset();
                self.persist().await;
                self.publish();
            }
            SurveyEvent::Save => self.persist().await,
        }
    }

    async fn apply_field(&mut self, sample: FieldSample) {
        if !sample.magnitude().is_finite() {
            self.metrics.record_dropped();
            return;
        }
        if !self.session.is_running() {
            return;
        }

        self.metrics.record_sample();
        if self.session.ingest_field(sample).is_some() {
            self.metrics.record_peak();
            self.metrics.record_waypoint();
            self.persist().await;
            self.publish();
        } else {
            self.since_snapshot += 1;
            if self.since_snapshot >= SNAPSHOT_EVERY {
                self.publish();
            }
        }
    }

    /// Hands the current state to a blocking task. Saves stay ordered: the
    /// previous write is awaited before the next one starts.
    async fn persist(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if let Some(previous) = self.pending_save.take() {
            self.report_save(previous.await);
        }
        let state = self.session.to_state();
        self.pending_save = Some(task::spawn_blocking(move || store.save(&state)));
    }

    fn report_save(&self, outcome: Result<CoreResult<()>, task::JoinError>) {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.logger.warn(&format!("write-through failed: {}", err)),
            Err(err) => self.logger.warn(&format!("write-through task failed: {}", err)),
        }
    }

    fn publish(&mut self) {
        self.since_snapshot = 0;
        self.snapshots.send_replace(self.session.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};
    use crate::survey::SourceKind;

    fn field(magnitude: f64) -> SurveyEvent {
        SurveyEvent::Field(FieldSample::new(0.0, magnitude, 0.0))
    }

    #[tokio::test]
    async fn worker_counts_peaks_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, Some(store.clone()), 16);
        let task = tokio::spawn(worker.run());

        handle.send(SurveyEvent::Start).await.unwrap();
        handle
            .send(SurveyEvent::Heading(HeadingReading::new(270.0, 4.0)))
            .await
            .unwrap();
        for magnitude in [500.0, 1200.0, 1300.0, 900.0, 500.0, 1250.0, 600.0] {
            handle.send(field(magnitude)).await.unwrap();
        }
        handle
            .send(SurveyEvent::ManualStation { depth: -12.0 })
            .await
            .unwrap();

        let metrics = handle.metrics();
        drop(handle);
        let session = task.await.unwrap().unwrap();

        assert_eq!(session.revolutions(), 2);
        assert_eq!(session.waypoints().len(), 3);
        assert_eq!(session.waypoints()[2].source_kind, SourceKind::Manual);
        assert!(!session.is_running());

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.revolutions, 2);
        assert_eq!(saved.waypoints.len(), 3);

        let counts = metrics.snapshot();
        assert_eq!(counts.samples_processed, 7);
        assert_eq!(counts.peaks_accepted, 2);
        assert_eq!(counts.waypoints_recorded, 3);
    }

    #[tokio::test]
    async fn non_finite_samples_are_dropped() {
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, None, 8);
        let task = tokio::spawn(worker.run());

        handle.send(SurveyEvent::Start).await.unwrap();
        handle
            .send(SurveyEvent::Field(FieldSample::new(f64::NAN, 0.0, 0.0)))
            .await
            .unwrap();
        handle
            .send(SurveyEvent::Field(FieldSample::new(f64::INFINITY, 0.0, 0.0)))
            .await
            .unwrap();
        handle.send(field(1300.0)).await.unwrap();

        let metrics = handle.metrics();
        drop(handle);
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.revolutions(), 1);
        assert_eq!(metrics.snapshot().samples_dropped, 2);
    }

    #[tokio::test]
    async fn snapshots_follow_structural_changes() {
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, None, 8);
        let mut snapshots = handle.subscribe();
        let task = tokio::spawn(worker.run());

        assert!(!handle.snapshot().running);
        handle.send(SurveyEvent::Start).await.unwrap();
        handle.send(field(1300.0)).await.unwrap();
        snapshots
            .wait_for(|snapshot| snapshot.revolutions == 1)
            .await
            .unwrap();
        assert_eq!(handle.snapshot().waypoints.len(), 1);

        handle.send(SurveyEvent::Reset).await.unwrap();
        snapshots
            .wait_for(|snapshot| snapshot.waypoints.is_empty())
            .await
            .unwrap();

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rejected_settings_keep_previous_thresholds() {
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, None, 8);
        let task = tokio::spawn(worker.run());

        handle
            .send(SurveyEvent::ApplySettings(Settings {
                high_threshold: 10.0,
                low_threshold: 20.0,
                ..Default::default()
            }))
            .await
            .unwrap();

        drop(handle);
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.settings(), Settings::default());
    }

    #[tokio::test]
    async fn plain_samples_reuse_published_waypoints() {
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, None, 32);
        let mut snapshots = handle.subscribe();
        let task = tokio::spawn(worker.run());

        handle.send(SurveyEvent::Start).await.unwrap();
        handle.send(field(1300.0)).await.unwrap();
        let after_peak = snapshots
            .wait_for(|snapshot| snapshot.revolutions == 1)
            .await
            .unwrap()
            .clone();

        for step in 0..SNAPSHOT_EVERY {
            handle.send(field(600.0 + step as f64)).await.unwrap();
        }
        let last = 600.0 + (SNAPSHOT_EVERY - 1) as f64;
        let periodic = snapshots
            .wait_for(|snapshot| snapshot.current_magnitude == last)
            .await
            .unwrap()
            .clone();
        assert!(Arc::ptr_eq(&after_peak.waypoints, &periodic.waypoints));
        assert_eq!(periodic.history.len(), SNAPSHOT_EVERY + 1);

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn write_through_saves_land_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("survey.json")));
        let session = SurveySession::new(Settings::default()).unwrap();
        let (worker, handle) = session_channel(session, Some(store.clone()), 64);
        let task = tokio::spawn(worker.run());

        handle.send(SurveyEvent::Start).await.unwrap();
        for _ in 0..30 {
            handle.send(field(1300.0)).await.unwrap();
            handle.send(field(600.0)).await.unwrap();
        }
        handle.send(SurveyEvent::Save).await.unwrap();

        drop(handle);
        let session = task.await.unwrap().unwrap();
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.revolutions, 30);
        assert_eq!(saved.waypoints.len(), 30);
        assert_eq!(saved, session.to_state());
    }
}
