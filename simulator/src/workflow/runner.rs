use crate::generator::profile::build_survey_events;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use cavecore::geometry::Point2D;
use cavecore::mapping::ReconstructedPath;
use cavecore::pipeline::{session_channel, SurveyEvent};
use cavecore::storage::{StateStore, SurveyState};
use cavecore::survey::{SessionSnapshot, SurveySession, Waypoint};
use cavecore::telemetry::MetricsSnapshot;
use log::info;
use std::sync::Arc;

pub struct WorkflowResult {
    pub revolutions: u64,
    pub distance_m: f64,
    pub waypoints: Vec<Waypoint>,
    pub path: ReconstructedPath,
    pub snapshot: SessionSnapshot,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Walks the configured legs through a session worker, resuming from
    /// `store` when it holds a previous survey.
    pub async fn execute(
        &self,
        store: Option<Arc<dyn StateStore>>,
        reset: bool,
    ) -> anyhow::Result<WorkflowResult> {
        let state = match &store {
            Some(store) => store.load().context("loading stored survey state")?,
            None => None,
        }
        .unwrap_or_else(|| SurveyState {
            settings: self.config.settings,
            ..Default::default()
        });

        let settings = self.config.settings;
        let mut session = SurveySession::restore(state).context("restoring survey session")?;
        session
            .apply_settings(settings)
            .context("applying workflow settings")?;
        let events = build_survey_events(&self.config.generator, &self.config.legs, &settings)
            .context("generating sensor stream")?;
        info!(
            "streaming {} sensor events over {:.2} m of planned legs",
            events.len(),
            self.config.planned_distance_m()
        );

        let (worker, handle) = session_channel(session, store, self.config.channel_capacity);
        let metrics = handle.metrics();
        let worker_task = tokio::spawn(worker.run());

        let producer = tokio::spawn(async move {
            if reset {
                handle.send(SurveyEvent::Reset).await?;
            }
            for event in events {
                handle.send(event).await?;
            }
            Ok::<(), cavecore::CoreError>(())
        });

        producer
            .await
            .context("joining sensor producer")?
            .context("streaming sensor events")?;
        let session = worker_task
            .await
            .context("joining session worker")?
            .context("running session worker")?;

        Ok(WorkflowResult {
            revolutions: session.revolutions(),
            distance_m: session.distance_m(),
            waypoints: session.waypoints().to_vec(),
            path: session.path(Point2D::ORIGIN),
            snapshot: session.snapshot(),
            metrics: metrics.snapshot(),
        })
    }
}
