use crate::gui_bridge::model::MapModel;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::Runner;
use anyhow::{anyhow, Result};
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct BridgeError;

impl warp::reject::Reject for BridgeError {}

type SharedModel = Arc<RwLock<MapModel>>;

/// Hosts the map HTTP endpoint polled by the visualizer.
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    /// Shares map state without binding a socket.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(RwLock::new(MapModel::default())),
        }
    }

    pub fn serve(address: SocketAddr) -> Self {
        let bridge = Self::detached();
        let state_for_filter = bridge.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());

        let map_route = warp::path("map")
            .and(warp::get())
            .and(state_filter.clone())
            .and_then(|state: SharedModel| async move {
                let reply = match state.read() {
                    Ok(model) => Ok(warp::reply::json(&*model)),
                    Err(_) => Err(warp::reject::custom(BridgeError)),
                };
                reply
            });

        let scenario_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and_then(|config: WorkflowConfig, state: SharedModel| async move {
                let scenario = config.generator.scenario.clone();
                let description = config.generator.description.clone().unwrap_or_default();
                let runner = Runner::new(config);
                match runner.execute(None, false).await {
                    Ok(result) => {
                        let model = MapModel::from_snapshot(result.snapshot);
                        match state.write() {
                            Ok(mut guard) => *guard = model,
                            Err(_) => return Err(warp::reject::custom(BridgeError)),
                        }
                        if let Some(name) = scenario.as_ref() {
                            info!(
                                "[GUI] scenario {} -> {} revolutions",
                                name, result.revolutions
                            );
                        }
                        Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "ok",
                                "revolutions": result.revolutions,
                                "distance_m": result.distance_m,
                                "description": description
                            })),
                            StatusCode::OK,
                        ))
                    }
                    Err(err) => {
                        error!("ingest-config error: {:#}", err);
                        Err(warp::reject::custom(BridgeError))
                    }
                }
            });

        thread::spawn(move || {
            let routes = map_route.or(scenario_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                info!("[GUI] serving stick map on http://{}/map", address);
                warp::serve(routes).run(address).await;
            });
        });

        bridge
    }

    pub fn publish(&self, model: &MapModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("map state lock poisoned"))?;
        *guard = model.clone();
        info!(
            "[GUI] map points: {}, stations: {}, revolutions: {}",
            guard.polyline.len(),
            guard.stations.len(),
            guard.snapshot.revolutions
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<MapModel> {
        self.state.read().ok().map(|model| model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::runner::Runner;

    #[tokio::test]
    async fn gui_bridge_updates_state() {
        let cfg = WorkflowConfig::from_args(1170.0, 1000.0, 11.78);
        let runner = Runner::new(cfg);
        let result = runner.execute(None, false).await.unwrap();
        let gui = GuiBridge::detached();
        let model = MapModel::from_snapshot(result.snapshot.clone());
        gui.publish(&model).unwrap();

        let published = gui.snapshot().unwrap();
        assert_eq!(published.snapshot.revolutions, result.revolutions);
        assert_eq!(published.polyline.len(), result.waypoints.len());
        assert_eq!(published.stations.len(), 2);
    }
}
