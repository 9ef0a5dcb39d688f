use anyhow::Context;
use cavecore::storage::{JsonFileStore, MemoryStore, StateStore};
use cavecore::survey::export_csv;
use clap::Parser;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use gui_bridge::model::MapModel;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Magnet-wheel odometer survey driver")]
struct Args {
    /// Walk the configured legs once and print a survey summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 1170.0)]
    high_threshold: f64,
    #[arg(long, default_value_t = 1000.0)]
    low_threshold: f64,
    /// Wheel circumference in centimeters
    #[arg(long, default_value_t = 11.78)]
    wheel_circumference: f64,
    /// JSON file holding settings, revolution count and the waypoint log
    #[arg(long)]
    store: Option<PathBuf>,
    /// Clear the stored survey before walking
    #[arg(long, default_value_t = false)]
    reset: bool,
    /// Write the waypoint log as CSV
    #[arg(long)]
    export: Option<PathBuf>,
    /// Append a one-line run summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the map bridge alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        let config = WorkflowConfig::from_args(
            args.high_threshold,
            args.low_threshold,
            args.wheel_circumference,
        );
        config
            .settings
            .validate()
            .context("validating odometer settings from arguments")?;
        config
    };

    let store = open_store(args.store.as_deref(), args.reset)?;

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating survey runtime")?;
    let runner = Runner::new(workflow_config);
    let gui_bridge = if args.serve {
        GuiBridge::serve(gui_bind_address())
    } else {
        GuiBridge::detached()
    };

    if args.offline {
        let result = runtime.block_on(runner.execute(Some(store.clone()), false))?;

        println!(
            "Offline survey -> revolutions {}, distance {:.2} m, waypoints {}, samples {} ({} dropped)",
            result.revolutions,
            result.distance_m,
            result.waypoints.len(),
            result.metrics.samples_processed,
            result.metrics.samples_dropped
        );
        let end = result.path.end();
        println!(
            "Path end ({:.2}, {:.2}) m from start, extent {:.2} x {:.2} m",
            end.x,
            end.y,
            result.path.bounding_box.width(),
            result.path.bounding_box.height()
        );

        gui_bridge.publish(&MapModel::from_snapshot(result.snapshot.clone()))?;
        gui_bridge.publish_status("Offline survey map ready.");

        if let Some(path) = args.export.as_ref() {
            export_csv(path, &result.waypoints)
                .with_context(|| format!("exporting waypoints to {}", path.display()))?;
            info!("exported {} waypoints to {}", result.waypoints.len(), path.display());
        }

        if let Some(report_path) = args.report.as_ref() {
            let report = format!(
                "revolutions={} distance_m={:.2} waypoints={} peaks={}\n",
                result.revolutions,
                result.distance_m,
                result.waypoints.len(),
                result.metrics.peaks_accepted
            );
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(report_path)
                .with_context(|| format!("opening report {}", report_path.display()))?;
            file.write_all(report.as_bytes())?;
        }
    } else if let Some(path) = args.export.as_ref() {
        let state = store
            .load()
            .context("loading stored survey for export")?
            .unwrap_or_default();
        export_csv(path, &state.waypoints)
            .with_context(|| format!("exporting waypoints to {}", path.display()))?;
        info!("exported {} stored waypoints", state.waypoints.len());
    }

    if args.serve {
        if !args.offline {
            if let Some(state) = store.load().context("loading stored survey")? {
                let session = cavecore::survey::SurveySession::restore(state)
                    .context("restoring stored survey")?;
                gui_bridge.publish(&MapModel::from_snapshot(session.snapshot()))?;
            }
        }
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

/// Opens the survey store, wiping any saved survey first when `reset` is set.
fn open_store(path: Option<&Path>, reset: bool) -> anyhow::Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };
    if reset {
        store.clear().context("clearing stored survey")?;
        info!("stored survey cleared");
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cavecore::storage::SurveyState;

    #[test]
    fn reset_flag_clears_stored_survey() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.json");
        JsonFileStore::new(&path)
            .save(&SurveyState {
                revolutions: 5,
                ..Default::default()
            })
            .unwrap();

        let kept = open_store(Some(path.as_path()), false).unwrap();
        assert_eq!(kept.load().unwrap().unwrap().revolutions, 5);

        let cleared = open_store(Some(path.as_path()), true).unwrap();
        assert!(cleared.load().unwrap().is_none());
        assert!(!path.exists());
    }
}
