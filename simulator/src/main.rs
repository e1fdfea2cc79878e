use anyhow::Context;
use clap::Parser;
use generator::profile::{build_frames, FeedGenerator};
use gui_bridge::bridge::{gui_bind_address, FeedHub, GuiBridge};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Telemetry feed driver for the racing radar")]
struct Args {
    /// Run a synthetic session offline and emit a continuity summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Radar inclusion radius in metres
    #[arg(long, default_value_t = 30.0)]
    radius: f64,
    /// Display radius in pixels
    #[arg(long, default_value_t = 150.0)]
    pixel_radius: f64,
    /// Number of synthetic cars around the player
    #[arg(long, default_value_t = 8)]
    cars: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Override the number of offline frames
    #[arg(long)]
    frames: Option<usize>,
    /// Serve frames over HTTP for displays (Ctrl+C to stop)
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Only serve frames POSTed to /ingest; no synthetic feed
    #[arg(long, default_value_t = false)]
    external: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.radius, args.pixel_radius, args.cars, args.seed)
    };
    if let Some(frames) = args.frames {
        workflow_config.frames = frames;
    }
    workflow_config
        .validate()
        .context("validating workflow config")?;

    if args.offline {
        let frames = build_frames(
            &workflow_config.scenario,
            workflow_config.frames,
            workflow_config.update_rate_hz,
        )?;
        let runner = Runner::new(workflow_config.clone());
        let result = runner.execute(&frames)?;

        println!(
            "Offline run -> frames {}, peak visible {}, max yaw step {:.4} rad, max bearing step {:.4} rad",
            result.frames_processed,
            result.peak_visible,
            result.max_yaw_step,
            result.max_bearing_step
        );
        if let Some(nearest) = result.last_frame.as_ref().and_then(|frame| frame.nearest()) {
            println!(
                "Nearest car at end: {} at {:.1} m",
                nearest.classification.label(),
                nearest.distance_meters
            );
        }

        let classes = result
            .class_counts
            .iter()
            .map(|(class, count)| format!("{}={}", class.label(), count))
            .collect::<Vec<_>>()
            .join(",");
        let report = format!(
            "frames={} radius={} peak_visible={} max_yaw_step={:.5} max_bearing_step={:.5} classes=[{}]\n",
            result.frames_processed,
            runner.config().engine.radius_meters,
            result.peak_visible,
            result.max_yaw_step,
            result.max_bearing_step,
            classes
        );
        let report_path = PathBuf::from("tools/data/offline_radar.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        file.write_all(report.as_bytes())?;
    }

    if args.serve {
        let hub = Arc::new(
            FeedHub::new(workflow_config.to_engine_config()).context("creating feed hub")?,
        );
        let generator = if args.external {
            None
        } else {
            Some(FeedGenerator::new(
                workflow_config.scenario.clone(),
                workflow_config.update_rate_hz,
            )?)
        };
        let bridge = GuiBridge::spawn(
            hub,
            gui_bind_address(workflow_config.port),
            generator,
            workflow_config.update_rate_hz,
        );
        bridge.publish_status(&format!(
            "feed on http://{} at {} Hz (Ctrl+C to stop)...",
            gui_bind_address(workflow_config.port),
            workflow_config.update_rate_hz
        ));

        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;

        let metrics = bridge.hub().metrics_snapshot().metrics;
        bridge.publish_status(&format!(
            "stopped after {} frames ({} rejected, {} resets)",
            metrics.ingested, metrics.rejected, metrics.resets
        ));
    }

    Ok(())
}
