//! Simulate command - run the flow animation against an in-process host.
//!
//! Mounts the flow layer on a [`SimulatedHost`] with the headless guest
//! renderer, pumps frames at the requested rate, and prints the telemetry
//! snapshot at the end. Useful for checking route files and animation
//! parameters without a real map engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use flowlayer::config::FlowConfig;
use flowlayer::guest::{GuestRenderer, HeadlessRenderer};
use flowlayer::host::SimulatedHost;
use flowlayer::lifecycle::FlowLayer;
use flowlayer::scene::SceneRegistry;

use crate::error::CliError;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    /// Route file URLs; falls back to the configured ones when empty.
    pub routes: Vec<String>,
    /// How long to run, in seconds.
    pub duration_secs: u64,
    /// Host paint rate in frames per second.
    pub fps: u32,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let config = super::resolve_flow_config(args.routes)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to install signal handler: {}", e)))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(simulate(config, args.duration_secs, args.fps, interrupted))
}

async fn simulate(
    config: FlowConfig,
    duration_secs: u64,
    fps: u32,
    interrupted: Arc<AtomicBool>,
) -> Result<(), CliError> {
    let host = SimulatedHost::new();
    let renderer = Arc::new(HeadlessRenderer::new());

    let layer = FlowLayer::builder(config)
        .with_guest_renderer(renderer.clone() as Arc<dyn GuestRenderer>)
        .with_registry(SceneRegistry::new())
        .build()?;
    let metrics = layer.metrics();

    let handle = layer
        .mount(host.clone(), |detail| match detail.message {
            Some(message) => info!(status = %detail.status, %message, "Simulation ended"),
            None => info!(status = %detail.status, "Simulation ended"),
        })
        .await;

    host.finish_style_load();
    handle.mounted().await;

    let paint_interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(duration_secs);
    while tokio::time::Instant::now() < deadline && !interrupted.load(Ordering::SeqCst) {
        tokio::time::sleep(paint_interval).await;
        if host.repaint_pending() {
            host.draw_frame();
        }
    }

    handle.unmount();
    println!("{}", metrics.snapshot());
    println!("host frames painted: {}", host.frames_drawn());
    Ok(())
}
