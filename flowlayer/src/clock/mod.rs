//! Animation clock driving the trips layer.
//!
//! A background task ticks at the configured frame interval, maps elapsed
//! wall time onto the animation loop, pushes the new current time into the
//! layer, and asks the host for a repaint. The task runs until its
//! cancellation token fires; the lifecycle controller cancels it during
//! teardown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::guest::PropsPatch;
use crate::host::HostMap;
use crate::layer::CompositorLayer;
use crate::telemetry::FlowMetrics;
use crate::trip::LoopClock;

/// Handle to the running animation task.
pub struct AnimationClock {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AnimationClock {
    /// Spawn the animation task.
    ///
    /// Every applied frame merges a current-time patch into the layer's
    /// props and triggers a host repaint. Ticks that arrive inside the
    /// frame interval are skipped and counted, never applied.
    pub fn start(
        layer: Arc<CompositorLayer>,
        host: Arc<dyn HostMap>,
        loop_clock: LoopClock,
        frame_interval: Duration,
        cancel: CancellationToken,
        metrics: Arc<FlowMetrics>,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let started = Instant::now();
            let mut last_applied: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Some(prev) = last_applied {
                            if prev.elapsed() < frame_interval {
                                metrics.frame_skipped();
                                continue;
                            }
                        }
                        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
                        let current_time = loop_clock.current_time_ms(elapsed_ms);
                        layer.set_props(&PropsPatch::current_time(current_time));
                        host.trigger_repaint();
                        metrics.frame_applied();
                        last_applied = Some(Instant::now());
                    }
                }
            }
            debug!("Animation clock stopped");
        });

        Self {
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the task to stop at its next tick boundary.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
