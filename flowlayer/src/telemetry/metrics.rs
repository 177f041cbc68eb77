//! Atomic counters for the flow pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::TelemetrySnapshot;

/// Counters recorded by the loader, the animation clock, and the compositor
/// layer. All methods are lock-free and safe to call from any thread.
#[derive(Debug)]
pub struct FlowMetrics {
    started_at: Instant,
    route_files_loaded: AtomicU64,
    route_files_failed: AtomicU64,
    paths_loaded: AtomicU64,
    paths_discarded: AtomicU64,
    trips_built: AtomicU64,
    frames_applied: AtomicU64,
    frames_skipped: AtomicU64,
    draw_calls: AtomicU64,
    render_errors: AtomicU64,
    viewport_updates: AtomicU64,
}

impl FlowMetrics {
    /// Create a fresh set of counters.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            route_files_loaded: AtomicU64::new(0),
            route_files_failed: AtomicU64::new(0),
            paths_loaded: AtomicU64::new(0),
            paths_discarded: AtomicU64::new(0),
            trips_built: AtomicU64::new(0),
            frames_applied: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            draw_calls: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            viewport_updates: AtomicU64::new(0),
        }
    }

    /// A route file was fetched and parsed successfully.
    pub fn route_file_loaded(&self) {
        self.route_files_loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// A route file failed to fetch or parse and was skipped.
    pub fn route_file_failed(&self) {
        self.route_files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Valid paths extracted from route files.
    pub fn paths_loaded(&self, count: u64) {
        self.paths_loaded.fetch_add(count, Ordering::Relaxed);
    }

    /// Paths discarded for having fewer than two vertices.
    pub fn paths_discarded(&self, count: u64) {
        self.paths_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Trips produced by the trip builder.
    pub fn trips_built(&self, count: u64) {
        self.trips_built.fetch_add(count, Ordering::Relaxed);
    }

    /// The animation clock applied a frame (pushed a new current time).
    pub fn frame_applied(&self) {
        self.frames_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// The animation clock skipped a tick inside the frame interval.
    pub fn frame_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// The compositor layer issued a filtered draw into the guest scene.
    pub fn draw_call(&self) {
        self.draw_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// A draw failed; the error was logged and swallowed.
    pub fn render_error(&self) {
        self.render_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A viewport was pushed to the guest scene from a host move event.
    pub fn viewport_update(&self) {
        self.viewport_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: self.started_at.elapsed(),
            route_files_loaded: self.route_files_loaded.load(Ordering::Relaxed),
            route_files_failed: self.route_files_failed.load(Ordering::Relaxed),
            paths_loaded: self.paths_loaded.load(Ordering::Relaxed),
            paths_discarded: self.paths_discarded.load(Ordering::Relaxed),
            trips_built: self.trips_built.load(Ordering::Relaxed),
            frames_applied: self.frames_applied.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            draw_calls: self.draw_calls.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            viewport_updates: self.viewport_updates.load(Ordering::Relaxed),
        }
    }
}

impl Default for FlowMetrics {
    fn default() -> Self {
        Self::new()
    }
}
