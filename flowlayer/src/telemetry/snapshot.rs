//! Point-in-time view of flow metrics.

use std::fmt;
use std::time::Duration;

/// A copy of all pipeline counters at one moment.
///
/// Produced by [`super::FlowMetrics::snapshot`]; plain data, safe to hand to
/// display code without further synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Time since the metrics were created.
    pub uptime: Duration,
    /// Route files fetched and parsed successfully.
    pub route_files_loaded: u64,
    /// Route files skipped after a fetch or parse failure.
    pub route_files_failed: u64,
    /// Valid paths extracted across all route files.
    pub paths_loaded: u64,
    /// Paths discarded for having fewer than two vertices.
    pub paths_discarded: u64,
    /// Trips produced by the trip builder.
    pub trips_built: u64,
    /// Animation frames applied (current time pushed to the layer).
    pub frames_applied: u64,
    /// Animation ticks skipped inside the frame interval.
    pub frames_skipped: u64,
    /// Filtered draws issued into the guest scene.
    pub draw_calls: u64,
    /// Draw errors that were logged and swallowed.
    pub render_errors: u64,
    /// Viewport pushes triggered by host move events.
    pub viewport_updates: u64,
}

impl TelemetrySnapshot {
    /// Fraction of animation ticks that applied a frame, in `[0, 1]`.
    pub fn frame_apply_ratio(&self) -> f64 {
        let total = self.frames_applied + self.frames_skipped;
        if total == 0 {
            return 0.0;
        }
        self.frames_applied as f64 / total as f64
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "routes: {} loaded, {} failed ({} paths, {} discarded)",
            self.route_files_loaded,
            self.route_files_failed,
            self.paths_loaded,
            self.paths_discarded
        )?;
        writeln!(f, "trips:  {}", self.trips_built)?;
        writeln!(
            f,
            "frames: {} applied, {} skipped, {} draws, {} render errors",
            self.frames_applied, self.frames_skipped, self.draw_calls, self.render_errors
        )?;
        write!(f, "moves:  {} viewport updates", self.viewport_updates)
    }
}
