//! Flow pipeline telemetry.
//!
//! Lock-free atomic counters instrumenting the load/build/animate pipeline,
//! with a point-in-time snapshot for display. Recording is cheap enough to
//! call from the render path.
//!
//! ```text
//! Loader / Clock / Layer ────► FlowMetrics ────► TelemetrySnapshot ────► Views
//!                              (atomic counters)  (point-in-time copy)    (CLI, tests)
//! ```

mod metrics;
mod snapshot;

pub use metrics::FlowMetrics;
pub use snapshot::TelemetrySnapshot;
