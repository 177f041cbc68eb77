//! FlowLayer - animated particle-flow routes over an external map renderer
//!
//! This library renders animated particle flows along GeoJSON routes on top
//! of an externally-owned tiled map renderer. The host map keeps ownership
//! of its canvas, GL context, and camera; FlowLayer attaches a compositor
//! layer through the host's custom-layer contract and drives a guest
//! instanced renderer through the host's existing GL context, never its own.
//!
//! # Example
//!
//! ```ignore
//! use flowlayer::config::FlowConfig;
//! use flowlayer::lifecycle::FlowLayer;
//!
//! let config = FlowConfig::new(vec!["https://example.org/routes.json".into()]);
//! let layer = FlowLayer::builder(config).build()?;
//! let handle = layer.mount(host, |detail| {
//!     println!("flow ended: {}", detail.status);
//! }).await;
//! // ... later
//! handle.unmount();
//! ```

pub mod clock;
pub mod config;
pub mod coord;
pub mod guest;
pub mod host;
pub mod layer;
pub mod lifecycle;
pub mod logging;
pub mod route;
pub mod scene;
pub mod telemetry;
pub mod trip;
pub mod viewport;

pub use config::FlowConfig;
pub use lifecycle::{CleanupDetail, CleanupStatus, FailureReason, FlowHandle, FlowLayer};
