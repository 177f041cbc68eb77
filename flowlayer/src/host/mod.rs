//! Host map abstraction.
//!
//! The host is the externally-owned tiled map renderer. It owns the canvas,
//! the GL context, and the camera; this crate only ever observes it. All
//! interaction goes through the [`HostMap`] trait so that the compositor can
//! be driven by a real map engine binding or by the in-process
//! [`SimulatedHost`] used by the CLI and the integration tests.
//!
//! # Context injection
//!
//! The compositor never creates a GL context of its own. Hosts mint
//! [`GlContext`] handles bound to their instance id, and the scene registry
//! refuses to build a guest scene from a context owned by a different host.
//! This is the invariant that prevents double-context corruption between the
//! two renderers.

mod simulated;
mod types;

pub use simulated::SimulatedHost;
pub use types::{
    CustomLayer, EventHandler, GlContext, HostCamera, HostError, HostEvent, HostId, HostMap,
    ListenerId, Padding,
};
