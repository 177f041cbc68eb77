//! Compositor layer implementing the host's custom-layer contract.
//!
//! The layer is the bridge between the host's frame loop and the shared
//! guest scene: `on_add` resolves (or creates) the scene for the host,
//! `render` derives a fresh viewport and issues a filtered draw for this
//! layer only, and `on_remove` drops local references without touching the
//! scene. Render failures are logged and swallowed; an error must never
//! propagate into the host's frame.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::guest::{GuestLayer, GuestRenderer, LayerKind, LayerProps, PropsPatch};
use crate::host::{CustomLayer, GlContext, HostMap};
use crate::scene::SceneRegistry;
use crate::telemetry::FlowMetrics;
use crate::viewport::derive_viewport;

/// Lifecycle state of a compositor layer.
///
/// `Detached` is terminal: a layer removed from the style never re-attaches,
/// a new layer instance is mounted instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// Created but not yet added to a host style.
    Unattached,
    /// Added to a host style and rendering.
    Attached,
    /// Removed from the style. Terminal.
    Detached,
}

struct Inner {
    state: LayerState,
    props: LayerProps,
    host: Option<Arc<dyn HostMap>>,
}

/// A trips layer inserted into the host's style.
pub struct CompositorLayer {
    id: String,
    renderer: Arc<dyn GuestRenderer>,
    registry: Arc<SceneRegistry>,
    metrics: Arc<FlowMetrics>,
    inner: Mutex<Inner>,
}

impl CompositorLayer {
    /// Create an unattached layer with the given initial props.
    pub fn new(
        id: impl Into<String>,
        props: LayerProps,
        renderer: Arc<dyn GuestRenderer>,
        registry: Arc<SceneRegistry>,
        metrics: Arc<FlowMetrics>,
    ) -> Self {
        Self {
            id: id.into(),
            renderer,
            registry,
            metrics,
            inner: Mutex::new(Inner {
                state: LayerState::Unattached,
                props,
                host: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LayerState {
        self.inner.lock().state
    }

    /// Merge a partial props update and push the result into the scene.
    ///
    /// While unattached the merge is stored and applied on attach; after
    /// detach it is a no-op for the scene.
    pub fn set_props(&self, patch: &PropsPatch) {
        let mut inner = self.inner.lock();
        patch.apply(&mut inner.props);
        if inner.state != LayerState::Attached {
            return;
        }
        let Some(host) = inner.host.clone() else {
            return;
        };
        let layer = GuestLayer {
            id: self.id.clone(),
            kind: LayerKind::Trips,
            props: inner.props.clone(),
        };
        drop(inner);
        self.registry.upsert_layer(host.instance_id(), layer);
    }
}

impl CustomLayer for CompositorLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_add(&self, host: &Arc<dyn HostMap>, gl: &GlContext) {
        let layer = {
            let mut inner = self.inner.lock();
            if inner.state == LayerState::Detached {
                warn!(layer = %self.id, "Ignoring on_add for a detached layer");
                return;
            }
            inner.state = LayerState::Attached;
            inner.host = Some(Arc::clone(host));
            GuestLayer {
                id: self.id.clone(),
                kind: LayerKind::Trips,
                props: inner.props.clone(),
            }
        };

        if let Err(err) =
            self.registry
                .get_or_create(host, gl, layer, &self.renderer, &self.metrics)
        {
            warn!(layer = %self.id, error = %err, "Failed to resolve guest scene");
            let mut inner = self.inner.lock();
            inner.state = LayerState::Unattached;
            inner.host = None;
            return;
        }
        debug!(layer = %self.id, host = host.instance_id(), "Layer attached");
    }

    fn render(&self, _gl: &GlContext) {
        let host = {
            let inner = self.inner.lock();
            if inner.state != LayerState::Attached {
                return;
            }
            match inner.host.clone() {
                Some(host) => host,
                None => return,
            }
        };

        // Camera state can change between any two frames; always derive the
        // viewport from the host at draw time.
        let viewport = derive_viewport(host.as_ref());
        match self.registry.draw(host.instance_id(), &viewport, &self.id) {
            Ok(true) => self.metrics.draw_call(),
            Ok(false) => {}
            Err(err) => {
                warn!(layer = %self.id, error = %err, "Draw failed, skipping frame");
                self.metrics.render_error();
            }
        }
    }

    fn on_remove(&self) {
        let mut inner = self.inner.lock();
        inner.state = LayerState::Detached;
        inner.host = None;
        // The shared scene stays alive for other layers and future mounts;
        // only the host Remove event destroys it.
        debug!(layer = %self.id, "Layer detached");
    }
}
