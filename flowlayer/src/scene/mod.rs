//! Shared guest scene registry.
//!
//! Exactly one guest scene exists per host instance. It is created lazily
//! when the first compositor layer attaches, shared by every layer attached
//! to that host afterwards, and destroyed only when the host itself fires
//! `Remove`. Creating a second scene for a host would double GPU memory and
//! desync render order, so `get_or_create` is idempotent even under
//! concurrent calls.
//!
//! All layer-list mutation is replace-by-id; the full list is never blindly
//! overwritten from outside.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::guest::{GuestLayer, GuestRenderError, GuestRenderer, GuestScene};
use crate::host::{GlContext, HostEvent, HostId, HostMap, ListenerId};
use crate::telemetry::FlowMetrics;
use crate::viewport::{derive_viewport, Viewport};

/// Errors from scene resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The GL context handle belongs to a different host than the one the
    /// layer is attaching to. Building a scene from it would mix contexts
    /// between hosts.
    ForeignContext {
        context_host: HostId,
        host: HostId,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::ForeignContext { context_host, host } => write!(
                f,
                "GL context belongs to host {} but layer is attaching to host {}",
                context_host, host
            ),
        }
    }
}

impl std::error::Error for SceneError {}

struct SceneEntry {
    scene: Box<dyn GuestScene>,
    layers: Vec<GuestLayer>,
    listeners: Vec<ListenerId>,
}

/// Registry mapping host instances to their single shared guest scene.
pub struct SceneRegistry {
    weak_self: Weak<SceneRegistry>,
    scenes: DashMap<HostId, SceneEntry>,
}

impl SceneRegistry {
    /// Create an empty registry.
    ///
    /// Returns an `Arc` so the registry can hand weak references to itself
    /// to the host event listeners it registers.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak_self: weak.clone(),
            scenes: DashMap::new(),
        })
    }

    /// Process-wide registry used when no explicit registry is injected.
    ///
    /// Scenes must outlive individual layer mounts, so the default scope is
    /// the process. Tests inject their own registries to stay isolated.
    pub fn global() -> Arc<SceneRegistry> {
        static GLOBAL: OnceLock<Arc<SceneRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(SceneRegistry::new))
    }

    /// Resolve the host's scene, creating it on first attach.
    ///
    /// If the host already has a scene, `initial_layer` is appended or
    /// replaced by id in its layer list; a second scene is never created.
    /// Otherwise a scene is built from the host's existing GL context and
    /// two listeners are registered: a `Move` listener that pushes a fresh
    /// viewport (without forcing a repaint), and a `Remove` listener that
    /// is the only path allowed to destroy the scene.
    pub fn get_or_create(
        &self,
        host: &Arc<dyn HostMap>,
        gl: &GlContext,
        initial_layer: GuestLayer,
        renderer: &Arc<dyn GuestRenderer>,
        metrics: &Arc<FlowMetrics>,
    ) -> Result<(), SceneError> {
        let host_id = host.instance_id();
        if gl.host_id() != host_id {
            return Err(SceneError::ForeignContext {
                context_host: gl.host_id(),
                host: host_id,
            });
        }

        match self.scenes.entry(host_id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                upsert(&mut entry.layers, initial_layer);
                entry.scene.set_layers(&entry.layers);
                debug!(host = host_id, layers = entry.layers.len(), "Reusing guest scene");
            }
            Entry::Vacant(vacant) => {
                let mut scene = renderer.create_scene(gl);
                let layers = vec![initial_layer];
                scene.set_layers(&layers);
                scene.set_viewport(&derive_viewport(host.as_ref()));

                let listeners = vec![
                    self.register_move_listener(host, host_id, metrics),
                    self.register_remove_listener(host),
                ];

                vacant.insert(SceneEntry {
                    scene,
                    layers,
                    listeners,
                });
                debug!(host = host_id, context = gl.context_id(), "Created guest scene");
            }
        }

        Ok(())
    }

    /// Replace the layer with `layer.id` in place, or append it.
    ///
    /// No-op if the host has no scene (e.g. already destroyed).
    pub fn upsert_layer(&self, host_id: HostId, layer: GuestLayer) {
        if let Some(mut entry) = self.scenes.get_mut(&host_id) {
            upsert(&mut entry.layers, layer);
            let layers = std::mem::take(&mut entry.layers);
            entry.scene.set_layers(&layers);
            entry.layers = layers;
        }
    }

    /// Push a viewport to the host's scene without drawing.
    pub fn set_viewport(&self, host_id: HostId, viewport: &Viewport) {
        if let Some(mut entry) = self.scenes.get_mut(&host_id) {
            entry.scene.set_viewport(viewport);
        }
    }

    /// Draw a single layer by id with the given viewport.
    ///
    /// Returns `Ok(false)` when the host has no scene yet (or anymore);
    /// callers treat that as a silent no-op.
    pub fn draw(
        &self,
        host_id: HostId,
        viewport: &Viewport,
        layer_id: &str,
    ) -> Result<bool, GuestRenderError> {
        match self.scenes.get_mut(&host_id) {
            Some(mut entry) => {
                entry.scene.draw(viewport, layer_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the host currently has a scene.
    pub fn has_scene(&self, host_id: HostId) -> bool {
        self.scenes.contains_key(&host_id)
    }

    /// Number of layers in the host's scene, if any.
    pub fn layer_count(&self, host_id: HostId) -> usize {
        self.scenes
            .get(&host_id)
            .map(|entry| entry.layers.len())
            .unwrap_or(0)
    }

    /// Destroy the host's scene: detach listeners and release resources.
    ///
    /// Only called from the host `Remove` listener; layer unmounts never
    /// reach this.
    fn destroy(&self, host: &dyn HostMap) {
        let host_id = host.instance_id();
        if let Some((_, mut entry)) = self.scenes.remove(&host_id) {
            entry.scene.release();
            for listener in entry.listeners.drain(..) {
                host.off(listener);
            }
            debug!(host = host_id, "Destroyed guest scene");
        }
    }

    fn register_move_listener(
        &self,
        host: &Arc<dyn HostMap>,
        host_id: HostId,
        metrics: &Arc<FlowMetrics>,
    ) -> ListenerId {
        let registry = self.weak_self.clone();
        let host_weak = Arc::downgrade(host);
        let metrics = Arc::clone(metrics);
        host.on(
            HostEvent::Move,
            Arc::new(move || {
                let (Some(registry), Some(host)) = (registry.upgrade(), host_weak.upgrade())
                else {
                    return;
                };
                let viewport = derive_viewport(host.as_ref());
                registry.set_viewport(host_id, &viewport);
                metrics.viewport_update();
            }),
        )
    }

    fn register_remove_listener(&self, host: &Arc<dyn HostMap>) -> ListenerId {
        let registry: Weak<SceneRegistry> = self.weak_self.clone();
        let host_weak = Arc::downgrade(host);
        host.on(
            HostEvent::Remove,
            Arc::new(move || {
                let (Some(registry), Some(host)) = (registry.upgrade(), host_weak.upgrade())
                else {
                    return;
                };
                registry.destroy(host.as_ref());
            }),
        )
    }
}

fn upsert(layers: &mut Vec<GuestLayer>, layer: GuestLayer) {
    match layers.iter_mut().find(|l| l.id == layer.id) {
        Some(existing) => *existing = layer,
        None => layers.push(layer),
    }
}
