//! In-process host map implementation.
//!
//! `SimulatedHost` implements [`HostMap`] with the same observable behavior
//! as a real map engine binding: layers can only be added once the style is
//! loaded, events fan out to registered listeners, repaints are requested
//! asynchronously and consumed by an explicit frame pump. The CLI's headless
//! simulation and the integration tests both run against it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::types::{
    CustomLayer, EventHandler, GlContext, HostCamera, HostError, HostEvent, HostId, HostMap,
    ListenerId,
};

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// A host map that lives entirely in-process.
///
/// Construct with [`SimulatedHost::new`], which returns an `Arc` so the host
/// can hand references to itself to layers during `on_add`.
pub struct SimulatedHost {
    id: HostId,
    gl: GlContext,
    weak_self: Weak<SimulatedHost>,
    camera: Mutex<HostCamera>,
    container_size: Mutex<(u32, u32)>,
    style_loaded: AtomicBool,
    removed: AtomicBool,
    layers: Mutex<Vec<Arc<dyn CustomLayer>>>,
    sources: Mutex<HashSet<String>>,
    listeners: Mutex<Vec<(ListenerId, HostEvent, EventHandler)>>,
    next_listener: AtomicU64,
    repaint_requests: AtomicU64,
    frames_drawn: AtomicU64,
}

impl SimulatedHost {
    /// Create a new host with a fresh instance id and GL context.
    pub fn new() -> Arc<Self> {
        let id = NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed);
        Arc::new_cyclic(|weak| Self {
            id,
            gl: GlContext::for_host(id, id),
            weak_self: weak.clone(),
            camera: Mutex::new(HostCamera::default()),
            container_size: Mutex::new((1280, 720)),
            style_loaded: AtomicBool::new(false),
            removed: AtomicBool::new(false),
            layers: Mutex::new(Vec::new()),
            sources: Mutex::new(HashSet::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            repaint_requests: AtomicU64::new(0),
            frames_drawn: AtomicU64::new(0),
        })
    }

    /// Mark the style as loaded and fire `Load` followed by `StyleLoad`.
    pub fn finish_style_load(&self) {
        self.style_loaded.store(true, Ordering::SeqCst);
        self.fire(HostEvent::Load);
        self.fire(HostEvent::StyleLoad);
    }

    /// Update the camera and fire a `Move` event.
    pub fn move_camera(&self, camera: HostCamera) {
        *self.camera.lock() = camera;
        self.fire(HostEvent::Move);
    }

    /// Resize the canvas.
    pub fn set_container_size(&self, width: u32, height: u32) {
        *self.container_size.lock() = (width, height);
    }

    /// Register a source id, mirroring `addSource` on a real host.
    pub fn add_source(&self, id: &str) {
        self.sources.lock().insert(id.to_string());
    }

    /// Paint one frame: consumes any pending repaint request and calls
    /// `render` on every layer in insertion order.
    pub fn draw_frame(&self) {
        self.repaint_requests.store(0, Ordering::SeqCst);
        let layers: Vec<Arc<dyn CustomLayer>> = self.layers.lock().clone();
        for layer in layers {
            layer.render(&self.gl);
        }
        self.frames_drawn.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether a repaint has been requested since the last drawn frame.
    pub fn repaint_pending(&self) -> bool {
        self.repaint_requests.load(Ordering::SeqCst) > 0
    }

    /// Total frames painted via [`SimulatedHost::draw_frame`].
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn.load(Ordering::Relaxed)
    }

    /// Number of layers currently in the style.
    pub fn layer_count(&self) -> usize {
        self.layers.lock().len()
    }

    /// Tear the host down: fires `Remove`, then detaches all layers.
    ///
    /// The `Remove` event fires first so subscribers (the scene registry)
    /// can release GPU resources while the host still exists.
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.fire(HostEvent::Remove);
        let layers: Vec<Arc<dyn CustomLayer>> = self.layers.lock().drain(..).collect();
        for layer in layers {
            layer.on_remove();
        }
        self.listeners.lock().clear();
    }

    /// Dispatch an event to all listeners registered for it.
    ///
    /// Handlers are invoked outside the listener lock so they may call
    /// `on`/`off` reentrantly.
    fn fire(&self, event: HostEvent) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn self_arc(&self) -> Option<Arc<dyn HostMap>> {
        self.weak_self
            .upgrade()
            .map(|host| host as Arc<dyn HostMap>)
    }
}

impl HostMap for SimulatedHost {
    fn instance_id(&self) -> HostId {
        self.id
    }

    fn camera(&self) -> HostCamera {
        *self.camera.lock()
    }

    fn container_size(&self) -> (u32, u32) {
        *self.container_size.lock()
    }

    fn renders_world_copies(&self) -> bool {
        true
    }

    fn style_loaded(&self) -> bool {
        self.style_loaded.load(Ordering::SeqCst)
    }

    fn gl(&self) -> GlContext {
        self.gl.clone()
    }

    fn add_layer(&self, layer: Arc<dyn CustomLayer>) -> Result<(), HostError> {
        if self.removed.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("host has been removed".to_string()));
        }
        if !self.style_loaded() {
            return Err(HostError::StyleNotReady);
        }
        let mut layers = self.layers.lock();
        if layers.iter().any(|l| l.id() == layer.id()) {
            return Err(HostError::DuplicateLayer(layer.id().to_string()));
        }
        layers.push(Arc::clone(&layer));
        drop(layers);

        if let Some(host) = self.self_arc() {
            layer.on_add(&host, &self.gl);
        }
        Ok(())
    }

    fn remove_layer(&self, id: &str) -> Result<(), HostError> {
        let mut layers = self.layers.lock();
        let position = layers.iter().position(|l| l.id() == id);
        match position {
            Some(index) => {
                let layer = layers.remove(index);
                drop(layers);
                layer.on_remove();
                Ok(())
            }
            None => Err(HostError::NotFound(id.to_string())),
        }
    }

    fn get_layer(&self, id: &str) -> Option<Arc<dyn CustomLayer>> {
        self.layers.lock().iter().find(|l| l.id() == id).cloned()
    }

    fn get_source(&self, id: &str) -> bool {
        self.sources.lock().contains(id)
    }

    fn remove_source(&self, id: &str) -> Result<(), HostError> {
        if self.sources.lock().remove(id) {
            Ok(())
        } else {
            Err(HostError::NotFound(id.to_string()))
        }
    }

    fn on(&self, event: HostEvent, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, event, handler));
        id
    }

    fn off(&self, listener: ListenerId) {
        self.listeners.lock().retain(|(id, _, _)| *id != listener);
    }

    fn trigger_repaint(&self) {
        self.repaint_requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingLayer {
        id: String,
        adds: AtomicUsize,
        renders: AtomicUsize,
        removes: AtomicUsize,
    }

    impl CountingLayer {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                adds: AtomicUsize::new(0),
                renders: AtomicUsize::new(0),
                removes: AtomicUsize::new(0),
            })
        }
    }

    impl CustomLayer for CountingLayer {
        fn id(&self) -> &str {
            &self.id
        }

        fn on_add(&self, _host: &Arc<dyn HostMap>, _gl: &GlContext) {
            self.adds.fetch_add(1, Ordering::SeqCst);
        }

        fn render(&self, _gl: &GlContext) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }

        fn on_remove(&self) {
            self.removes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_layer_requires_loaded_style() {
        let host = SimulatedHost::new();
        let layer = CountingLayer::new("a");
        assert_eq!(
            host.add_layer(layer.clone()),
            Err(HostError::StyleNotReady)
        );

        host.finish_style_load();
        assert!(host.add_layer(layer.clone()).is_ok());
        assert_eq!(layer.adds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_layer_id_rejected() {
        let host = SimulatedHost::new();
        host.finish_style_load();
        host.add_layer(CountingLayer::new("a")).unwrap();
        assert_eq!(
            host.add_layer(CountingLayer::new("a")),
            Err(HostError::DuplicateLayer("a".to_string()))
        );
        assert_eq!(host.layer_count(), 1);
    }

    #[test]
    fn test_draw_frame_renders_all_layers_and_clears_repaint() {
        let host = SimulatedHost::new();
        host.finish_style_load();
        let layer = CountingLayer::new("a");
        host.add_layer(layer.clone()).unwrap();

        host.trigger_repaint();
        assert!(host.repaint_pending());
        host.draw_frame();
        assert!(!host.repaint_pending());
        assert_eq!(layer.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_fanout_and_off() {
        let host = SimulatedHost::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = host.on(
            HostEvent::Move,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        host.move_camera(HostCamera::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        host.off(listener);
        host.move_camera(HostCamera::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_during_dispatch_does_not_deadlock() {
        let host = SimulatedHost::new();
        let count = Arc::new(AtomicUsize::new(0));

        let other = host.on(HostEvent::Move, Arc::new(|| {}));
        let host_weak = Arc::downgrade(&host);
        let c = Arc::clone(&count);
        host.on(
            HostEvent::Move,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                // Handlers may unregister listeners while an event is firing.
                if let Some(h) = host_weak.upgrade() {
                    h.off(other);
                }
            }),
        );

        host.move_camera(HostCamera::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_fires_event_then_detaches_layers() {
        let host = SimulatedHost::new();
        host.finish_style_load();
        let layer = CountingLayer::new("a");
        host.add_layer(layer.clone()).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        host.on(
            HostEvent::Remove,
            Arc::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );

        host.remove();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(layer.removes.load(Ordering::SeqCst), 1);
        assert_eq!(host.layer_count(), 0);

        // Second remove is a no-op.
        host.remove();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_host_rejects_layer_add() {
        let host = SimulatedHost::new();
        host.finish_style_load();
        host.remove();
        assert!(matches!(
            host.add_layer(CountingLayer::new("a")),
            Err(HostError::Rejected(_))
        ));
    }

    #[test]
    fn test_remove_source_reports_not_found() {
        let host = SimulatedHost::new();
        host.add_source("s");
        assert!(host.remove_source("s").is_ok());
        assert_eq!(
            host.remove_source("s"),
            Err(HostError::NotFound("s".to_string()))
        );
    }

    #[test]
    fn test_each_host_gets_distinct_gl_context() {
        let a = SimulatedHost::new();
        let b = SimulatedHost::new();
        assert_ne!(a.gl(), b.gl());
        assert_eq!(a.gl().host_id(), a.instance_id());
    }
}
