//! Recording guest renderer with no GPU behind it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::host::GlContext;
use crate::viewport::Viewport;

use super::{GuestLayer, GuestRenderError, GuestRenderer, GuestScene};

/// Observable record of one headless scene's interactions.
///
/// The scene itself is owned by the scene registry; a probe is the handle
/// callers keep to inspect what happened to it.
#[derive(Debug, Default)]
pub struct SceneProbe {
    gl: Mutex<Option<GlContext>>,
    layer_ids: Mutex<Vec<String>>,
    set_layers_calls: AtomicU64,
    viewport_pushes: AtomicU64,
    last_viewport: Mutex<Option<Viewport>>,
    draws: Mutex<HashMap<String, u64>>,
    released: AtomicBool,
}

impl SceneProbe {
    /// GL context the scene was created with.
    pub fn gl(&self) -> Option<GlContext> {
        self.gl.lock().clone()
    }

    /// Ids currently in the scene's layer list, in order.
    pub fn layer_ids(&self) -> Vec<String> {
        self.layer_ids.lock().clone()
    }

    /// How many times the layer list was replaced.
    pub fn set_layers_calls(&self) -> u64 {
        self.set_layers_calls.load(Ordering::SeqCst)
    }

    /// How many viewports were pushed outside of draw calls.
    pub fn viewport_pushes(&self) -> u64 {
        self.viewport_pushes.load(Ordering::SeqCst)
    }

    /// The viewport most recently pushed or drawn with.
    pub fn last_viewport(&self) -> Option<Viewport> {
        *self.last_viewport.lock()
    }

    /// Number of filtered draws issued for the given layer id.
    pub fn draws_for(&self, layer_id: &str) -> u64 {
        self.draws.lock().get(layer_id).copied().unwrap_or(0)
    }

    /// Whether the scene's resources were released.
    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Guest renderer that records every interaction instead of drawing.
///
/// Backs the CLI's headless simulation and the integration tests. Draws can
/// be made to fail for a specific layer id to exercise the render error
/// path.
#[derive(Default)]
pub struct HeadlessRenderer {
    probes: Mutex<Vec<Arc<SceneProbe>>>,
    failing_layers: Mutex<Vec<String>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every draw for `layer_id` fail with a synthetic error.
    pub fn fail_draws_for(&self, layer_id: &str) {
        self.failing_layers.lock().push(layer_id.to_string());
    }

    /// Probes for every scene created so far, in creation order.
    pub fn scenes(&self) -> Vec<Arc<SceneProbe>> {
        self.probes.lock().clone()
    }

    /// Number of scenes created. The shared-context invariant means this
    /// stays at one per host no matter how often layers remount.
    pub fn scenes_created(&self) -> usize {
        self.probes.lock().len()
    }
}

impl GuestRenderer for HeadlessRenderer {
    fn create_scene(&self, gl: &GlContext) -> Box<dyn GuestScene> {
        let probe = Arc::new(SceneProbe::default());
        *probe.gl.lock() = Some(gl.clone());
        self.probes.lock().push(Arc::clone(&probe));

        Box::new(HeadlessScene {
            probe,
            failing_layers: self.failing_layers.lock().clone(),
        })
    }
}

struct HeadlessScene {
    probe: Arc<SceneProbe>,
    failing_layers: Vec<String>,
}

impl GuestScene for HeadlessScene {
    fn set_layers(&mut self, layers: &[GuestLayer]) {
        *self.probe.layer_ids.lock() = layers.iter().map(|l| l.id.clone()).collect();
        self.probe.set_layers_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        *self.probe.last_viewport.lock() = Some(*viewport);
        self.probe.viewport_pushes.fetch_add(1, Ordering::SeqCst);
    }

    fn draw(&mut self, viewport: &Viewport, layer_id: &str) -> Result<(), GuestRenderError> {
        if self.failing_layers.iter().any(|id| id == layer_id) {
            return Err(GuestRenderError::Draw(format!(
                "injected failure for layer '{}'",
                layer_id
            )));
        }
        *self.probe.last_viewport.lock() = Some(*viewport);
        *self
            .probe
            .draws
            .lock()
            .entry(layer_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::{LayerKind, LayerProps};
    use crate::viewport::{FAR_Z, NEAR_Z};
    use crate::host::Padding;

    fn viewport() -> Viewport {
        Viewport {
            width: 1280,
            height: 720,
            longitude: 0.0,
            latitude: 0.0,
            zoom: 1.0,
            bearing: 0.0,
            pitch: 0.0,
            padding: Padding::default(),
            repeat: true,
            near_z: NEAR_Z,
            far_z: FAR_Z,
        }
    }

    fn layer(id: &str) -> GuestLayer {
        GuestLayer {
            id: id.to_string(),
            kind: LayerKind::Trips,
            props: LayerProps::new(Arc::new(Vec::new()), 1_000.0, 2.0, 1.0),
        }
    }

    #[test]
    fn test_scene_records_interactions() {
        let renderer = HeadlessRenderer::new();
        let gl = GlContext::for_host(1, 1);
        let mut scene = renderer.create_scene(&gl);

        scene.set_layers(&[layer("a"), layer("b")]);
        scene.set_viewport(&viewport());
        scene.draw(&viewport(), "a").unwrap();
        scene.draw(&viewport(), "a").unwrap();
        scene.release();

        let probe = &renderer.scenes()[0];
        assert_eq!(probe.gl(), Some(gl));
        assert_eq!(probe.layer_ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(probe.set_layers_calls(), 1);
        assert_eq!(probe.viewport_pushes(), 1);
        assert_eq!(probe.draws_for("a"), 2);
        assert_eq!(probe.draws_for("b"), 0);
        assert!(probe.released());
    }

    #[test]
    fn test_injected_draw_failure() {
        let renderer = HeadlessRenderer::new();
        renderer.fail_draws_for("broken");
        let mut scene = renderer.create_scene(&GlContext::for_host(1, 1));

        assert!(scene.draw(&viewport(), "broken").is_err());
        assert!(scene.draw(&viewport(), "fine").is_ok());
        assert_eq!(renderer.scenes()[0].draws_for("broken"), 0);
    }
}
