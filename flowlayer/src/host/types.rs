//! Host-facing types: camera state, events, layer contract, and errors.

use std::fmt;
use std::sync::Arc;

use crate::coord::LonLat;

/// Opaque identifier for one host map instance.
pub type HostId = u64;

/// Camera padding in CSS pixels, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Point-in-time camera state observed from the host.
///
/// The host owns this state; the compositor reads it fresh on every move
/// event and again inside every render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostCamera {
    /// Camera center. The longitude may be unwrapped (outside [-180, 180])
    /// while the user pans across the antimeridian.
    pub center: LonLat,
    /// Zoom level.
    pub zoom: f64,
    /// Bearing in degrees clockwise from north.
    pub bearing: f64,
    /// Pitch in degrees from the nadir.
    pub pitch: f64,
    /// Viewport padding.
    pub padding: Padding,
}

impl Default for HostCamera {
    fn default() -> Self {
        Self {
            center: LonLat::new(0.0, 0.0),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            padding: Padding::default(),
        }
    }
}

/// Events dispatched by the host that this crate subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// The map finished its initial load.
    Load,
    /// The style finished loading (layers may now be added).
    StyleLoad,
    /// The camera moved.
    Move,
    /// The host itself is being removed. This is the only event that may
    /// destroy the shared guest scene.
    Remove,
}

/// Callback registered for a host event.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Handle for a registered event listener, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Handle to the host's existing GL context.
///
/// Handles are minted by host implementations only and carry the owning
/// host's id so downstream code can assert it never mixes contexts between
/// hosts. Cloning the handle does not clone the context; it is a reference
/// to the single context the host owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlContext {
    host: HostId,
    context: u64,
}

impl GlContext {
    /// Mint a handle for the given host. Host implementations call this
    /// once; everyone else receives clones of that handle.
    pub fn for_host(host: HostId, context: u64) -> Self {
        Self { host, context }
    }

    /// The host instance that owns this context.
    pub fn host_id(&self) -> HostId {
        self.host
    }

    /// Raw context identifier, for logging.
    pub fn context_id(&self) -> u64 {
        self.context
    }
}

/// The host's custom-layer contract.
///
/// A custom layer is handed to [`HostMap::add_layer`]; the host then drives
/// it through this interface: `on_add` when the layer is inserted into the
/// style, `render` on every frame the host paints, and `on_remove` when the
/// layer leaves the style.
pub trait CustomLayer: Send + Sync {
    /// Unique layer id within the host's style.
    fn id(&self) -> &str;

    /// Called by the host when the layer is added. `gl` is the host's own
    /// context; implementations must not create another one.
    fn on_add(&self, host: &Arc<dyn HostMap>, gl: &GlContext);

    /// Called by the host on every painted frame. Implementations must not
    /// clear the host's color/depth/stencil buffers and must not propagate
    /// errors into the host's frame.
    fn render(&self, gl: &GlContext);

    /// Called by the host when the layer is removed from the style.
    fn on_remove(&self);
}

/// Host map interface consumed by this crate.
///
/// Mirrors the surface of a web map engine: camera getters, style layer and
/// source management, event subscription, and repaint scheduling.
pub trait HostMap: Send + Sync {
    /// Stable identifier for this host instance.
    fn instance_id(&self) -> HostId;

    /// Current camera state.
    fn camera(&self) -> HostCamera;

    /// Canvas size in pixels as `(width, height)`.
    fn container_size(&self) -> (u32, u32);

    /// Whether the host repeats the world horizontally at low zoom.
    fn renders_world_copies(&self) -> bool;

    /// Whether the style is loaded and layers may be added.
    fn style_loaded(&self) -> bool;

    /// Handle to the host's GL context.
    fn gl(&self) -> GlContext;

    /// Add a custom layer to the style. Fails if the style is not ready or
    /// a layer with the same id already exists.
    fn add_layer(&self, layer: Arc<dyn CustomLayer>) -> Result<(), HostError>;

    /// Remove a layer by id.
    fn remove_layer(&self, id: &str) -> Result<(), HostError>;

    /// Look up a layer by id.
    fn get_layer(&self, id: &str) -> Option<Arc<dyn CustomLayer>>;

    /// Whether a source with the given id exists.
    fn get_source(&self, id: &str) -> bool;

    /// Remove a source by id.
    fn remove_source(&self, id: &str) -> Result<(), HostError>;

    /// Register an event listener. Returns a handle for [`HostMap::off`].
    fn on(&self, event: HostEvent, handler: EventHandler) -> ListenerId;

    /// Unregister an event listener. Unknown handles are ignored.
    fn off(&self, listener: ListenerId);

    /// Ask the host to schedule a repaint.
    fn trigger_repaint(&self);
}

/// Errors surfaced by host map operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The style is not loaded yet; layers cannot be added.
    StyleNotReady,

    /// A layer with this id is already present.
    DuplicateLayer(String),

    /// No layer or source with this id exists.
    NotFound(String),

    /// The host rejected the operation.
    Rejected(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::StyleNotReady => {
                write!(f, "Style is not loaded yet")
            }
            HostError::DuplicateLayer(id) => {
                write!(f, "Layer '{}' already exists", id)
            }
            HostError::NotFound(id) => {
                write!(f, "No layer or source '{}'", id)
            }
            HostError::Rejected(msg) => {
                write!(f, "Host rejected operation: {}", msg)
            }
        }
    }
}

impl std::error::Error for HostError {}
