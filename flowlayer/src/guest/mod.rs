//! Guest renderer abstraction.
//!
//! The guest is the secondary instanced-geometry renderer composited on top
//! of the host's canvas. Like the host, it is externally owned and reached
//! through traits: a [`GuestRenderer`] builds scenes bound to the host's GL
//! context, and a [`GuestScene`] accepts layer lists, viewport pushes, and
//! filtered draw calls that must preserve the host's color/depth/stencil
//! buffers.
//!
//! [`HeadlessRenderer`] is the in-process implementation used by the CLI
//! simulation and the tests; it records every interaction instead of
//! touching a GPU.

mod headless;
mod props;

pub use headless::{HeadlessRenderer, SceneProbe};
pub use props::{GuestLayer, LayerKind, LayerProps, PropsPatch};

use std::fmt;

use crate::host::GlContext;
use crate::viewport::Viewport;

/// Error from a guest draw call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestRenderError {
    /// The backend failed to issue the draw.
    Draw(String),
}

impl fmt::Display for GuestRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuestRenderError::Draw(msg) => write!(f, "Guest draw failed: {}", msg),
        }
    }
}

impl std::error::Error for GuestRenderError {}

/// Factory for guest scenes.
///
/// `create_scene` receives the host's GL context handle; implementations
/// must render through that context and never create their own.
pub trait GuestRenderer: Send + Sync {
    /// Build a scene bound to the given (host-owned) GL context.
    fn create_scene(&self, gl: &GlContext) -> Box<dyn GuestScene>;
}

/// One guest rendering context and its layer list.
///
/// Mutation is always replace-by-id through the scene registry; callers
/// never blindly overwrite the full layer list from outside.
pub trait GuestScene: Send + Sync {
    /// Replace the scene's layer list.
    fn set_layers(&mut self, layers: &[GuestLayer]);

    /// Push a viewport without drawing. Called on host move events so the
    /// scene tracks the camera between frames; must not force a repaint.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Draw exactly the layer with `layer_id` using `viewport`, leaving all
    /// other layers and the host's buffers untouched (no clear).
    fn draw(&mut self, viewport: &Viewport, layer_id: &str) -> Result<(), GuestRenderError>;

    /// Release GPU resources. Called once, only when the host itself is
    /// being removed.
    fn release(&mut self);
}
