//! Viewport derivation.
//!
//! Projects host camera state into the viewport descriptor the guest
//! renderer understands. Derivation is a pure function of the host's
//! current state: it runs on every host `Move` event and, independently,
//! inside every render call, so a drawn frame never uses a camera snapshot
//! older than the frame itself.

use crate::coord::{normalize_longitude, LonLat};
use crate::host::{HostMap, Padding};

/// Near plane distance handed to the guest projection.
pub const NEAR_Z: f64 = 0.1;

/// Far plane distance handed to the guest projection.
pub const FAR_Z: f64 = 1000.0;

/// Camera parameters needed to project guest geometry consistently with the
/// host's current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Center longitude, normalized into `[-180, 180)`.
    pub longitude: f64,
    /// Center latitude.
    pub latitude: f64,
    /// Zoom level.
    pub zoom: f64,
    /// Bearing in degrees clockwise from north.
    pub bearing: f64,
    /// Pitch in degrees from the nadir.
    pub pitch: f64,
    /// Viewport padding in pixels.
    pub padding: Padding,
    /// Whether the guest should repeat the world horizontally.
    pub repeat: bool,
    /// Near plane distance.
    pub near_z: f64,
    /// Far plane distance.
    pub far_z: f64,
}

/// Derive a viewport from the host's live camera state.
///
/// Pure observation: no host state is mutated and nothing is cached. The
/// center longitude is normalized so geometry does not jump at the
/// antimeridian while the user pans across it.
pub fn derive_viewport(host: &dyn HostMap) -> Viewport {
    let camera = host.camera();
    let center = LonLat::new(normalize_longitude(camera.center.lon), camera.center.lat);
    let (width, height) = host.container_size();

    Viewport {
        width,
        height,
        longitude: center.lon,
        latitude: center.lat,
        zoom: camera.zoom,
        bearing: camera.bearing,
        pitch: camera.pitch,
        padding: camera.padding,
        repeat: host.renders_world_copies(),
        near_z: NEAR_Z,
        far_z: FAR_Z,
    }
}
