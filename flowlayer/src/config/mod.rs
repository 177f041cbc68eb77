//! Flow animation configuration.
//!
//! `FlowConfig` is the top-level configuration passed to
//! [`crate::lifecycle::FlowLayer::builder`]. It covers the route sources,
//! trip timing, visual parameters, and the timing knobs of the attach and
//! animation machinery.

mod file;

pub use file::{ConfigFile, CONFIG_KEYS};

use std::time::Duration;

use thiserror::Error;

use crate::trip::{Color, LoopClock};

/// Default layer id within the host's style.
pub const DEFAULT_LAYER_ID: &str = "flowlayer-trips";

/// Default duration of one particle's journey, in milliseconds.
pub const DEFAULT_TRIP_DURATION_MS: f64 = 10_000.0;

/// Default number of staggered particles per route.
pub const DEFAULT_PARTICLES_PER_ROUTE: u32 = 15;

/// Default trail fade-out window, in milliseconds.
pub const DEFAULT_TRAIL_LENGTH_MS: f64 = 4_000.0;

/// Default target frame interval (~60 fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Default attach timeout used as a safety net against a host that never
/// fires its ready events.
pub const DEFAULT_ATTACH_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Default per-request HTTP timeout for route files.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default route color palette, cycled by source file index.
pub const DEFAULT_PALETTE: [Color; 3] = [[253, 128, 93], [23, 184, 190], [130, 109, 255]];

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("No route files configured")]
    NoRouteFiles,

    #[error("Trip duration must be positive and finite, got {0}")]
    InvalidTripDuration(String),

    #[error("Particles per route must be non-zero")]
    ZeroParticles,

    #[error("Opacity must be within [0, 1], got {0}")]
    InvalidOpacity(String),

    #[error("Layer id must not be empty")]
    EmptyLayerId,

    #[error("Config file error: {0}")]
    File(String),
}

/// Configuration for one flow animation mount.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    /// Id of the compositor layer inside the host's style.
    pub layer_id: String,

    /// URLs of the GeoJSON route files to load.
    pub route_files: Vec<String>,

    /// Duration of one particle's journey, in milliseconds.
    pub trip_duration_ms: f64,

    /// Number of staggered particles animated along each route.
    pub particles_per_route: u32,

    /// Trail fade-out window behind each particle, in milliseconds.
    pub trail_length_ms: f64,

    /// Trail width in pixels.
    pub width_px: f64,

    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,

    /// Route colors, cycled by source file index.
    pub palette: Vec<Color>,

    /// Target frame interval for the animation clock.
    pub frame_interval: Duration,

    /// How long to wait for host ready events before attempting the attach
    /// anyway.
    pub attach_timeout: Duration,

    /// Per-request timeout for route file fetches.
    pub http_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            layer_id: DEFAULT_LAYER_ID.to_string(),
            route_files: Vec::new(),
            trip_duration_ms: DEFAULT_TRIP_DURATION_MS,
            particles_per_route: DEFAULT_PARTICLES_PER_ROUTE,
            trail_length_ms: DEFAULT_TRAIL_LENGTH_MS,
            width_px: 3.0,
            opacity: 1.0,
            palette: DEFAULT_PALETTE.to_vec(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            attach_timeout: DEFAULT_ATTACH_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl FlowConfig {
    /// Create a config for the given route files with default parameters.
    pub fn new(route_files: Vec<String>) -> Self {
        Self {
            route_files,
            ..Self::default()
        }
    }

    /// Set the layer id.
    pub fn with_layer_id(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = layer_id.into();
        self
    }

    /// Set the trip duration in milliseconds.
    pub fn with_trip_duration_ms(mut self, trip_duration_ms: f64) -> Self {
        self.trip_duration_ms = trip_duration_ms;
        self
    }

    /// Set the number of particles per route.
    pub fn with_particles_per_route(mut self, particles_per_route: u32) -> Self {
        self.particles_per_route = particles_per_route;
        self
    }

    /// Set the trail fade-out window in milliseconds.
    pub fn with_trail_length_ms(mut self, trail_length_ms: f64) -> Self {
        self.trail_length_ms = trail_length_ms;
        self
    }

    /// Set the trail width in pixels.
    pub fn with_width_px(mut self, width_px: f64) -> Self {
        self.width_px = width_px;
        self
    }

    /// Set the layer opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the route color palette.
    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        self.palette = palette;
        self
    }

    /// Set the animation frame interval.
    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Set the attach timeout.
    pub fn with_attach_timeout(mut self, attach_timeout: Duration) -> Self {
        self.attach_timeout = attach_timeout;
        self
    }

    /// Check the config for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.route_files.is_empty() {
            return Err(ConfigError::NoRouteFiles);
        }
        if !(self.trip_duration_ms.is_finite() && self.trip_duration_ms > 0.0) {
            return Err(ConfigError::InvalidTripDuration(
                self.trip_duration_ms.to_string(),
            ));
        }
        if self.particles_per_route == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidOpacity(self.opacity.to_string()));
        }
        if self.layer_id.is_empty() {
            return Err(ConfigError::EmptyLayerId);
        }
        Ok(())
    }

    /// Loop timing derived from this config.
    pub fn loop_clock(&self) -> LoopClock {
        LoopClock::new(self.trip_duration_ms, self.particles_per_route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FlowConfig {
        FlowConfig::new(vec!["http://r/routes.json".to_string()])
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.layer_id, "flowlayer-trips");
        assert_eq!(config.trip_duration_ms, 10_000.0);
        assert_eq!(config.particles_per_route, 15);
        assert_eq!(config.frame_interval, Duration::from_millis(16));
        assert_eq!(config.attach_timeout, Duration::from_millis(1_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = config()
            .with_layer_id("custom")
            .with_trip_duration_ms(5_000.0)
            .with_particles_per_route(4)
            .with_opacity(0.5);
        assert_eq!(config.layer_id, "custom");
        assert_eq!(config.loop_clock().loop_duration_ms(), 20_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert_eq!(
            FlowConfig::default().validate(),
            Err(ConfigError::NoRouteFiles)
        );
        assert!(matches!(
            config().with_trip_duration_ms(0.0).validate(),
            Err(ConfigError::InvalidTripDuration(_))
        ));
        assert!(matches!(
            config().with_trip_duration_ms(f64::NAN).validate(),
            Err(ConfigError::InvalidTripDuration(_))
        ));
        assert_eq!(
            config().with_particles_per_route(0).validate(),
            Err(ConfigError::ZeroParticles)
        );
        assert!(matches!(
            config().with_opacity(1.5).validate(),
            Err(ConfigError::InvalidOpacity(_))
        ));
        assert_eq!(
            config().with_layer_id("").validate(),
            Err(ConfigError::EmptyLayerId)
        );
    }
}
