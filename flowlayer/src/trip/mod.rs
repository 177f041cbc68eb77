//! Trip expansion.
//!
//! Expands raw route paths into staggered particle "trips" with per-vertex
//! timestamps. For each path, `particles_per_route` trips share the same
//! geometry with time offsets of one trip duration each, so particle `k+1`
//! begins exactly as particle `k` finishes and the flow along a route never
//! breaks.

mod builder;
mod cache;

pub use builder::{build_trips, Trip};
pub use cache::TripCache;

/// RGB color assigned to a trip.
pub type Color = [u8; 3];

/// Loop timing for one animation session.
///
/// Every trip in a session shares the same loop duration
/// (`trip_duration × particles_per_route`), which is what makes the whole
/// pattern repeat seamlessly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopClock {
    trip_duration_ms: f64,
    particles_per_route: u32,
}

impl LoopClock {
    /// Create a clock. `trip_duration_ms` must be positive and
    /// `particles_per_route` non-zero; the config layer validates both.
    pub fn new(trip_duration_ms: f64, particles_per_route: u32) -> Self {
        Self {
            trip_duration_ms,
            particles_per_route,
        }
    }

    /// Duration of a single particle's journey, in milliseconds.
    pub fn trip_duration_ms(&self) -> f64 {
        self.trip_duration_ms
    }

    /// Number of staggered particles per route.
    pub fn particles_per_route(&self) -> u32 {
        self.particles_per_route
    }

    /// Time after which the animation pattern exactly repeats.
    pub fn loop_duration_ms(&self) -> f64 {
        self.trip_duration_ms * self.particles_per_route as f64
    }

    /// Maps elapsed wall time into the loop: `elapsed mod loop_duration`,
    /// always in `[0, loop_duration)`.
    pub fn current_time_ms(&self, elapsed_ms: f64) -> f64 {
        elapsed_ms.rem_euclid(self.loop_duration_ms())
    }
}
