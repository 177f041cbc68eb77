//! Trip construction from route paths.

use std::sync::Arc;

use crate::coord::LonLat;
use crate::route::RoutePath;

use super::Color;

/// One particle's journey along a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Deterministic id: `"{source}-{path}-{particle}"`. Stable across
    /// rebuilds so layers can be updated in place.
    pub id: String,
    /// Route geometry, shared with the sibling trips on the same path.
    pub path: Arc<Vec<LonLat>>,
    /// One non-decreasing timestamp per vertex, spanning exactly one trip
    /// duration starting at this particle's offset.
    pub timestamps: Vec<f64>,
    /// Trip color, assigned per source file.
    pub color: Color,
}

/// Expand paths into `particles_per_route` staggered trips each.
///
/// Trip `k` of a path gets timestamp
/// `k·trip_duration + (i / (len-1))·trip_duration` for vertex `i`, so its
/// first timestamp equals the previous particle's last and the handoff is
/// continuous. Colors cycle through `palette` by source index.
///
/// Paths are assumed to have at least two vertices; the loader guarantees
/// this.
pub fn build_trips(
    paths: &[RoutePath],
    particles_per_route: u32,
    trip_duration_ms: f64,
    palette: &[Color],
) -> Vec<Trip> {
    let mut trips = Vec::with_capacity(paths.len() * particles_per_route as usize);

    for path in paths {
        let color = palette_color(palette, path.source_index);
        let last_index = (path.vertices.len() - 1) as f64;

        for particle in 0..particles_per_route {
            let offset = particle as f64 * trip_duration_ms;
            let timestamps = (0..path.vertices.len())
                .map(|i| offset + (i as f64 / last_index) * trip_duration_ms)
                .collect();

            trips.push(Trip {
                id: format!("{}-{}-{}", path.source_index, path.path_index, particle),
                path: Arc::clone(&path.vertices),
                timestamps,
                color,
            });
        }
    }

    trips
}

fn palette_color(palette: &[Color], source_index: usize) -> Color {
    if palette.is_empty() {
        return [255, 255, 255];
    }
    palette[source_index % palette.len()]
}
