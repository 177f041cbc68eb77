//! Concurrent, failure-isolated route loading.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coord::LonLat;
use crate::telemetry::FlowMetrics;

use super::geojson::{extract_line_paths, FeatureCollection};
use super::http::HttpClient;
use super::RouteError;

/// One normalized route path, tagged with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// Index of the source file in the requested file list.
    pub source_index: usize,
    /// Index of the path within its source file.
    pub path_index: usize,
    /// Flat vertex array with at least two vertices. Shared so sibling
    /// trips can reference the same geometry without copying it.
    pub vertices: Arc<Vec<LonLat>>,
}

/// Fetches and normalizes polyline geometry from external route files.
pub struct RouteLoader {
    http: Arc<dyn HttpClient>,
    metrics: Arc<FlowMetrics>,
}

impl RouteLoader {
    /// Create a loader over the given HTTP client.
    pub fn new(http: Arc<dyn HttpClient>, metrics: Arc<FlowMetrics>) -> Self {
        Self { http, metrics }
    }

    /// Load every file concurrently and return the union of valid paths.
    ///
    /// Each file is fetched and parsed independently; a failure logs one
    /// warning, bumps the failure counter, and contributes an empty feature
    /// set. Paths with fewer than two vertices are discarded. The
    /// cancellation token is checked after every await so an unmounted
    /// session stops contributing work; a cancelled batch returns
    /// [`RouteError::Cancelled`] without partial results.
    pub async fn load_routes(
        &self,
        files: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<RoutePath>, RouteError> {
        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }

        let fetches = files
            .iter()
            .enumerate()
            .map(|(index, url)| self.load_file(index, url, cancel));
        let per_file = futures::future::join_all(fetches).await;

        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }

        let paths: Vec<RoutePath> = per_file.into_iter().flatten().collect();
        debug!(files = files.len(), paths = paths.len(), "Route load complete");
        Ok(paths)
    }

    /// Fetch and parse one file. Never fails: errors are logged and an
    /// empty contribution is returned.
    async fn load_file(
        &self,
        source_index: usize,
        url: &str,
        cancel: &CancellationToken,
    ) -> Vec<RoutePath> {
        let body = match self.http.get(url).await {
            Ok(body) => body,
            Err(e) => {
                if !cancel.is_cancelled() {
                    warn!(url, error = %e, "Skipping route file after fetch failure");
                    self.metrics.route_file_failed();
                }
                return Vec::new();
            }
        };

        if cancel.is_cancelled() {
            return Vec::new();
        }

        let collection: FeatureCollection = match serde_json::from_slice(&body) {
            Ok(collection) => collection,
            Err(e) => {
                warn!(url, error = %e, "Skipping route file after parse failure");
                self.metrics.route_file_failed();
                return Vec::new();
            }
        };

        let raw_paths = extract_line_paths(&collection);
        let total = raw_paths.len();
        let paths: Vec<RoutePath> = raw_paths
            .into_iter()
            .filter(|path| path.len() >= 2)
            .enumerate()
            .map(|(path_index, vertices)| RoutePath {
                source_index,
                path_index,
                vertices: Arc::new(vertices),
            })
            .collect();

        let discarded = total - paths.len();
        if discarded > 0 {
            debug!(url, discarded, "Discarded degenerate paths");
            self.metrics.paths_discarded(discarded as u64);
        }
        self.metrics.paths_loaded(paths.len() as u64);
        self.metrics.route_file_loaded();
        paths
    }
}
