//! Route geometry loading.
//!
//! Fetches GeoJSON route files over HTTP and normalizes their
//! `LineString`/`MultiLineString` geometries into flat vertex paths. Files
//! are fetched concurrently and independently: a failure in one file logs a
//! warning and contributes nothing, it never fails the batch.

mod geojson;
mod http;
mod loader;

pub use geojson::{extract_line_paths, Feature, FeatureCollection, Geometry};
pub use http::{HttpClient, HttpFuture, ReqwestClient};
pub use loader::{RouteLoader, RoutePath};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use thiserror::Error;

/// Errors surfaced by route loading.
///
/// Per-file failures (HTTP or parse) are recovered inside the loader; `Http`
/// is only returned from [`HttpClient::get`] and test helpers. `Cancelled`
/// is the one variant the batch itself can return.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// HTTP transport or status failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The load was cancelled mid-flight (e.g. the layer unmounted).
    #[error("Route load cancelled")]
    Cancelled,
}
