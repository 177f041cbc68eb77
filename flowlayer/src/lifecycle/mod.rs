//! Flow layer lifecycle.
//!
//! [`FlowLayer`] is the mounting surface of the crate: configure it, mount
//! it on a host, and it manages its own lifecycle from route loading through
//! animation to teardown. The cleanup callback passed to `mount` fires
//! exactly once with the terminal outcome, no matter which teardown path
//! runs first (explicit unmount, host removal, or mount failure).

mod cleanup;
mod controller;

pub use cleanup::{CleanupDetail, CleanupFn, CleanupNotifier, CleanupStatus, FailureReason};

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, FlowConfig};
use crate::guest::{GuestRenderer, HeadlessRenderer};
use crate::host::HostMap;
use crate::route::{HttpClient, ReqwestClient, RouteError};
use crate::scene::SceneRegistry;
use crate::telemetry::{FlowMetrics, TelemetrySnapshot};
use crate::trip::TripCache;

use controller::Controller;

/// Errors from building a [`FlowLayer`].
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] RouteError),
}

/// A configured flow animation, ready to mount on a host map.
pub struct FlowLayer {
    config: FlowConfig,
    http: Arc<dyn HttpClient>,
    renderer: Arc<dyn GuestRenderer>,
    registry: Arc<SceneRegistry>,
    cache: Arc<TripCache>,
    metrics: Arc<FlowMetrics>,
}

impl FlowLayer {
    /// Start building a flow layer for the given config.
    pub fn builder(config: FlowConfig) -> FlowLayerBuilder {
        FlowLayerBuilder {
            config,
            http: None,
            renderer: None,
            registry: None,
            cache: None,
            metrics: None,
        }
    }

    /// Counters for this layer's pipeline.
    pub fn metrics(&self) -> Arc<FlowMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Point-in-time copy of the counters.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Mount on a host map.
    ///
    /// Returns immediately with a handle; route loading and the attach run
    /// in the background. `on_cleanup` fires exactly once when the mount
    /// ends, with `stopped` on a normal teardown or `failed` plus a reason
    /// when the mount could not complete.
    pub async fn mount(
        self,
        host: Arc<dyn HostMap>,
        on_cleanup: impl FnOnce(CleanupDetail) + Send + 'static,
    ) -> FlowHandle {
        let controller = Controller::new(
            self.config,
            host,
            self.renderer,
            self.registry,
            self.metrics,
            tokio::runtime::Handle::current(),
            Box::new(on_cleanup),
        );
        let driver = tokio::spawn(Arc::clone(&controller).run(self.http, self.cache));
        FlowHandle {
            controller,
            driver: Mutex::new(Some(driver)),
        }
    }
}

/// Builder for [`FlowLayer`] with injectable collaborators.
///
/// Everything but the config has a default: a rustls-backed HTTP client,
/// the headless guest renderer, and the process-wide scene registry and
/// trip cache.
pub struct FlowLayerBuilder {
    config: FlowConfig,
    http: Option<Arc<dyn HttpClient>>,
    renderer: Option<Arc<dyn GuestRenderer>>,
    registry: Option<Arc<SceneRegistry>>,
    cache: Option<Arc<TripCache>>,
    metrics: Option<Arc<FlowMetrics>>,
}

impl FlowLayerBuilder {
    /// Use a custom HTTP client for route fetches.
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use a custom guest renderer.
    pub fn with_guest_renderer(mut self, renderer: Arc<dyn GuestRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Use a custom scene registry instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<SceneRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a custom trip cache instead of the process-wide one.
    pub fn with_trip_cache(mut self, cache: Arc<TripCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use externally owned metrics counters.
    pub fn with_metrics(mut self, metrics: Arc<FlowMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the config and assemble the layer.
    pub fn build(self) -> Result<FlowLayer, FlowError> {
        self.config.validate()?;
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestClient::with_timeout(self.config.http_timeout)?),
        };
        Ok(FlowLayer {
            http,
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(HeadlessRenderer::new())),
            registry: self.registry.unwrap_or_else(SceneRegistry::global),
            cache: self.cache.unwrap_or_else(TripCache::global),
            metrics: self.metrics.unwrap_or_default(),
            config: self.config,
        })
    }
}

/// Handle to one mounted flow animation.
///
/// Owns the mount's cancellation scope; dropping the handle does not tear
/// the mount down, calling [`FlowHandle::unmount`] does.
pub struct FlowHandle {
    controller: Arc<Controller>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl FlowHandle {
    /// Tear the mount down and fire the cleanup callback (if it has not
    /// fired already). Idempotent.
    pub fn unmount(&self) {
        self.controller.teardown(CleanupDetail::stopped());
    }

    /// Wait for the background mount driver to finish its work (loading and
    /// the initial attach decision).
    pub async fn mounted(&self) {
        let driver = self.driver.lock().take();
        if let Some(driver) = driver {
            let _ = driver.await;
        }
    }

    /// Whether the cleanup callback has fired.
    pub fn cleanup_fired(&self) -> bool {
        self.controller.cleanup_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::GuestRenderer;
    use crate::host::SimulatedHost;
    use crate::route::{HttpFuture, MockHttpClient};
    use bytes::Bytes;
    use std::time::Duration;

    const ROUTES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "LineString",
                "coordinates": [[13.4, 52.5], [13.5, 52.6], [13.6, 52.7]]}}
        ]
    }"#;

    const EMPTY: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    struct Fixture {
        host: Arc<SimulatedHost>,
        renderer: Arc<HeadlessRenderer>,
        registry: Arc<SceneRegistry>,
        cache: Arc<TripCache>,
        http: Arc<MockHttpClient>,
        cleanups: Arc<Mutex<Vec<CleanupDetail>>>,
    }

    fn fixture(body: &str) -> Fixture {
        let http = Arc::new(MockHttpClient::new());
        http.insert("http://r/routes.json", Ok(Bytes::from(body.to_string())));
        Fixture {
            host: SimulatedHost::new(),
            renderer: Arc::new(HeadlessRenderer::new()),
            registry: SceneRegistry::new(),
            cache: Arc::new(TripCache::new()),
            http,
            cleanups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn config() -> FlowConfig {
        FlowConfig::new(vec!["http://r/routes.json".to_string()])
            .with_particles_per_route(3)
            .with_trip_duration_ms(1_000.0)
    }

    impl Fixture {
        async fn mount(&self, config: FlowConfig) -> FlowHandle {
            let layer = FlowLayer::builder(config)
                .with_http_client(self.http.clone())
                .with_guest_renderer(self.renderer.clone() as Arc<dyn GuestRenderer>)
                .with_registry(Arc::clone(&self.registry))
                .with_trip_cache(Arc::clone(&self.cache))
                .build()
                .unwrap();
            let cleanups = Arc::clone(&self.cleanups);
            let handle = layer
                .mount(self.host.clone(), move |detail| {
                    cleanups.lock().push(detail);
                })
                .await;
            handle.mounted().await;
            handle
        }
    }

    #[tokio::test]
    async fn test_mount_attaches_and_animates() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();
        let handle = f.mount(config()).await;

        assert_eq!(f.host.layer_count(), 1);
        assert_eq!(f.renderer.scenes_created(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(f.host.repaint_pending());
        f.host.draw_frame();
        assert_eq!(f.renderer.scenes()[0].draws_for("flowlayer-trips"), 1);

        handle.unmount();
        assert_eq!(f.host.layer_count(), 0);
        assert_eq!(f.cleanups.lock().as_slice(), &[CleanupDetail::stopped()]);
    }

    #[tokio::test]
    async fn test_attach_waits_for_style_load() {
        let f = fixture(ROUTES);
        let handle = f.mount(config()).await;
        assert_eq!(f.host.layer_count(), 0);

        f.host.finish_style_load();
        assert_eq!(f.host.layer_count(), 1);

        handle.unmount();
        assert!(handle.cleanup_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_timeout_reports_layer_add_failed() {
        let f = fixture(ROUTES);
        // Style never loads and no ready event ever fires.
        let handle = f.mount(config().with_attach_timeout(Duration::from_millis(100))).await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        let cleanups = f.cleanups.lock();
        assert_eq!(cleanups.len(), 1);
        assert_eq!(cleanups[0].status, CleanupStatus::Failed);
        assert_eq!(cleanups[0].reason, Some(FailureReason::LayerAddFailed));
        drop(cleanups);
        assert!(handle.cleanup_fired());
    }

    #[tokio::test]
    async fn test_zero_trips_reports_failure() {
        let f = fixture(EMPTY);
        f.host.finish_style_load();
        let _handle = f.mount(config()).await;

        let cleanups = f.cleanups.lock();
        assert_eq!(cleanups.len(), 1);
        assert_eq!(cleanups[0].status, CleanupStatus::Failed);
        assert_eq!(cleanups[0].reason, Some(FailureReason::NoTripsGenerated));
    }

    #[tokio::test]
    async fn test_double_unmount_notifies_once() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();
        let handle = f.mount(config()).await;

        handle.unmount();
        handle.unmount();
        assert_eq!(f.cleanups.lock().len(), 1);
    }

    /// HTTP client that parks every request until the test opens the gate.
    struct GatedHttp {
        gate: tokio::sync::Notify,
        body: Bytes,
    }

    impl HttpClient for GatedHttp {
        fn get<'a>(&'a self, _url: &'a str) -> HttpFuture<'a> {
            Box::pin(async move {
                self.gate.notified().await;
                Ok(self.body.clone())
            })
        }
    }

    #[tokio::test]
    async fn test_host_removed_during_load_never_attaches() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();
        let http = Arc::new(GatedHttp {
            gate: tokio::sync::Notify::new(),
            body: Bytes::from_static(ROUTES.as_bytes()),
        });

        let layer = FlowLayer::builder(config())
            .with_http_client(http.clone())
            .with_guest_renderer(f.renderer.clone() as Arc<dyn GuestRenderer>)
            .with_registry(Arc::clone(&f.registry))
            .with_trip_cache(Arc::clone(&f.cache))
            .build()
            .unwrap();
        let cleanups = Arc::clone(&f.cleanups);
        let handle = layer
            .mount(f.host.clone(), move |detail| {
                cleanups.lock().push(detail);
            })
            .await;

        // Let the driver register its listeners and block on the fetch,
        // then pull the host out from under it.
        tokio::task::yield_now().await;
        f.host.remove();
        http.gate.notify_one();
        handle.mounted().await;

        assert_eq!(f.host.layer_count(), 0);
        assert_eq!(f.renderer.scenes_created(), 0);
        assert_eq!(f.cleanups.lock().as_slice(), &[CleanupDetail::stopped()]);
    }

    #[tokio::test]
    async fn test_host_removal_stops_the_mount() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();
        let handle = f.mount(config()).await;

        f.host.remove();
        assert_eq!(f.cleanups.lock().as_slice(), &[CleanupDetail::stopped()]);

        // A later unmount does not re-notify or fail on the removed layer.
        handle.unmount();
        assert_eq!(f.cleanups.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_remount_reuses_cached_trips_and_scene() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();

        let first = f.mount(config()).await;
        let requests_after_first = f.http.requests().len();
        first.unmount();

        let _second = f.mount(config()).await;
        assert_eq!(f.http.requests().len(), requests_after_first);
        assert_eq!(f.renderer.scenes_created(), 1);
        assert_eq!(f.host.layer_count(), 1);
    }

    #[tokio::test]
    async fn test_unmount_during_load_skips_attach() {
        let f = fixture(ROUTES);
        f.host.finish_style_load();

        let layer = FlowLayer::builder(config())
            .with_http_client(f.http.clone())
            .with_guest_renderer(f.renderer.clone() as Arc<dyn GuestRenderer>)
            .with_registry(Arc::clone(&f.registry))
            .with_trip_cache(Arc::clone(&f.cache))
            .build()
            .unwrap();
        let cleanups = Arc::clone(&f.cleanups);
        let handle = layer
            .mount(f.host.clone(), move |detail| {
                cleanups.lock().push(detail);
            })
            .await;

        // Unmount racing the driver: whichever way the race goes, the layer
        // ends up absent and cleanup fires exactly once.
        handle.unmount();
        handle.mounted().await;

        assert_eq!(f.host.layer_count(), 0);
        assert_eq!(f.cleanups.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let result = FlowLayer::builder(FlowConfig::default()).build();
        assert!(matches!(
            result,
            Err(FlowError::Config(ConfigError::NoRouteFiles))
        ));
    }
}
