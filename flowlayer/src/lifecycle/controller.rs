//! Mount orchestration: load, attach, animate, tear down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::AnimationClock;
use crate::config::FlowConfig;
use crate::guest::{GuestRenderer, LayerProps};
use crate::host::{HostError, HostEvent, HostMap, ListenerId};
use crate::layer::CompositorLayer;
use crate::route::{HttpClient, RouteError, RouteLoader};
use crate::scene::SceneRegistry;
use crate::telemetry::FlowMetrics;
use crate::trip::{build_trips, Trip, TripCache};

use super::cleanup::{CleanupDetail, CleanupNotifier, FailureReason};

/// Shared state of one mounted flow animation.
///
/// Everything after `mount` goes through here: the driver task, the host
/// event listeners, the attach timeout, and the unmount handle all hold an
/// `Arc` (or `Weak`) to the same controller.
pub(super) struct Controller {
    config: FlowConfig,
    host: Arc<dyn HostMap>,
    renderer: Arc<dyn GuestRenderer>,
    registry: Arc<SceneRegistry>,
    metrics: Arc<FlowMetrics>,
    runtime: Handle,
    cancel: CancellationToken,
    notifier: CleanupNotifier,
    /// One-shot latch over the attach paths ({immediate, Load, StyleLoad,
    /// timeout}); whichever swaps it first performs the attach.
    attach_latch: AtomicBool,
    torn_down: AtomicBool,
    layer: Mutex<Option<Arc<CompositorLayer>>>,
    clock: Mutex<Option<AnimationClock>>,
    listeners: Mutex<Vec<ListenerId>>,
}

impl Controller {
    pub(super) fn new(
        config: FlowConfig,
        host: Arc<dyn HostMap>,
        renderer: Arc<dyn GuestRenderer>,
        registry: Arc<SceneRegistry>,
        metrics: Arc<FlowMetrics>,
        runtime: Handle,
        on_cleanup: Box<dyn FnOnce(CleanupDetail) + Send>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            host,
            renderer,
            registry,
            metrics,
            runtime,
            cancel: CancellationToken::new(),
            notifier: CleanupNotifier::new(on_cleanup),
            attach_latch: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            layer: Mutex::new(None),
            clock: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Drive the mount: load trips, then attach now or when the host is
    /// ready. Runs as a tokio task.
    pub(super) async fn run(
        self: Arc<Self>,
        http: Arc<dyn HttpClient>,
        cache: Arc<TripCache>,
    ) {
        // Host removal is a normal stop, whenever it arrives. Registered
        // before loading so a host torn down mid-fetch still cancels the
        // mount instead of getting a layer attached post-mortem.
        let weak = Arc::downgrade(&self);
        self.register_listener(HostEvent::Remove, weak, |controller| {
            controller.teardown(CleanupDetail::stopped());
        });

        let trips = match self.load_trips(http, cache).await {
            Ok(trips) => trips,
            Err(RouteError::Cancelled) => {
                debug!("Mount cancelled during route load");
                return;
            }
            Err(err) => {
                // The loader isolates per-file failures; anything else ends
                // the mount.
                self.teardown(CleanupDetail::failed(
                    FailureReason::NoTripsGenerated,
                    err.to_string(),
                ));
                return;
            }
        };

        if trips.is_empty() {
            warn!("Route files produced no trips");
            self.teardown(CleanupDetail::failed(
                FailureReason::NoTripsGenerated,
                "route files produced zero trips",
            ));
            return;
        }
        if self.cancel.is_cancelled() {
            return;
        }

        let props = LayerProps::new(
            trips,
            self.config.trail_length_ms,
            self.config.width_px,
            self.config.opacity,
        );
        *self.layer.lock() = Some(Arc::new(CompositorLayer::new(
            self.config.layer_id.clone(),
            props,
            Arc::clone(&self.renderer),
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
        )));

        if self.host.style_loaded() {
            self.try_attach();
            return;
        }

        // Not ready yet: attach on whichever fires first, with the timeout
        // as a safety net against a host that never fires ready events.
        for event in [HostEvent::Load, HostEvent::StyleLoad] {
            let weak = Arc::downgrade(&self);
            self.register_listener(event, weak, Controller::try_attach);
        }
        let controller = Arc::clone(&self);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = controller.cancel.cancelled() => {}
                _ = tokio::time::sleep(controller.config.attach_timeout) => {
                    debug!("Attach timeout elapsed without a host ready event");
                    controller.try_attach();
                }
            }
        });
    }

    async fn load_trips(
        &self,
        http: Arc<dyn HttpClient>,
        cache: Arc<TripCache>,
    ) -> Result<Arc<Vec<Trip>>, RouteError> {
        let files = &self.config.route_files;
        let particles = self.config.particles_per_route;
        let duration = self.config.trip_duration_ms;

        if let Some(trips) = cache.get(files, particles, duration) {
            debug!(trips = trips.len(), "Reusing cached trips");
            return Ok(trips);
        }

        let loader = RouteLoader::new(http, Arc::clone(&self.metrics));
        let paths = loader.load_routes(files, &self.cancel).await?;
        let trips = Arc::new(build_trips(&paths, particles, duration, &self.config.palette));
        self.metrics.trips_built(trips.len() as u64);
        cache.insert(files, particles, duration, Arc::clone(&trips));
        info!(paths = paths.len(), trips = trips.len(), "Built trips");
        Ok(trips)
    }

    /// Attach the layer if no other path has done so yet.
    fn try_attach(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.attach_latch.swap(true, Ordering::SeqCst) {
            return;
        }
        let layer = match self.layer.lock().clone() {
            Some(layer) => layer,
            None => return,
        };

        match self.host.add_layer(layer.clone()) {
            Ok(()) => {
                info!(layer = %self.config.layer_id, "Layer attached, starting clock");
                let _guard = self.runtime.enter();
                let clock = AnimationClock::start(
                    layer,
                    Arc::clone(&self.host),
                    self.config.loop_clock(),
                    self.config.frame_interval,
                    self.cancel.child_token(),
                    Arc::clone(&self.metrics),
                );
                *self.clock.lock() = Some(clock);
            }
            Err(err) => {
                warn!(layer = %self.config.layer_id, error = %err, "Host rejected layer add");
                self.teardown(CleanupDetail::failed(
                    FailureReason::LayerAddFailed,
                    err.to_string(),
                ));
            }
        }
    }

    /// Tear everything down and notify the caller.
    ///
    /// Safe to call from any teardown trigger; the work runs once and the
    /// cleanup callback fires once.
    pub(super) fn teardown(&self, detail: CleanupDetail) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();

        if let Some(clock) = self.clock.lock().take() {
            clock.stop();
        }
        for listener in self.listeners.lock().drain(..) {
            self.host.off(listener);
        }

        // The layer and its backing source may already be gone (host
        // removal detaches layers itself); that is not an error here.
        match self.host.remove_layer(&self.config.layer_id) {
            Ok(()) | Err(HostError::NotFound(_)) => {}
            Err(err) => {
                warn!(layer = %self.config.layer_id, error = %err, "Layer removal failed")
            }
        }
        match self.host.remove_source(&self.config.layer_id) {
            Ok(()) | Err(HostError::NotFound(_)) => {}
            Err(err) => {
                warn!(source = %self.config.layer_id, error = %err, "Source removal failed")
            }
        }

        if self.notifier.notify(detail.clone()) {
            info!(status = %detail.status, "Flow layer torn down");
        }
    }

    pub(super) fn cleanup_fired(&self) -> bool {
        self.notifier.has_fired()
    }

    fn register_listener(
        &self,
        event: HostEvent,
        weak: Weak<Controller>,
        action: fn(&Controller),
    ) {
        let listener = self.host.on(
            event,
            Arc::new(move || {
                if let Some(controller) = weak.upgrade() {
                    action(controller.as_ref());
                }
            }),
        );
        self.listeners.lock().push(listener);
        // Teardown may have drained the list while we were registering.
        if self.torn_down.load(Ordering::SeqCst) {
            let drained: Vec<ListenerId> = self.listeners.lock().drain(..).collect();
            for listener in drained {
                self.host.off(listener);
            }
        }
    }
}
