//! Guest layer descriptors and the props bag.

use std::sync::Arc;

use crate::trip::Trip;

/// Which guest layer implementation to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Animated particle trips along route paths.
    Trips,
}

/// Visual and data parameters for a trips layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProps {
    /// Trip data, shared with the session cache.
    pub trips: Arc<Vec<Trip>>,
    /// Animation time within the loop, in milliseconds.
    pub current_time_ms: f64,
    /// How far behind each particle the trail fades out, in milliseconds.
    pub trail_length_ms: f64,
    /// Trail width in pixels.
    pub width_px: f64,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
}

impl LayerProps {
    /// Props for a fresh layer at animation time zero.
    pub fn new(trips: Arc<Vec<Trip>>, trail_length_ms: f64, width_px: f64, opacity: f64) -> Self {
        Self {
            trips,
            current_time_ms: 0.0,
            trail_length_ms,
            width_px,
            opacity,
        }
    }
}

/// One visual layer within a guest scene, identified by id.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestLayer {
    /// Unique id within the scene; updates replace by id.
    pub id: String,
    /// Layer-type descriptor.
    pub kind: LayerKind,
    /// Props bag.
    pub props: LayerProps,
}

/// Partial props update, merged into stored props by
/// [`crate::layer::CompositorLayer::set_props`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropsPatch {
    pub trips: Option<Arc<Vec<Trip>>>,
    pub current_time_ms: Option<f64>,
    pub trail_length_ms: Option<f64>,
    pub width_px: Option<f64>,
    pub opacity: Option<f64>,
}

impl PropsPatch {
    /// Patch updating only the animation time; what the clock sends every
    /// frame.
    pub fn current_time(current_time_ms: f64) -> Self {
        Self {
            current_time_ms: Some(current_time_ms),
            ..Self::default()
        }
    }

    /// Merge this patch into existing props, leaving unset fields alone.
    pub fn apply(&self, props: &mut LayerProps) {
        if let Some(trips) = &self.trips {
            props.trips = Arc::clone(trips);
        }
        if let Some(t) = self.current_time_ms {
            props.current_time_ms = t;
        }
        if let Some(t) = self.trail_length_ms {
            props.trail_length_ms = t;
        }
        if let Some(w) = self.width_px {
            props.width_px = w;
        }
        if let Some(o) = self.opacity {
            props.opacity = o;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> LayerProps {
        LayerProps::new(Arc::new(Vec::new()), 3_000.0, 4.0, 0.9)
    }

    #[test]
    fn test_new_props_start_at_time_zero() {
        assert_eq!(props().current_time_ms, 0.0);
    }

    #[test]
    fn test_current_time_patch_only_touches_time() {
        let mut p = props();
        PropsPatch::current_time(1_234.5).apply(&mut p);
        assert_eq!(p.current_time_ms, 1_234.5);
        assert_eq!(p.trail_length_ms, 3_000.0);
        assert_eq!(p.width_px, 4.0);
        assert_eq!(p.opacity, 0.9);
    }

    #[test]
    fn test_full_patch_replaces_everything() {
        let mut p = props();
        let trips = Arc::new(Vec::new());
        let patch = PropsPatch {
            trips: Some(Arc::clone(&trips)),
            current_time_ms: Some(1.0),
            trail_length_ms: Some(2.0),
            width_px: Some(3.0),
            opacity: Some(0.5),
        };
        patch.apply(&mut p);
        assert!(Arc::ptr_eq(&p.trips, &trips));
        assert_eq!(p.current_time_ms, 1.0);
        assert_eq!(p.trail_length_ms, 2.0);
        assert_eq!(p.width_px, 3.0);
        assert_eq!(p.opacity, 0.5);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut p = props();
        let before = p.clone();
        PropsPatch::default().apply(&mut p);
        assert_eq!(p, before);
    }
}
