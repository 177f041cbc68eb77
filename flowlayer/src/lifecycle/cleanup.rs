//! Cleanup reporting.
//!
//! Teardown can be triggered from several places (explicit unmount, host
//! removal, mount failure); the caller's cleanup callback must fire exactly
//! once no matter how many of them run.

use std::fmt;

use parking_lot::Mutex;

/// Terminal outcome of one mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStatus {
    /// The animation ran and was torn down normally.
    Stopped,
    /// The mount failed before or during attach.
    Failed,
}

impl fmt::Display for CleanupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupStatus::Stopped => write!(f, "stopped"),
            CleanupStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Why a mount failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Loading completed but produced zero trips.
    NoTripsGenerated,
    /// The host rejected the layer add on every attach path.
    LayerAddFailed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoTripsGenerated => write!(f, "no_trips_generated"),
            FailureReason::LayerAddFailed => write!(f, "layer_add_failed"),
        }
    }
}

/// Payload handed to the cleanup callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupDetail {
    pub status: CleanupStatus,
    pub reason: Option<FailureReason>,
    pub message: Option<String>,
}

impl CleanupDetail {
    /// Detail for a normal teardown.
    pub fn stopped() -> Self {
        Self {
            status: CleanupStatus::Stopped,
            reason: None,
            message: None,
        }
    }

    /// Detail for a failed mount.
    pub fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            status: CleanupStatus::Failed,
            reason: Some(reason),
            message: Some(message.into()),
        }
    }
}

/// Callback invoked once when a mount ends.
pub type CleanupFn = Box<dyn FnOnce(CleanupDetail) + Send>;

/// Exactly-once wrapper around the cleanup callback.
pub struct CleanupNotifier {
    callback: Mutex<Option<CleanupFn>>,
}

impl CleanupNotifier {
    pub fn new(callback: CleanupFn) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
        }
    }

    /// Fire the callback if it has not fired yet. Returns whether this call
    /// was the one that fired it.
    pub fn notify(&self, detail: CleanupDetail) -> bool {
        let callback = self.callback.lock().take();
        match callback {
            Some(callback) => {
                callback(detail);
                true
            }
            None => false,
        }
    }

    /// Whether the callback already fired.
    pub fn has_fired(&self) -> bool {
        self.callback.lock().is_none()
    }
}
