//! Application state
//!
//! Holds the shared state for the Axum application: the tracker context
//! and the settings handlers need at request time.

use tracker_common::Environment;
use tracker_service::TrackerContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Ports, snapshot store, serializer and tracking registry
    tracker: TrackerContext,
}

impl AppState {
    pub fn new(tracker: TrackerContext) -> Self {
        Self { tracker }
    }

    /// Get the tracker context
    pub fn tracker(&self) -> &TrackerContext {
        &self.tracker
    }

    pub fn environment(&self) -> Environment {
        self.tracker.environment()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tracker", &self.tracker)
            .finish()
    }
}
