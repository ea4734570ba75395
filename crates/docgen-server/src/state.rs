//! Application state.

use std::sync::Arc;

use crate::CompileFn;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Builds a fresh bundle for every request.
    pub(crate) compile: Arc<CompileFn>,
}
