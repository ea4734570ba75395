//! Router construction.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::files;
use crate::state::AppState;

/// Create the application router.
///
/// Every path is handled by the bundle fallback.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(files::serve_file)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
