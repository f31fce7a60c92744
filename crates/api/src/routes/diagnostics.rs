//! Mounted at `/diagnostics` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::diagnostics;
use crate::state::AppState;

/// Diagnostic routes.
///
/// ```text
/// POST   /                 -> create_diagnostic
/// GET    /{id}             -> get_diagnostic
/// POST   /{id}/approve     -> approve_diagnostic
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(diagnostics::create_diagnostic))
        .route("/{id}", get(diagnostics::get_diagnostic))
        .route("/{id}/approve", post(diagnostics::approve_diagnostic))
}
