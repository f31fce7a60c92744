//! Mounted at `/work-order-materials` by `api_routes()`.

use axum::routing::post;
use axum::Router;

use crate::handlers::work_order_children;
use crate::state::AppState;

/// ```text
/// POST   /{id}/approve     -> approve_material
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/approve", post(work_order_children::approve_material))
}
