//! Route definitions for failure reports.
//!
//! Mounted at `/reports` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Report routes.
///
/// ```text
/// POST   /                    -> create_report
/// GET    /                    -> list_reports
/// GET    /{id}                -> get_report
/// DELETE /{id}                -> delete_report
/// PUT    /{id}/status         -> triage_report
/// POST   /{id}/assign         -> assign_report
/// POST   /{id}/reject         -> reject_report
/// POST   /{id}/resolve        -> resolve_report
/// POST   /{id}/reopen         -> reopen_report
/// GET    /{id}/diagnostics    -> list_report_diagnostics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(reports::create_report).get(reports::list_reports))
        .route(
            "/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route("/{id}/status", put(reports::triage_report))
        .route("/{id}/assign", post(reports::assign_report))
        .route("/{id}/reject", post(reports::reject_report))
        .route("/{id}/resolve", post(reports::resolve_report))
        .route("/{id}/reopen", post(reports::reopen_report))
        .route("/{id}/diagnostics", get(reports::list_report_diagnostics))
}
