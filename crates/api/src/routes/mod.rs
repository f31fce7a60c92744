pub mod diagnostics;
pub mod health;
pub mod reports;
pub mod work_order_materials;
pub mod work_orders;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /reports                                   create, list
/// /reports/{id}                              get, delete
/// /reports/{id}/status                       triage (PUT)
/// /reports/{id}/assign                       assign (POST)
/// /reports/{id}/reject                       reject (POST)
/// /reports/{id}/resolve                      resolve (POST)
/// /reports/{id}/reopen                       reopen (POST)
/// /reports/{id}/diagnostics                  list diagnostics
///
/// /diagnostics                               create
/// /diagnostics/{id}                          get
/// /diagnostics/{id}/approve                  approve, derives a work order (POST)
///
/// /work-orders                               create, list
/// /work-orders/{id}                          get (detail), update, delete
/// /work-orders/{id}/submit                   pending -> awaiting_approval (POST)
/// /work-orders/{id}/approve                  approve (POST)
/// /work-orders/{id}/status                   set status (PUT)
/// /work-orders/{id}/validate                 validate (POST)
/// /work-orders/{id}/activate-vehicle         reactivate vehicle (POST)
/// /work-orders/{id}/history                  transition history
/// /work-orders/{id}/tasks[/{task_id}]        task ledger
/// /work-orders/{id}/materials[/{material_id}] material ledger
/// /work-orders/{id}/evidence[/{evidence_id}] evidence ledger
///
/// /work-order-materials/{id}/approve         approve material line (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/reports", reports::router())
        .nest("/diagnostics", diagnostics::router())
        .nest("/work-orders", work_orders::router())
        .nest("/work-order-materials", work_order_materials::router())
}
