//! Route definitions for work orders and their child ledgers.
//!
//! Mounted at `/work-orders` by `api_routes()`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{work_order_children as children, work_orders};
use crate::state::AppState;

/// Work order routes.
///
/// ```text
/// POST   /                              -> create_work_order
/// GET    /                              -> list_work_orders
/// GET    /{id}                          -> get_work_order
/// PUT    /{id}                          -> update_work_order
/// DELETE /{id}                          -> delete_work_order
/// POST   /{id}/submit                   -> submit_work_order
/// POST   /{id}/approve                  -> approve_work_order
/// PUT    /{id}/status                   -> set_work_order_status
/// POST   /{id}/validate                 -> validate_work_order
/// POST   /{id}/activate-vehicle         -> activate_vehicle
/// GET    /{id}/history                  -> list_history
///
/// GET    /{id}/tasks                    -> list_tasks
/// POST   /{id}/tasks                    -> create_task
/// PUT    /{id}/tasks/{task_id}          -> update_task
/// DELETE /{id}/tasks/{task_id}          -> delete_task
/// GET    /{id}/materials                -> list_materials
/// POST   /{id}/materials                -> create_material
/// PUT    /{id}/materials/{material_id}  -> update_material
/// DELETE /{id}/materials/{material_id}  -> delete_material
/// GET    /{id}/evidence                 -> list_evidence
/// POST   /{id}/evidence                 -> create_evidence
/// DELETE /{id}/evidence/{evidence_id}   -> delete_evidence
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(work_orders::create_work_order).get(work_orders::list_work_orders),
        )
        .route(
            "/{id}",
            get(work_orders::get_work_order)
                .put(work_orders::update_work_order)
                .delete(work_orders::delete_work_order),
        )
        .route("/{id}/submit", post(work_orders::submit_work_order))
        .route("/{id}/approve", post(work_orders::approve_work_order))
        .route("/{id}/status", put(work_orders::set_work_order_status))
        .route("/{id}/validate", post(work_orders::validate_work_order))
        .route("/{id}/activate-vehicle", post(work_orders::activate_vehicle))
        .route("/{id}/history", get(work_orders::list_history))
        // -- Child ledgers --
        .route(
            "/{id}/tasks",
            get(children::list_tasks).post(children::create_task),
        )
        .route(
            "/{id}/tasks/{task_id}",
            put(children::update_task).delete(children::delete_task),
        )
        .route(
            "/{id}/materials",
            get(children::list_materials).post(children::create_material),
        )
        .route(
            "/{id}/materials/{material_id}",
            put(children::update_material).delete(children::delete_material),
        )
        .route(
            "/{id}/evidence",
            get(children::list_evidence).post(children::create_evidence),
        )
        .route("/{id}/evidence/{evidence_id}", delete(children::delete_evidence))
}
