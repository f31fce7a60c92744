//! Handlers for the work order orchestrator and the validation gate.
//!
//! Creates and edits write the parent first and its children best-effort
//! afterwards. When any child fails the response is 207 `PARTIAL_FAILURE`
//! carrying the full outcome; the order itself stays persisted.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use validator::Validate;

use fleetcare_core::cost::check_optional_amount;
use fleetcare_core::error::CoreError;
use fleetcare_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use fleetcare_core::types::DbId;
use fleetcare_core::work_order::{
    edit_locked, ensure_activatable, WorkOrderTransition, DIRECT_CREATE_STATUS,
};
use fleetcare_db::models::actor::ActorRequest;
use fleetcare_db::models::work_order::{
    CreateWorkOrder, NewWorkOrder, SetWorkOrderStatus, UpdateWorkOrder, WorkOrder,
    WorkOrderDetail, WorkOrderListParams, WorkOrderWriteOutcome,
};
use fleetcare_db::repositories::{
    DiagnosticRepo, EmployeeRepo, WorkOrderEvidenceRepo, WorkOrderHistoryRepo,
    WorkOrderMaterialRepo, WorkOrderRepo, WorkOrderTaskRepo,
};
use fleetcare_db::ChildBatch;
use fleetcare_events::{event_types, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::{ensure_user, ensure_vehicle, find_order};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "WorkOrder";

// ---------------------------------------------------------------------------
// POST /work-orders
// ---------------------------------------------------------------------------

/// Create a work order directly, together with its child collections.
///
/// Direct orders start `awaiting_approval`. Evidence beyond the per-order
/// cap is dropped and counted in `evidence_dropped`.
pub async fn create_work_order(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateWorkOrder>,
) -> AppResult<Response> {
    input.validate()?;
    check_optional_amount("estimated_cost", input.estimated_cost)?;
    ensure_vehicle(&state.pool, input.vehicle_id).await?;
    if let Some(employee_id) = input.assigned_to_employee_id {
        ensure_employee_exists(&state, employee_id).await?;
    }
    if let Some(diagnostic_id) = input.diagnostic_id {
        DiagnosticRepo::find_by_id(&state.pool, diagnostic_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Diagnostic",
                id: diagnostic_id,
            }))?;
    }

    let new_order = NewWorkOrder {
        diagnostic_id: input.diagnostic_id,
        vehicle_id: input.vehicle_id,
        assigned_to_employee_id: input.assigned_to_employee_id,
        description: input.description.clone(),
        status: DIRECT_CREATE_STATUS,
        priority: input.priority.unwrap_or_default(),
        estimated_cost: input.estimated_cost,
    };
    let batch = ChildBatch {
        tasks: Some(&input.tasks),
        materials: Some(&input.materials),
        evidence: Some(&input.evidence),
        replace: false,
    };

    let outcome = WorkOrderRepo::create_with_children(&state.pool, &new_order, batch).await?;
    respond_with_outcome(&state, outcome, StatusCode::CREATED)
}

// ---------------------------------------------------------------------------
// GET /work-orders
// ---------------------------------------------------------------------------

pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(params): Query<WorkOrderListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let orders =
        WorkOrderRepo::list_filtered(&state.pool, params.status, params.vehicle_id, limit, offset)
            .await?;

    Ok(Json(DataResponse { data: orders }))
}

// ---------------------------------------------------------------------------
// GET /work-orders/{id}
// ---------------------------------------------------------------------------

/// Return the order with its tasks, materials, evidence and material total.
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = find_order(&state.pool, id).await?;

    let (tasks, materials, evidence) = tokio::try_join!(
        WorkOrderTaskRepo::list_for_work_order(&state.pool, id),
        WorkOrderMaterialRepo::list_for_work_order(&state.pool, id),
        WorkOrderEvidenceRepo::list_for_work_order(&state.pool, id),
    )?;
    let detail = WorkOrderDetail::assemble(order, tasks, materials, evidence)?;

    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// PUT /work-orders/{id}
// ---------------------------------------------------------------------------

/// Edit an order. Scalar fields are patched; each child collection present
/// in the body replaces the stored one wholesale.
pub async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateWorkOrder>,
) -> AppResult<Response> {
    if let Some(description) = &input.description {
        if description.trim().is_empty() {
            return Err(AppError::Core(CoreError::InvalidField {
                field: "description".to_string(),
                message: "must not be empty".to_string(),
            }));
        }
    }
    check_optional_amount("estimated_cost", input.estimated_cost)?;
    check_optional_amount("actual_cost", input.actual_cost)?;
    if let Some(employee_id) = input.assigned_to_employee_id {
        ensure_employee_exists(&state, employee_id).await?;
    }

    let batch = ChildBatch {
        tasks: input.tasks.as_deref(),
        materials: input.materials.as_deref(),
        evidence: input.evidence.as_deref(),
        replace: true,
    };
    let outcome = WorkOrderRepo::update_with_children(&state.pool, id, &input, batch)
        .await?
        .into_result(ENTITY, id, |current| edit_locked(id, current.status))?;

    tracing::info!(work_order_id = id, "Work order updated");
    respond_with_outcome(&state, outcome, StatusCode::OK)
}

// ---------------------------------------------------------------------------
// DELETE /work-orders/{id}
// ---------------------------------------------------------------------------

pub async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !WorkOrderRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: ENTITY, id }));
    }
    tracing::info!(work_order_id = id, "Work order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// POST /work-orders/{id}/submit
// ---------------------------------------------------------------------------

/// Send a `pending` order (e.g. one derived from a diagnostic) for approval.
pub async fn submit_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = apply_transition(&state, id, WorkOrderTransition::Submit, None).await?;
    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// POST /work-orders/{id}/approve
// ---------------------------------------------------------------------------

/// Approve an order awaiting approval; work starts and the vehicle goes
/// into the shop.
pub async fn approve_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_user(&state.pool, input.user_id).await?;
    let order =
        apply_transition(&state, id, WorkOrderTransition::Approve, Some(input.user_id)).await?;
    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// PUT /work-orders/{id}/status
// ---------------------------------------------------------------------------

/// Request a status by name. `completed` is stored as `awaiting_validation`.
pub async fn set_work_order_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<SetWorkOrderStatus>,
) -> AppResult<impl IntoResponse> {
    let transition = WorkOrderTransition::for_requested_status(input.status)?;
    let order = apply_transition(&state, id, transition, None).await?;
    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// POST /work-orders/{id}/validate
// ---------------------------------------------------------------------------

pub async fn validate_work_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_user(&state.pool, input.user_id).await?;
    let order =
        apply_transition(&state, id, WorkOrderTransition::Validate, Some(input.user_id)).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::WORK_ORDER_VALIDATED)
            .with_source("work_order", id)
            .with_actor(input.user_id)
            .with_payload(serde_json::json!({ "vehicle_id": order.vehicle_id })),
    );

    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// POST /work-orders/{id}/activate-vehicle
// ---------------------------------------------------------------------------

/// Put the vehicle of a validated order back in service, once.
pub async fn activate_vehicle(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let activation = WorkOrderRepo::activate_vehicle(&state.pool, id)
        .await?
        .into_result(ENTITY, id, |current| {
            match ensure_activatable(id, current.status, current.activated_at.is_some()) {
                Err(err) => err,
                Ok(()) => CoreError::Conflict(format!(
                    "Vehicle for work order {id} could not be activated"
                )),
            }
        })?;

    let vehicle = &activation.vehicle;
    tracing::info!(
        work_order_id = id,
        vehicle_id = vehicle.id,
        license_plate = %vehicle.license_plate,
        "Vehicle activated",
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::VEHICLE_ACTIVATED)
            .with_source("work_order", id)
            .with_payload(serde_json::json!({
                "vehicle_id": vehicle.id,
                "license_plate": vehicle.license_plate,
            })),
    );

    Ok(Json(DataResponse { data: activation }))
}

// ---------------------------------------------------------------------------
// GET /work-orders/{id}/history
// ---------------------------------------------------------------------------

pub async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_order(&state.pool, id).await?;
    let history = WorkOrderHistoryRepo::list_for_work_order(&state.pool, id).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn apply_transition(
    state: &AppState,
    id: DbId,
    transition: WorkOrderTransition,
    actor_user_id: Option<DbId>,
) -> AppResult<WorkOrder> {
    let order = WorkOrderRepo::transition(&state.pool, id, transition, actor_user_id)
        .await?
        .into_result(ENTITY, id, |current| transition.conflict(current.status))?;

    tracing::info!(
        work_order_id = id,
        action = transition.name(),
        status = %order.status,
        user_id = ?actor_user_id,
        "Work order transition applied",
    );
    Ok(order)
}

async fn ensure_employee_exists(state: &AppState, id: DbId) -> AppResult<()> {
    EmployeeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Employee",
            id,
        }))?;
    Ok(())
}

/// Answer a create or edit: `success` when every child was written,
/// otherwise 207 with the outcome and a `work_order.partial_failure` event.
fn respond_with_outcome(
    state: &AppState,
    outcome: WorkOrderWriteOutcome,
    success: StatusCode,
) -> AppResult<Response> {
    if outcome.is_complete() {
        return Ok((success, Json(DataResponse { data: outcome })).into_response());
    }

    let collections = outcome.failed_collections();
    tracing::warn!(
        work_order_id = outcome.order.id,
        failures = outcome.failures.len(),
        failed_collections = ?collections,
        "Work order saved with failed child writes",
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::WORK_ORDER_PARTIAL_FAILURE)
            .with_source("work_order", outcome.order.id)
            .with_payload(serde_json::json!({ "failed_collections": collections })),
    );

    Err(AppError::PartialFailure(Box::new(outcome)))
}
