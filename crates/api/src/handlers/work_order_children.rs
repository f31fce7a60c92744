//! Handlers for the task, material and evidence ledgers of a work order.
//!
//! Writes are refused with 409 once the parent is validated or cancelled.
//! Material totals always come from the cost ledger; a submitted `total`
//! is ignored.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use fleetcare_core::error::CoreError;
use fleetcare_core::types::DbId;
use fleetcare_core::work_order::MAX_EVIDENCE_PER_ORDER;
use fleetcare_db::models::actor::ActorRequest;
use fleetcare_db::models::work_order_evidence::CreateWorkOrderEvidence;
use fleetcare_db::models::work_order_material::{
    CreateWorkOrderMaterial, MaterialLine, UpdateWorkOrderMaterial,
};
use fleetcare_db::models::work_order_task::{CreateWorkOrderTask, UpdateWorkOrderTask};
use fleetcare_db::repositories::{WorkOrderEvidenceRepo, WorkOrderMaterialRepo, WorkOrderTaskRepo};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::{editable_order, ensure_user, find_order};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// GET /work-orders/{id}/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_order(&state.pool, id).await?;
    let tasks = WorkOrderTaskRepo::list_for_work_order(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /work-orders/{id}/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<CreateWorkOrderTask>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    editable_order(&state.pool, id).await?;

    let task = WorkOrderTaskRepo::create(&state.pool, id, &input).await?;
    tracing::info!(work_order_id = id, task_id = task.id, "Task added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// PUT /work-orders/{id}/tasks/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<UpdateWorkOrderTask>,
) -> AppResult<impl IntoResponse> {
    if input.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(AppError::Core(CoreError::InvalidField {
            field: "description".to_string(),
            message: "must not be empty".to_string(),
        }));
    }
    editable_order(&state.pool, id).await?;

    let task = WorkOrderTaskRepo::update(&state.pool, id, task_id, &input)
        .await?
        .ok_or_else(|| not_found("WorkOrderTask", task_id))?;

    Ok(Json(DataResponse { data: task }))
}

/// DELETE /work-orders/{id}/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    editable_order(&state.pool, id).await?;
    if !WorkOrderTaskRepo::delete(&state.pool, id, task_id).await? {
        return Err(not_found("WorkOrderTask", task_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// GET /work-orders/{id}/materials
pub async fn list_materials(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_order(&state.pool, id).await?;
    let materials = WorkOrderMaterialRepo::list_for_work_order(&state.pool, id).await?;
    Ok(Json(DataResponse { data: materials }))
}

/// POST /work-orders/{id}/materials
///
/// The line starts unapproved with `total = quantity_needed * unit_cost`.
pub async fn create_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<CreateWorkOrderMaterial>,
) -> AppResult<impl IntoResponse> {
    let line = MaterialLine::from_create(&input)?;
    editable_order(&state.pool, id).await?;

    let material = WorkOrderMaterialRepo::create(&state.pool, id, &line).await?;
    tracing::info!(
        work_order_id = id,
        material_id = material.id,
        total = %material.total,
        "Material added",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// PUT /work-orders/{id}/materials/{material_id}
///
/// Recomputes the total from the merged values and clears the approval.
pub async fn update_material(
    State(state): State<AppState>,
    Path((id, material_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<UpdateWorkOrderMaterial>,
) -> AppResult<impl IntoResponse> {
    editable_order(&state.pool, id).await?;

    let current = WorkOrderMaterialRepo::find_by_id(&state.pool, material_id)
        .await?
        .filter(|m| m.work_order_id == id)
        .ok_or_else(|| not_found("WorkOrderMaterial", material_id))?;
    let line = MaterialLine::merged(&current, &input)?;

    let material = WorkOrderMaterialRepo::update(&state.pool, id, material_id, &line)
        .await?
        .ok_or_else(|| not_found("WorkOrderMaterial", material_id))?;

    tracing::info!(
        work_order_id = id,
        material_id,
        total = %material.total,
        "Material updated, approval cleared",
    );

    Ok(Json(DataResponse { data: material }))
}

/// DELETE /work-orders/{id}/materials/{material_id}
pub async fn delete_material(
    State(state): State<AppState>,
    Path((id, material_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    editable_order(&state.pool, id).await?;
    if !WorkOrderMaterialRepo::delete(&state.pool, id, material_id).await? {
        return Err(not_found("WorkOrderMaterial", material_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /work-order-materials/{id}/approve
pub async fn approve_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_user(&state.pool, input.user_id).await?;

    let material = WorkOrderMaterialRepo::approve(&state.pool, id, input.user_id)
        .await?
        .into_result("WorkOrderMaterial", id, |current| {
            CoreError::Conflict(format!("Material {} is already approved", current.id))
        })?;

    tracing::info!(
        material_id = id,
        work_order_id = material.work_order_id,
        user_id = input.user_id,
        "Material approved",
    );

    Ok(Json(DataResponse { data: material }))
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// GET /work-orders/{id}/evidence
pub async fn list_evidence(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_order(&state.pool, id).await?;
    let evidence = WorkOrderEvidenceRepo::list_for_work_order(&state.pool, id).await?;
    Ok(Json(DataResponse { data: evidence }))
}

/// POST /work-orders/{id}/evidence
pub async fn create_evidence(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<CreateWorkOrderEvidence>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    editable_order(&state.pool, id).await?;

    let evidence =
        WorkOrderEvidenceRepo::create_capped(&state.pool, id, &input, MAX_EVIDENCE_PER_ORDER)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(format!(
                    "Work order {id} already holds {MAX_EVIDENCE_PER_ORDER} evidence items"
                )))
            })?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: evidence })))
}

/// DELETE /work-orders/{id}/evidence/{evidence_id}
pub async fn delete_evidence(
    State(state): State<AppState>,
    Path((id, evidence_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    editable_order(&state.pool, id).await?;
    if !WorkOrderEvidenceRepo::delete(&state.pool, id, evidence_id).await? {
        return Err(not_found("WorkOrderEvidence", evidence_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
