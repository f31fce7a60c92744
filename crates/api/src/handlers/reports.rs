//! Handlers for report intake and assignment.
//!
//! Every status change is a guarded update in `ReportRepo`; a miss is
//! reported as 404 when the report is gone and 409 otherwise.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use fleetcare_core::error::CoreError;
use fleetcare_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use fleetcare_core::report::{
    transition_conflict, validate_intake_status, ReportStatus, ASSIGNABLE_FROM,
    INTAKE_STATUSES, REJECTABLE_FROM,
};
use fleetcare_core::types::DbId;
use fleetcare_db::models::report::{AssignReport, CreateReport, ReportListParams, TriageReport};
use fleetcare_db::repositories::{DiagnosticRepo, ReportRepo};
use fleetcare_events::{event_types, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::{ensure_employee, ensure_user, ensure_vehicle};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "Report";

// ---------------------------------------------------------------------------
// POST /reports
// ---------------------------------------------------------------------------

/// Record a new failure report. Status defaults to `new`.
pub async fn create_report(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateReport>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let status = input.status.unwrap_or(ReportStatus::New);
    validate_intake_status(status)?;

    ensure_vehicle(&state.pool, input.vehicle_id).await?;
    ensure_user(&state.pool, input.reported_by).await?;

    let report = ReportRepo::create(&state.pool, &input, status).await?;

    tracing::info!(
        report_id = report.id,
        vehicle_id = report.vehicle_id,
        status = %report.status,
        "Report created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

// ---------------------------------------------------------------------------
// GET /reports
// ---------------------------------------------------------------------------

pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let reports =
        ReportRepo::list_filtered(&state.pool, params.status, params.vehicle_id, limit, offset)
            .await?;

    Ok(Json(DataResponse { data: reports }))
}

// ---------------------------------------------------------------------------
// GET /reports/{id}
// ---------------------------------------------------------------------------

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: ENTITY, id }))?;

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// DELETE /reports/{id}
// ---------------------------------------------------------------------------

/// Hard-delete a report. A report with diagnostics is refused by the
/// foreign key and surfaces as 409.
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ReportRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: ENTITY, id }));
    }
    tracing::info!(report_id = id, "Report deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// PUT /reports/{id}/status
// ---------------------------------------------------------------------------

/// Move a report between the intake statuses before it is assigned.
pub async fn triage_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<TriageReport>,
) -> AppResult<impl IntoResponse> {
    validate_intake_status(input.status)?;

    let report = ReportRepo::triage(&state.pool, id, input.status)
        .await?
        .into_result(ENTITY, id, |current| {
            transition_conflict("triage", current.status, INTAKE_STATUSES)
        })?;

    tracing::info!(report_id = id, status = %report.status, "Report triaged");

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /reports/{id}/assign
// ---------------------------------------------------------------------------

pub async fn assign_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<AssignReport>,
) -> AppResult<impl IntoResponse> {
    ensure_employee(&state.pool, input.employee_id).await?;

    let report = ReportRepo::assign(&state.pool, id, input.employee_id)
        .await?
        .into_result(ENTITY, id, |current| {
            transition_conflict("assign", current.status, ASSIGNABLE_FROM)
        })?;

    tracing::info!(report_id = id, employee_id = input.employee_id, "Report assigned");

    state.event_bus.publish(
        PlatformEvent::new(event_types::REPORT_ASSIGNED)
            .with_source("report", id)
            .with_payload(serde_json::json!({ "employee_id": input.employee_id })),
    );

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /reports/{id}/reject
// ---------------------------------------------------------------------------

/// Return a report to `new` and clear its assignment.
///
/// Accepted from every unresolved status. A resolved report answers 409
/// instead of resetting: resetting it to `new` would either leave
/// `resolved = true` on a `new` report or silently reopen it, so callers
/// must `reopen` first.
pub async fn reject_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::reject(&state.pool, id)
        .await?
        .into_result(ENTITY, id, |current| {
            transition_conflict("reject", current.status, REJECTABLE_FROM)
        })?;

    tracing::info!(report_id = id, "Report rejected");

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /reports/{id}/resolve
// ---------------------------------------------------------------------------

pub async fn resolve_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::resolve(&state.pool, id)
        .await?
        .into_result(ENTITY, id, |current| {
            transition_conflict("resolve", current.status, REJECTABLE_FROM)
        })?;

    tracing::info!(report_id = id, "Report resolved");

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /reports/{id}/reopen
// ---------------------------------------------------------------------------

/// Clear the resolution and step the status back to where work stopped.
pub async fn reopen_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::reopen(&state.pool, id)
        .await?
        .into_result(ENTITY, id, |current| {
            transition_conflict("reopen", current.status, &[ReportStatus::Resolved])
        })?;

    tracing::info!(report_id = id, status = %report.status, "Report reopened");

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// GET /reports/{id}/diagnostics
// ---------------------------------------------------------------------------

pub async fn list_report_diagnostics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: ENTITY, id }))?;

    let diagnostics = DiagnosticRepo::list_for_report(&state.pool, id).await?;
    Ok(Json(DataResponse { data: diagnostics }))
}
