//! Handlers for diagnostics and work-order derivation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use fleetcare_core::error::CoreError;
use fleetcare_core::types::DbId;
use fleetcare_db::models::actor::ActorRequest;
use fleetcare_db::models::diagnostic::CreateDiagnostic;
use fleetcare_db::repositories::DiagnosticRepo;
use fleetcare_events::{event_types, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::{ensure_employee, ensure_user};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /diagnostics
// ---------------------------------------------------------------------------

/// Record a diagnosis. The report moves to `diagnosing` and is assigned to
/// the diagnosing employee in the same transaction.
pub async fn create_diagnostic(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateDiagnostic>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    ensure_employee(&state.pool, input.employee_id).await?;

    let report_id = input.report_id;
    let diagnostic = DiagnosticRepo::create(&state.pool, &input)
        .await?
        .into_result("Report", report_id, |report| {
            CoreError::Conflict(format!(
                "Report {} is resolved; reopen it before adding a diagnostic",
                report.id
            ))
        })?;

    tracing::info!(
        diagnostic_id = diagnostic.id,
        report_id,
        employee_id = diagnostic.employee_id,
        severity = %diagnostic.severity,
        "Diagnostic created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: diagnostic })))
}

// ---------------------------------------------------------------------------
// GET /diagnostics/{id}
// ---------------------------------------------------------------------------

pub async fn get_diagnostic(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let diagnostic = DiagnosticRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Diagnostic",
            id,
        }))?;

    Ok(Json(DataResponse { data: diagnostic }))
}

// ---------------------------------------------------------------------------
// POST /diagnostics/{id}/approve
// ---------------------------------------------------------------------------

/// Approve a diagnostic and derive its work order.
///
/// Responds with `{diagnostic, work_order}`; both were committed together.
pub async fn approve_diagnostic(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_user(&state.pool, input.user_id).await?;

    let approval = DiagnosticRepo::approve(&state.pool, id, input.user_id)
        .await?
        .into_result("Diagnostic", id, |current| {
            CoreError::Conflict(format!(
                "Diagnostic {} was already approved by user {}",
                current.id,
                current.approved_by.unwrap_or_default()
            ))
        })?;

    let work_order = &approval.work_order;
    tracing::info!(
        diagnostic_id = id,
        work_order_id = work_order.id,
        priority = %work_order.priority,
        user_id = input.user_id,
        "Diagnostic approved, work order derived",
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::DIAGNOSTIC_APPROVED)
            .with_source("diagnostic", id)
            .with_actor(input.user_id)
            .with_payload(serde_json::json!({
                "work_order_id": work_order.id,
                "priority": work_order.priority,
            })),
    );

    Ok(Json(DataResponse { data: approval }))
}
