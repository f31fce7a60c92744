//! Repository for the `diagnostics` table and work order derivation.

use fleetcare_core::diagnostic::derive_work_order_description;
use fleetcare_core::types::DbId;
use fleetcare_core::work_order::DERIVED_CREATE_STATUS;
use sqlx::PgPool;

use crate::guard::Guarded;
use crate::models::diagnostic::{CreateDiagnostic, Diagnostic, DiagnosticApproval};
use crate::models::report::Report;
use crate::models::work_order::NewWorkOrder;
use crate::repositories::{ReportRepo, WorkOrderRepo};

/// Column list for `diagnostics` queries.
const COLUMNS: &str = "\
    id, report_id, employee_id, possible_cause, technical_recommendation, \
    required_materials, severity_id, approved_by, approved_at, created_at, updated_at";

/// Provides diagnosis recording and approval.
pub struct DiagnosticRepo;

impl DiagnosticRepo {
    /// Record a diagnosis and move its report to `diagnosing`.
    ///
    /// The report is re-assigned to the diagnosing employee even if someone
    /// else held it. Returns `Blocked` with the report when it is resolved.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDiagnostic,
    ) -> Result<Guarded<Diagnostic, Report>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        match ReportRepo::lock(&mut *tx, input.report_id).await? {
            None => return Ok(Guarded::Missing),
            Some(report) if report.resolved => return Ok(Guarded::Blocked(report)),
            Some(_) => {}
        }

        let query = format!(
            "INSERT INTO diagnostics \
                (report_id, employee_id, possible_cause, technical_recommendation, \
                 required_materials, severity_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let diagnostic = sqlx::query_as::<_, Diagnostic>(&query)
            .bind(input.report_id)
            .bind(input.employee_id)
            .bind(&input.possible_cause)
            .bind(&input.technical_recommendation)
            .bind(&input.required_materials)
            .bind(input.severity.id())
            .fetch_one(&mut *tx)
            .await?;

        ReportRepo::mark_diagnosing(&mut *tx, input.report_id, input.employee_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;
        Ok(Guarded::Applied(diagnostic))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Diagnostic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM diagnostics WHERE id = $1");
        sqlx::query_as::<_, Diagnostic>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_report(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<Diagnostic>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM diagnostics WHERE report_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Diagnostic>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }

    /// Approve a diagnostic and derive its work order in one transaction.
    ///
    /// The approval stamp is a conditional update on `approved_by IS NULL`;
    /// an already approved diagnostic comes back as `Blocked`. The derived
    /// order copies the report's vehicle, is assigned to the diagnosing
    /// employee, starts `pending` and takes its priority from severity.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approver_id: DbId,
    ) -> Result<Guarded<DiagnosticApproval, Diagnostic>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE diagnostics SET approved_by = $2, approved_at = NOW() \
             WHERE id = $1 AND approved_by IS NULL \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, Diagnostic>(&query)
            .bind(id)
            .bind(approver_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(diagnostic) = applied else {
            drop(tx);
            let current = Self::find_by_id(pool, id).await?;
            return Ok(Guarded::from_attempt(None, current));
        };

        let vehicle_id: DbId = sqlx::query_scalar("SELECT vehicle_id FROM reports WHERE id = $1")
            .bind(diagnostic.report_id)
            .fetch_one(&mut *tx)
            .await?;

        let new_order = NewWorkOrder {
            diagnostic_id: Some(diagnostic.id),
            vehicle_id,
            assigned_to_employee_id: Some(diagnostic.employee_id),
            description: derive_work_order_description(
                &diagnostic.possible_cause,
                &diagnostic.technical_recommendation,
                diagnostic.required_materials.as_deref(),
            ),
            status: DERIVED_CREATE_STATUS,
            priority: diagnostic.severity.work_order_priority(),
            estimated_cost: None,
        };
        let work_order = WorkOrderRepo::insert(&mut *tx, &new_order, Some(approver_id)).await?;

        tx.commit().await?;
        Ok(Guarded::Applied(DiagnosticApproval {
            diagnostic,
            work_order,
        }))
    }
}
