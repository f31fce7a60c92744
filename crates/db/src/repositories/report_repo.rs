//! Repository for the `reports` table.
//!
//! Every status change is a single conditional `UPDATE` whose `WHERE`
//! clause encodes the allowed source statuses. When it matches nothing the
//! row is re-read so callers can tell a missing report from a blocked one.

use fleetcare_core::report::{
    reopen_target, ReportStatus, ASSIGNABLE_FROM, INTAKE_STATUSES, REJECTABLE_FROM,
};
use fleetcare_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::guard::Guarded;
use crate::models::report::{CreateReport, Report};

/// Column list for `reports` queries.
const COLUMNS: &str = "\
    id, vehicle_id, reported_by, description, status_id, \
    assigned_employee_id, assigned_at, resolved, resolved_date, \
    created_at, updated_at";

/// Provides intake, lookup and guarded transitions for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a new report with the given intake status.
    pub async fn create(
        pool: &PgPool,
        input: &CreateReport,
        status: ReportStatus,
    ) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (vehicle_id, reported_by, description, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(input.vehicle_id)
            .bind(input.reported_by)
            .bind(&input.description)
            .bind(status.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List reports with optional status and vehicle filters, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        status: Option<ReportStatus>,
        vehicle_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Report>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if status.is_some() {
            conditions.push(format!("status_id = ${param_idx}"));
            param_idx += 1;
        }
        if vehicle_id.is_some() {
            conditions.push(format!("vehicle_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM reports {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Report>(&query);
        if let Some(s) = status {
            q = q.bind(s.id());
        }
        if let Some(vid) = vehicle_id {
            q = q.bind(vid);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Hard-delete a report. Fails with a foreign-key violation while a
    /// diagnostic still references it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a report between intake statuses.
    pub async fn triage(
        pool: &PgPool,
        id: DbId,
        status: ReportStatus,
    ) -> Result<Guarded<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET status_id = $2 \
             WHERE id = $1 AND status_id = ANY($3) \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(status.id())
            .bind(ReportStatus::ids(INTAKE_STATUSES))
            .fetch_optional(pool)
            .await?;
        Self::settle(pool, id, applied).await
    }

    /// Assign a report to an employee and move it to `assigned`.
    pub async fn assign(
        pool: &PgPool,
        id: DbId,
        employee_id: DbId,
    ) -> Result<Guarded<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET \
                assigned_employee_id = $2, assigned_at = NOW(), status_id = $3 \
             WHERE id = $1 AND status_id = ANY($4) \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(employee_id)
            .bind(ReportStatus::Assigned.id())
            .bind(ReportStatus::ids(ASSIGNABLE_FROM))
            .fetch_optional(pool)
            .await?;
        Self::settle(pool, id, applied).await
    }

    /// Return an unresolved report to `new` and clear its assignment.
    pub async fn reject(pool: &PgPool, id: DbId) -> Result<Guarded<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET \
                status_id = $2, assigned_employee_id = NULL, assigned_at = NULL \
             WHERE id = $1 AND status_id = ANY($3) \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(ReportStatus::New.id())
            .bind(ReportStatus::ids(REJECTABLE_FROM))
            .fetch_optional(pool)
            .await?;
        Self::settle(pool, id, applied).await
    }

    /// Mark an unresolved report as resolved.
    pub async fn resolve(pool: &PgPool, id: DbId) -> Result<Guarded<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET \
                resolved = TRUE, resolved_date = NOW(), status_id = $2 \
             WHERE id = $1 AND NOT resolved \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(ReportStatus::Resolved.id())
            .fetch_optional(pool)
            .await?;
        Self::settle(pool, id, applied).await
    }

    /// Reopen a resolved report.
    ///
    /// The resolution is cleared and the status falls back to the furthest
    /// stage the report had reached (see [`reopen_target`]).
    pub async fn reopen(pool: &PgPool, id: DbId) -> Result<Guarded<Report>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current = match Self::lock(&mut *tx, id).await? {
            None => return Ok(Guarded::Missing),
            Some(report) if !report.resolved => return Ok(Guarded::Blocked(report)),
            Some(report) => report,
        };

        let has_diagnostic = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM diagnostics WHERE report_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let target = reopen_target(has_diagnostic, current.assigned_employee_id.is_some());

        let query = format!(
            "UPDATE reports SET \
                resolved = FALSE, resolved_date = NULL, status_id = $2 \
             WHERE id = $1 AND resolved \
             RETURNING {COLUMNS}"
        );
        let report = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(target.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Guarded::Applied(report))
    }

    /// Put a report into `diagnosing` and re-assert its assignment to the
    /// diagnosing employee. Runs inside the caller's transaction.
    ///
    /// Returns `None` if the report is missing or already resolved.
    pub async fn mark_diagnosing(
        conn: &mut PgConnection,
        id: DbId,
        employee_id: DbId,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET \
                status_id = $2, assigned_employee_id = $3, assigned_at = NOW() \
             WHERE id = $1 AND NOT resolved \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(ReportStatus::Diagnosing.id())
            .bind(employee_id)
            .fetch_optional(conn)
            .await
    }

    /// Lock a report row for the rest of the caller's transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve a guarded update that may have matched nothing.
    async fn settle(
        pool: &PgPool,
        id: DbId,
        applied: Option<Report>,
    ) -> Result<Guarded<Report>, sqlx::Error> {
        if let Some(report) = applied {
            return Ok(Guarded::Applied(report));
        }
        let current = Self::find_by_id(pool, id).await?;
        Ok(Guarded::from_attempt(None, current))
    }
}
