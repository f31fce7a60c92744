//! Failure report statuses and intake/assignment guards.
//!
//! Lifecycle: `new -> assigned -> diagnosing -> resolved`. Before assignment
//! a report may move freely between the intake statuses (`new`,
//! `preliminary`, `in_transit`). `reject` returns any unresolved report to
//! `new`; `reopen` is only valid from `resolved`.

use crate::error::CoreError;
use crate::lookup::define_lookup_enum;

define_lookup_enum! {
    /// Report lifecycle status (`report_statuses`).
    ReportStatus ("ReportStatus") {
        New = 1 => "new",
        Preliminary = 2 => "preliminary",
        /// Vehicle is being towed or rescued to the workshop.
        InTransit = 3 => "in_transit",
        Assigned = 4 => "assigned",
        Diagnosing = 5 => "diagnosing",
        Resolved = 6 => "resolved",
    }
}

/// Statuses a report may hold before anyone is assigned to it.
pub const INTAKE_STATUSES: &[ReportStatus] = &[
    ReportStatus::New,
    ReportStatus::Preliminary,
    ReportStatus::InTransit,
];

/// Statuses from which `assign` is accepted. Reassignment is allowed until
/// a diagnosis starts.
pub const ASSIGNABLE_FROM: &[ReportStatus] = &[
    ReportStatus::New,
    ReportStatus::Preliminary,
    ReportStatus::InTransit,
    ReportStatus::Assigned,
];

/// Statuses from which `reject` is accepted (everything but `resolved`, so a
/// `resolved` flag never sits on a `new` report).
pub const REJECTABLE_FROM: &[ReportStatus] = &[
    ReportStatus::New,
    ReportStatus::Preliminary,
    ReportStatus::InTransit,
    ReportStatus::Assigned,
    ReportStatus::Diagnosing,
];

impl ReportStatus {
    /// Whether the status belongs to the pre-assignment intake phase.
    pub fn is_intake(self) -> bool {
        INTAKE_STATUSES.contains(&self)
    }
}

/// Status a report takes when it is reopened.
///
/// Falls back along the lifecycle to the furthest point the report had
/// reached before resolution.
pub fn reopen_target(has_diagnostic: bool, has_assignee: bool) -> ReportStatus {
    match (has_diagnostic, has_assignee) {
        (true, _) => ReportStatus::Diagnosing,
        (false, true) => ReportStatus::Assigned,
        (false, false) => ReportStatus::New,
    }
}

/// Validate the status requested at intake time.
pub fn validate_intake_status(status: ReportStatus) -> Result<(), CoreError> {
    if status.is_intake() {
        Ok(())
    } else {
        Err(CoreError::InvalidField {
            field: "status".to_string(),
            message: format!(
                "'{status}' is not an intake status; expected one of: {}",
                names(INTAKE_STATUSES)
            ),
        })
    }
}

/// Build the conflict error returned when a guarded report update matched
/// no row although the report exists.
pub fn transition_conflict(
    action: &str,
    current: ReportStatus,
    allowed: &[ReportStatus],
) -> CoreError {
    CoreError::Conflict(format!(
        "Cannot {action} a report in status '{current}'. Allowed from: {}",
        names(allowed)
    ))
}

pub(crate) fn names<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
