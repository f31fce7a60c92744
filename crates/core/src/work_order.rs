//! Work order status machine, priorities and child-ledger rules.
//!
//! ```text
//! pending ──submit──> awaiting_approval ──approve──> in_progress
//!                                                       │
//!                                            complete (stored as)
//!                                                       v
//!                      validated <──validate── awaiting_validation
//! ```
//!
//! `cancelled` is reachable from `pending`, `awaiting_approval` and
//! `in_progress`. `completed` is never persisted: a request for it is
//! rewritten to `awaiting_validation` in the same update.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lookup::define_lookup_enum;
use crate::report::names;

define_lookup_enum! {
    /// Work order lifecycle status (`work_order_statuses`).
    WorkOrderStatus ("WorkOrderStatus") {
        AwaitingApproval = 1 => "awaiting_approval",
        Pending = 2 => "pending",
        InProgress = 3 => "in_progress",
        /// Request-only value; stored as `awaiting_validation`.
        Completed = 4 => "completed",
        AwaitingValidation = 5 => "awaiting_validation",
        Validated = 6 => "validated",
        Cancelled = 7 => "cancelled",
    }
}

define_lookup_enum! {
    /// Work order priority (`work_order_priorities`).
    WorkOrderPriority ("WorkOrderPriority") {
        Low = 1 => "low",
        Normal = 2 => "normal",
        High = 3 => "high",
    }
}

impl Default for WorkOrderPriority {
    fn default() -> Self {
        WorkOrderPriority::Normal
    }
}

/// Status of a work order created directly (not derived from a diagnostic).
pub const DIRECT_CREATE_STATUS: WorkOrderStatus = WorkOrderStatus::AwaitingApproval;

/// Status of a work order derived from an approved diagnostic.
pub const DERIVED_CREATE_STATUS: WorkOrderStatus = WorkOrderStatus::Pending;

/// Orders in these statuses no longer accept field or child edits.
pub const EDIT_LOCKED: &[WorkOrderStatus] =
    &[WorkOrderStatus::Validated, WorkOrderStatus::Cancelled];

/// Maximum number of evidence items attached to one work order.
pub const MAX_EVIDENCE_PER_ORDER: usize = 10;

impl WorkOrderStatus {
    /// The value actually written when this status is requested.
    pub fn persisted_form(self) -> WorkOrderStatus {
        match self {
            WorkOrderStatus::Completed => WorkOrderStatus::AwaitingValidation,
            other => other,
        }
    }

    /// Whether the order still accepts edits to its fields and children.
    pub fn is_editable(self) -> bool {
        !EDIT_LOCKED.contains(&self)
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A guarded move along the work order status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderTransition {
    Submit,
    Approve,
    Complete,
    Validate,
    Cancel,
}

impl WorkOrderTransition {
    /// Statuses the order must currently hold for the transition to apply.
    pub fn sources(self) -> &'static [WorkOrderStatus] {
        match self {
            Self::Submit => &[WorkOrderStatus::Pending],
            Self::Approve => &[WorkOrderStatus::AwaitingApproval],
            Self::Complete => &[WorkOrderStatus::InProgress],
            Self::Validate => &[WorkOrderStatus::AwaitingValidation],
            Self::Cancel => &[
                WorkOrderStatus::Pending,
                WorkOrderStatus::AwaitingApproval,
                WorkOrderStatus::InProgress,
            ],
        }
    }

    /// Status written by the transition.
    pub fn target(self) -> WorkOrderStatus {
        match self {
            Self::Submit => WorkOrderStatus::AwaitingApproval,
            Self::Approve => WorkOrderStatus::InProgress,
            Self::Complete => WorkOrderStatus::Completed.persisted_form(),
            Self::Validate => WorkOrderStatus::Validated,
            Self::Cancel => WorkOrderStatus::Cancelled,
        }
    }

    /// Verb used in messages and history rows.
    pub fn name(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Complete => "complete",
            Self::Validate => "validate",
            Self::Cancel => "cancel",
        }
    }

    /// Source ids for a `status_id = ANY($n)` guard.
    pub fn source_ids(self) -> Vec<i16> {
        WorkOrderStatus::ids(self.sources())
    }

    /// Whether the transition may start from `current`.
    pub fn applies_to(self, current: WorkOrderStatus) -> bool {
        self.sources().contains(&current)
    }

    /// Map a `setStatus` request to the transition it performs.
    ///
    /// `in_progress` and `validated` carry an actor and must go through the
    /// approve/validate actions; `pending` is only ever an initial status.
    pub fn for_requested_status(requested: WorkOrderStatus) -> Result<Self, CoreError> {
        match requested {
            WorkOrderStatus::AwaitingApproval => Ok(Self::Submit),
            WorkOrderStatus::Completed | WorkOrderStatus::AwaitingValidation => Ok(Self::Complete),
            WorkOrderStatus::Cancelled => Ok(Self::Cancel),
            WorkOrderStatus::InProgress => Err(status_field_error(
                "use the approve action to start work on an order",
            )),
            WorkOrderStatus::Validated => Err(status_field_error(
                "use the validate action to validate an order",
            )),
            WorkOrderStatus::Pending => Err(status_field_error(
                "an order cannot be moved back to 'pending'",
            )),
        }
    }

    /// Conflict returned when the guard matched no row for an existing order.
    pub fn conflict(self, current: WorkOrderStatus) -> CoreError {
        CoreError::Conflict(format!(
            "Cannot {} a work order in status '{current}'. Allowed from: {}",
            self.name(),
            names(self.sources())
        ))
    }
}

fn status_field_error(message: &str) -> CoreError {
    CoreError::InvalidField {
        field: "status".to_string(),
        message: message.to_string(),
    }
}

/// Ensure a work order still accepts edits.
pub fn ensure_editable(id: i64, status: WorkOrderStatus) -> Result<(), CoreError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(edit_locked(id, status))
    }
}

/// Conflict returned for an edit against a locked order.
pub fn edit_locked(id: i64, status: WorkOrderStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Work order {id} is '{status}' and can no longer be edited"
    ))
}

/// Ensure the vehicle behind a work order may be reactivated.
pub fn ensure_activatable(
    id: i64,
    status: WorkOrderStatus,
    already_activated: bool,
) -> Result<(), CoreError> {
    if already_activated {
        return Err(CoreError::Conflict(format!(
            "Vehicle for work order {id} was already activated"
        )));
    }
    if status != WorkOrderStatus::Validated {
        return Err(CoreError::Conflict(format!(
            "Work order {id} is '{status}'; only validated orders can activate their vehicle"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Child ledgers
// ---------------------------------------------------------------------------

/// The three child collections of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCollection {
    Tasks,
    Materials,
    Evidence,
}

impl std::fmt::Display for ChildCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ChildCollection::Tasks => "tasks",
            ChildCollection::Materials => "materials",
            ChildCollection::Evidence => "evidence",
        })
    }
}

/// One child row that could not be written.
///
/// `index` is the position in the submitted collection, or `None` when the
/// whole collection failed (e.g. clearing the old rows before a replace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildFailure {
    pub collection: ChildCollection,
    pub index: Option<usize>,
    pub message: String,
}

impl ChildFailure {
    pub fn item(collection: ChildCollection, index: usize, message: impl Into<String>) -> Self {
        Self {
            collection,
            index: Some(index),
            message: message.into(),
        }
    }

    pub fn collection(collection: ChildCollection, message: impl Into<String>) -> Self {
        Self {
            collection,
            index: None,
            message: message.into(),
        }
    }
}

/// Distinct collections named by `failures`, in canonical order.
pub fn failed_collections(failures: &[ChildFailure]) -> Vec<ChildCollection> {
    let mut collections: Vec<ChildCollection> = failures.iter().map(|f| f.collection).collect();
    collections.sort();
    collections.dedup();
    collections
}

/// Split submitted evidence into the part that is kept and the number of
/// items dropped beyond [`MAX_EVIDENCE_PER_ORDER`].
pub fn cap_evidence<T>(items: &[T]) -> (&[T], usize) {
    if items.len() > MAX_EVIDENCE_PER_ORDER {
        (&items[..MAX_EVIDENCE_PER_ORDER], items.len() - MAX_EVIDENCE_PER_ORDER)
    } else {
        (items, 0)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_ids_match_seed_data() {
        assert_eq!(WorkOrderStatus::AwaitingApproval.id(), 1);
        assert_eq!(WorkOrderStatus::Pending.id(), 2);
        assert_eq!(WorkOrderStatus::InProgress.id(), 3);
        assert_eq!(WorkOrderStatus::Completed.id(), 4);
        assert_eq!(WorkOrderStatus::AwaitingValidation.id(), 5);
        assert_eq!(WorkOrderStatus::Validated.id(), 6);
        assert_eq!(WorkOrderStatus::Cancelled.id(), 7);
    }

    #[test]
    fn priority_ids_match_seed_data() {
        assert_eq!(WorkOrderPriority::Low.id(), 1);
        assert_eq!(WorkOrderPriority::Normal.id(), 2);
        assert_eq!(WorkOrderPriority::High.id(), 3);
        assert_eq!(WorkOrderPriority::default(), WorkOrderPriority::Normal);
    }

    #[test]
    fn completed_is_persisted_as_awaiting_validation() {
        assert_eq!(
            WorkOrderStatus::Completed.persisted_form(),
            WorkOrderStatus::AwaitingValidation
        );
        assert_eq!(WorkOrderTransition::Complete.target(), WorkOrderStatus::AwaitingValidation);
        for status in WorkOrderStatus::ALL {
            if *status != WorkOrderStatus::Completed {
                assert_eq!(status.persisted_form(), *status);
            }
        }
    }

    #[test]
    fn no_transition_writes_completed() {
        for t in [
            WorkOrderTransition::Submit,
            WorkOrderTransition::Approve,
            WorkOrderTransition::Complete,
            WorkOrderTransition::Validate,
            WorkOrderTransition::Cancel,
        ] {
            assert_ne!(t.target(), WorkOrderStatus::Completed);
        }
    }

    #[test]
    fn approve_only_from_awaiting_approval() {
        let t = WorkOrderTransition::Approve;
        assert!(t.applies_to(WorkOrderStatus::AwaitingApproval));
        assert!(!t.applies_to(WorkOrderStatus::InProgress));
        assert!(!t.applies_to(WorkOrderStatus::Pending));
        assert_eq!(t.source_ids(), vec![1]);
    }

    #[test]
    fn validate_only_from_awaiting_validation() {
        let t = WorkOrderTransition::Validate;
        assert!(t.applies_to(WorkOrderStatus::AwaitingValidation));
        assert!(!t.applies_to(WorkOrderStatus::InProgress));
        assert!(!t.applies_to(WorkOrderStatus::Validated));
    }

    #[test]
    fn terminal_statuses_cannot_be_cancelled() {
        let t = WorkOrderTransition::Cancel;
        assert!(!t.applies_to(WorkOrderStatus::Validated));
        assert!(!t.applies_to(WorkOrderStatus::Cancelled));
        assert!(!t.applies_to(WorkOrderStatus::AwaitingValidation));
        assert!(t.applies_to(WorkOrderStatus::InProgress));
    }

    #[test]
    fn requested_status_maps_to_transition() {
        assert_eq!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::Completed).unwrap(),
            WorkOrderTransition::Complete
        );
        assert_eq!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::AwaitingApproval).unwrap(),
            WorkOrderTransition::Submit
        );
        assert_eq!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::Cancelled).unwrap(),
            WorkOrderTransition::Cancel
        );
        assert_matches!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::InProgress),
            Err(CoreError::InvalidField { .. })
        );
        assert_matches!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::Validated),
            Err(CoreError::InvalidField { .. })
        );
        assert_matches!(
            WorkOrderTransition::for_requested_status(WorkOrderStatus::Pending),
            Err(CoreError::InvalidField { .. })
        );
    }

    #[test]
    fn conflict_names_current_status_and_sources() {
        let msg = WorkOrderTransition::Approve
            .conflict(WorkOrderStatus::InProgress)
            .to_string();
        assert!(msg.contains("in_progress"));
        assert!(msg.contains("awaiting_approval"));
    }

    #[test]
    fn validated_and_cancelled_orders_are_locked() {
        assert!(ensure_editable(1, WorkOrderStatus::InProgress).is_ok());
        assert_matches!(
            ensure_editable(1, WorkOrderStatus::Validated),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            ensure_editable(1, WorkOrderStatus::Cancelled),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn activation_requires_validated_and_not_yet_activated() {
        assert!(ensure_activatable(1, WorkOrderStatus::Validated, false).is_ok());
        assert_matches!(
            ensure_activatable(1, WorkOrderStatus::AwaitingValidation, false),
            Err(CoreError::Conflict(_))
        );
        let err = ensure_activatable(1, WorkOrderStatus::Validated, true).unwrap_err();
        assert!(err.to_string().contains("already activated"));
    }

    #[test]
    fn evidence_is_capped_at_ten() {
        let items: Vec<u8> = (0..13).collect();
        let (kept, dropped) = cap_evidence(&items);
        assert_eq!(kept.len(), MAX_EVIDENCE_PER_ORDER);
        assert_eq!(dropped, 3);
        assert_eq!(kept.last(), Some(&9));

        let few = [1, 2];
        let (kept, dropped) = cap_evidence(&few);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn failed_collections_are_distinct_and_ordered() {
        let failures = vec![
            ChildFailure::item(ChildCollection::Materials, 2, "bad"),
            ChildFailure::item(ChildCollection::Tasks, 0, "bad"),
            ChildFailure::item(ChildCollection::Materials, 3, "bad"),
        ];
        assert_eq!(
            failed_collections(&failures),
            vec![ChildCollection::Tasks, ChildCollection::Materials]
        );
    }

    #[test]
    fn child_failure_serializes_collection_name() {
        let failure = ChildFailure::collection(ChildCollection::Evidence, "x");
        let json = serde_json::to_value(failure).unwrap();
        assert_eq!(json["collection"], "evidence");
        assert!(json["index"].is_null());
    }
}
