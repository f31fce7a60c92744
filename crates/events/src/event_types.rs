//! Names of the events published by the workflow.

/// A report was assigned to an employee. Payload: `employee_id`.
pub const REPORT_ASSIGNED: &str = "report.assigned";

/// A diagnostic was approved and derived a work order.
/// Payload: `work_order_id`, `priority`.
pub const DIAGNOSTIC_APPROVED: &str = "diagnostic.approved";

/// A work order was saved but some children could not be written.
/// Payload: `failed_collections`.
pub const WORK_ORDER_PARTIAL_FAILURE: &str = "work_order.partial_failure";

/// A work order passed administrative validation.
pub const WORK_ORDER_VALIDATED: &str = "work_order.validated";

/// The vehicle behind a validated work order is back in service.
/// Payload: `vehicle_id`, `license_plate`.
pub const VEHICLE_ACTIVATED: &str = "vehicle.activated";
