//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Lookup-table columns (`status_id`, `priority_id`, `severity_id`) are
//! decoded into the closed enums from `fleetcare_core` and serialized by
//! name.

pub mod actor;
pub mod diagnostic;
pub mod notification;
pub mod reference;
pub mod report;
pub mod work_order;
pub mod work_order_evidence;
pub mod work_order_history;
pub mod work_order_material;
pub mod work_order_task;
