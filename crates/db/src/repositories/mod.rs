//! Zero-sized repository structs, one per table family.
//!
//! Every method takes a `&PgPool` (or a connection inside an open
//! transaction) and returns `sqlx::Error`; turning missing rows into
//! domain errors is left to callers.

pub mod diagnostic_repo;
pub mod notification_repo;
pub mod reference_repo;
pub mod report_repo;
pub mod work_order_evidence_repo;
pub mod work_order_history_repo;
pub mod work_order_material_repo;
pub mod work_order_repo;
pub mod work_order_task_repo;

pub use diagnostic_repo::DiagnosticRepo;
pub use notification_repo::NotificationRepo;
pub use reference_repo::{EmployeeRepo, UserRepo, VehicleRepo};
pub use report_repo::ReportRepo;
pub use work_order_evidence_repo::WorkOrderEvidenceRepo;
pub use work_order_history_repo::WorkOrderHistoryRepo;
pub use work_order_material_repo::WorkOrderMaterialRepo;
pub use work_order_repo::WorkOrderRepo;
pub use work_order_task_repo::WorkOrderTaskRepo;
