//! Fleet maintenance domain logic.
//!
//! Pure types and rules shared by the database and API layers: lookup-table
//! enums, status machines, the work-order derivation rules and the cost
//! ledger. Nothing in this crate performs I/O.

mod lookup;

pub mod cost;
pub mod diagnostic;
pub mod error;
pub mod pagination;
pub mod report;
pub mod types;
pub mod vehicle;
pub mod work_order;
