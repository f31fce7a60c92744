//! Reference data read by the workflow (users, employees, vehicles).
//!
//! Full management of these entities lives outside this service; the
//! create DTOs exist for seeding and tests.

use fleetcare_core::types::{DbId, Timestamp};
use fleetcare_core::vehicle::VehicleStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub full_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub user_id: Option<DbId>,
    pub full_name: String,
}

/// A row from the `vehicles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vehicle {
    pub id: DbId,
    pub license_plate: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: VehicleStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVehicle {
    pub license_plate: String,
    pub status: Option<VehicleStatus>,
}
