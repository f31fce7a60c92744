//! Lookups on users, employees and vehicles.

use fleetcare_core::types::DbId;
use fleetcare_core::vehicle::VehicleStatus;
use sqlx::{PgConnection, PgPool};

use crate::models::reference::{
    CreateEmployee, CreateUser, CreateVehicle, Employee, User, Vehicle,
};

const USER_COLUMNS: &str = "id, username, is_active, created_at, updated_at";

const EMPLOYEE_COLUMNS: &str = "id, user_id, full_name, created_at, updated_at";

const VEHICLE_COLUMNS: &str = "id, license_plate, status_id, created_at, updated_at";

/// Provides lookups for the `users` table.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!("INSERT INTO users (username) VALUES ($1) RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether an active user with this id exists.
    pub async fn exists_active(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND is_active)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }
}

/// Provides lookups for the `employees` table.
pub struct EmployeeRepo;

impl EmployeeRepo {
    pub async fn create(pool: &PgPool, input: &CreateEmployee) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees (user_id, full_name) VALUES ($1, $2) \
             RETURNING {EMPLOYEE_COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(input.user_id)
            .bind(&input.full_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the employee exists and is linked to an active user.
    ///
    /// Only such employees may be assigned reports or author diagnostics.
    pub async fn is_linked_to_active_user(
        pool: &PgPool,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(\
                SELECT 1 FROM employees e \
                JOIN users u ON u.id = e.user_id \
                WHERE e.id = $1 AND u.is_active)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }
}

/// Provides lookups and status updates for the `vehicles` table.
pub struct VehicleRepo;

impl VehicleRepo {
    pub async fn create(pool: &PgPool, input: &CreateVehicle) -> Result<Vehicle, sqlx::Error> {
        let status = input.status.unwrap_or(VehicleStatus::Active);
        let query = format!(
            "INSERT INTO vehicles (license_plate, status_id) VALUES ($1, $2) \
             RETURNING {VEHICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(&input.license_plate)
            .bind(status.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Set a vehicle's operational status inside an open transaction.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: VehicleStatus,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!(
            "UPDATE vehicles SET status_id = $2 WHERE id = $1 RETURNING {VEHICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_optional(conn)
            .await
    }
}
