//! Shared seed data for repository integration tests.

#![allow(dead_code)]

use fleetcare_core::report::ReportStatus;
use fleetcare_db::models::reference::{
    CreateEmployee, CreateUser, CreateVehicle, Employee, User, Vehicle,
};
use fleetcare_db::models::report::{CreateReport, Report};
use fleetcare_db::repositories::{EmployeeRepo, ReportRepo, UserRepo, VehicleRepo};
use sqlx::PgPool;

/// A user, an employee linked to that user, and a vehicle.
pub struct Fixture {
    pub user: User,
    pub employee: Employee,
    pub vehicle: Vehicle,
}

pub async fn seed(pool: &PgPool) -> Fixture {
    let user = UserRepo::create(pool, &CreateUser { username: "admin".to_string() })
        .await
        .unwrap();
    let employee = EmployeeRepo::create(
        pool,
        &CreateEmployee {
            user_id: Some(user.id),
            full_name: "Ana Mechanic".to_string(),
        },
    )
    .await
    .unwrap();
    let vehicle = VehicleRepo::create(
        pool,
        &CreateVehicle {
            license_plate: "ABC-123".to_string(),
            status: None,
        },
    )
    .await
    .unwrap();
    Fixture { user, employee, vehicle }
}

pub async fn new_report(pool: &PgPool, fx: &Fixture) -> Report {
    let input = CreateReport {
        vehicle_id: fx.vehicle.id,
        reported_by: fx.user.id,
        description: "Engine overheats on climbs".to_string(),
        status: None,
    };
    ReportRepo::create(pool, &input, ReportStatus::New).await.unwrap()
}
