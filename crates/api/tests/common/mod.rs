//! Shared helpers for HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use fleetcare_api::config::{LogFormat, ServerConfig};
use fleetcare_api::router::build_app_router;
use fleetcare_api::state::AppState;
use fleetcare_db::models::reference::{CreateEmployee, CreateUser, CreateVehicle};
use fleetcare_db::repositories::{EmployeeRepo, UserRepo, VehicleRepo};
use fleetcare_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        db_max_connections: 5,
        log_format: LogFormat::Text,
    }
}

/// Build the production router over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

/// Build the router with a bus the test can subscribe to.
pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

/// POST without a body, for action endpoints like `/reject`.
pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Ids of the seeded reference rows.
pub struct Seed {
    pub user_id: i64,
    pub validator_id: i64,
    pub employee_id: i64,
    pub vehicle_id: i64,
}

/// Seed an approver, a validator, an employee linked to the approver and
/// a vehicle.
pub async fn seed(pool: &PgPool) -> Seed {
    let user = UserRepo::create(pool, &CreateUser { username: "admin".into() })
        .await
        .unwrap();
    let validator = UserRepo::create(pool, &CreateUser { username: "auditor".into() })
        .await
        .unwrap();
    let employee = EmployeeRepo::create(
        pool,
        &CreateEmployee {
            user_id: Some(user.id),
            full_name: "Ana Mechanic".into(),
        },
    )
    .await
    .unwrap();
    let vehicle = VehicleRepo::create(
        pool,
        &CreateVehicle {
            license_plate: "FLT-042".into(),
            status: None,
        },
    )
    .await
    .unwrap();
    Seed {
        user_id: user.id,
        validator_id: validator.id,
        employee_id: employee.id,
        vehicle_id: vehicle.id,
    }
}

/// Create a report through the API and return its id.
pub async fn create_report(pool: &PgPool, seed: &Seed) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/reports",
        json!({
            "vehicle_id": seed.vehicle_id,
            "reported_by": seed.user_id,
            "description": "Brakes squeal at low speed",
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a work order through the API with the given children.
pub async fn create_work_order(pool: &PgPool, seed: &Seed, children: Value) -> Response<Body> {
    let mut body = json!({
        "vehicle_id": seed.vehicle_id,
        "description": "Replace front brake pads",
        "priority": "normal",
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), children.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    post_json(build_test_app(pool.clone()), "/api/v1/work-orders", body).await
}
