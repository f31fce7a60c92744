//! HTTP tests for the work order orchestrator and the activation gate.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_empty, post_json, put_json};
use fleetcare_events::{event_types, EventBus};
use serde_json::{json, Value};
use sqlx::PgPool;

fn material(description: &str, quantity: &str, unit_cost: &str) -> Value {
    json!({
        "description": description,
        "quantity_needed": quantity,
        "unit_cost": unit_cost,
    })
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn report_to_vehicle_activation_scenario(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe();
    let app = || common::build_test_app_with_bus(pool.clone(), Arc::clone(&bus));

    let report_id = common::create_report(&pool, &seed).await;

    let response = post_json(
        app(),
        &format!("/api/v1/reports/{report_id}/assign"),
        json!({ "employee_id": seed.employee_id }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["status"], "assigned");

    let response = post_json(
        app(),
        "/api/v1/diagnostics",
        json!({
            "report_id": report_id,
            "employee_id": seed.employee_id,
            "possible_cause": "Seized caliper",
            "technical_recommendation": "Rebuild caliper",
            "required_materials": "Caliper rebuild kit",
            "severity": "critical",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let diagnostic_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(
        app(),
        &format!("/api/v1/diagnostics/{diagnostic_id}/approve"),
        json!({ "userId": seed.user_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["diagnostic"]["approved_by"], seed.user_id);
    let order = &json["data"]["work_order"];
    assert_eq!(order["priority"], "high");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["vehicle_id"], seed.vehicle_id);
    assert_eq!(order["assigned_to_employee_id"], seed.employee_id);
    assert!(order["description"]
        .as_str()
        .unwrap()
        .contains("Required materials: Caliper rebuild kit"));
    let order_id = order["id"].as_i64().unwrap();

    // Derived orders must be submitted before they can be approved.
    let response = post_json(
        app(),
        &format!("/api/v1/work-orders/{order_id}/approve"),
        json!({ "user_id": seed.user_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_empty(app(), &format!("/api/v1/work-orders/{order_id}/submit")).await;
    assert_eq!(body_json(response).await["data"]["status"], "awaiting_approval");

    let response = post_json(
        app(),
        &format!("/api/v1/work-orders/{order_id}/approve"),
        json!({ "user_id": seed.user_id }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "in_progress");
    assert_eq!(json["data"]["approved_by"], seed.user_id);
    assert!(json["data"]["start_date"].is_string());

    let response = put_json(
        app(),
        &format!("/api/v1/work-orders/{order_id}/status"),
        json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "awaiting_validation");
    assert!(json["data"]["completed_date"].is_string());

    let response = post_json(
        app(),
        &format!("/api/v1/work-orders/{order_id}/validate"),
        json!({ "user_id": seed.validator_id }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "validated");
    assert_eq!(json["data"]["validated_by"], seed.validator_id);

    let response = post_empty(
        app(),
        &format!("/api/v1/work-orders/{order_id}/activate-vehicle"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["vehicle"]["status"], "active");
    assert!(json["data"]["work_order"]["activated_at"].is_string());

    let response = post_empty(
        app(),
        &format!("/api/v1/work-orders/{order_id}/activate-vehicle"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response)
        .await["error"]
        .as_str()
        .unwrap()
        .contains("already activated"));

    // Exactly one activation event reached the bus.
    let mut activations = 0;
    while let Ok(event) = events.try_recv() {
        if event.event_type == event_types::VEHICLE_ACTIVATED {
            activations += 1;
        }
    }
    assert_eq!(activations, 1);

    let json = body_json(
        get(app(), &format!("/api/v1/work-orders/{order_id}/history")).await,
    )
    .await;
    let actions: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec!["create", "submit", "approve", "complete", "validate", "activate_vehicle"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_diagnostic_approval_conflicts(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let report_id = common::create_report(&pool, &seed).await;
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/diagnostics",
        json!({
            "report_id": report_id,
            "employee_id": seed.employee_id,
            "possible_cause": "Loose belt",
            "technical_recommendation": "Tighten belt",
            "severity": "mild",
        }),
    )
    .await;
    let diagnostic_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/diagnostics/{diagnostic_id}/approve");

    let response = post_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "user_id": seed.user_id }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["work_order"]["priority"], "low");

    let response = post_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "user_id": seed.validator_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(get(build_test_app(pool), "/api/v1/work-orders").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Direct create and partial failure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn direct_create_writes_children_and_recomputes_totals(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(
        &pool,
        &seed,
        json!({
            "tasks": [{ "description": "Remove wheel" }, { "description": "Fit pads" }],
            "materials": [
                { "description": "Pad set", "quantity_needed": "2", "unit_cost": "24.99", "total": "1.00" },
                material("Brake cleaner", "1", "9.99"),
            ],
            "evidence": [{ "file_url": "https://files.example/pads.jpg" }],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["order"]["status"], "awaiting_approval");
    assert_eq!(data["created_tasks"].as_array().unwrap().len(), 2);
    assert_eq!(data["created_materials"][0]["total"], "49.98");
    assert_eq!(data["created_materials"][0]["approved"], false);
    assert_eq!(data["created_evidence"].as_array().unwrap().len(), 1);
    assert!(data["failures"].as_array().unwrap().is_empty());

    let order_id = data["order"]["id"].as_i64().unwrap();
    let json = body_json(
        get(build_test_app(pool), &format!("/api/v1/work-orders/{order_id}")).await,
    )
    .await;
    assert_eq!(json["data"]["materials_total"], "59.97");
    assert_eq!(json["data"]["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["description"], "Replace front brake pads");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_material_yields_partial_failure(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe();

    let response = common::post_json(
        common::build_test_app_with_bus(pool.clone(), Arc::clone(&bus)),
        "/api/v1/work-orders",
        json!({
            "vehicle_id": seed.vehicle_id,
            "description": "Service",
            "materials": [
                material("Oil", "4", "8.50"),
                material("Filter", "-1", "6.00"),
                material("Gasket", "1", "2.25"),
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PARTIAL_FAILURE");
    assert_eq!(json["failed_collections"], json!(["materials"]));
    assert_eq!(json["failures"][0]["collection"], "materials");
    assert_eq!(json["failures"][0]["index"], 1);
    assert_eq!(json["data"]["created_materials"].as_array().unwrap().len(), 2);
    let order_id = json["work_order_id"].as_i64().unwrap();

    let event = events.try_recv().unwrap();
    assert_eq!(event.event_type, event_types::WORK_ORDER_PARTIAL_FAILURE);
    assert_eq!(event.source_entity_id, Some(order_id));

    // The parent and the valid siblings survive.
    let response = get(build_test_app(pool), &format!("/api/v1/work-orders/{order_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["materials"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["materials_total"], "36.25");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn evidence_beyond_cap_is_dropped(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let evidence: Vec<Value> = (0..12)
        .map(|i| json!({ "file_url": format!("https://files.example/{i}.jpg") }))
        .collect();
    let response = common::create_work_order(&pool, &seed, json!({ "evidence": evidence })).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created_evidence"].as_array().unwrap().len(), 10);
    assert_eq!(json["data"]["evidence_dropped"], 2);
    let order_id = json["data"]["order"]["id"].as_i64().unwrap();

    let response = post_json(
        build_test_app(pool),
        &format!("/api/v1/work-orders/{order_id}/evidence"),
        json!({ "file_url": "https://files.example/extra.jpg" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_blank_description_and_missing_vehicle(pool: PgPool) {
    let seed = common::seed(&pool).await;

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/work-orders",
        json!({ "vehicle_id": seed.vehicle_id, "description": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "description");

    let response = post_json(
        build_test_app(pool),
        "/api/v1/work-orders",
        json!({ "vehicle_id": 9999, "description": "Service" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Status guards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approving_twice_conflicts(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/work-orders/{order_id}/approve");

    let response = post_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "user_id": seed.user_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "user_id": seed.user_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    let json = body_json(
        get(build_test_app(pool), &format!("/api/v1/work-orders/{order_id}")).await,
    )
    .await;
    assert_eq!(json["data"]["status"], "in_progress");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn validate_and_activate_require_the_right_status(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}/validate"),
        json!({ "user_id": seed.validator_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_empty(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}/activate-vehicle"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_empty(
        build_test_app(pool),
        "/api/v1/work-orders/9999/activate-vehicle",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_status_refuses_actor_statuses(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/work-orders/{order_id}/status");

    let response = put_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "status": "validated" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "status");

    // completed is only reachable from in_progress.
    let response = put_json(
        build_test_app(pool.clone()),
        &uri,
        json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json(build_test_app(pool), &uri, json!({ "status": "cancelled" })).await;
    assert_eq!(body_json(response).await["data"]["status"], "cancelled");
}

// ---------------------------------------------------------------------------
// Edits and ledgers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_replaces_only_submitted_collections(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(
        &pool,
        &seed,
        json!({
            "tasks": [{ "description": "Old task" }],
            "materials": [material("Old part", "1", "10.00")],
        }),
    )
    .await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();

    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}"),
        json!({
            "priority": "high",
            "tasks": [{ "description": "New task A" }, { "description": "New task B" }],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(
        get(build_test_app(pool), &format!("/api/v1/work-orders/{order_id}")).await,
    )
    .await;
    let data = &json["data"];
    assert_eq!(data["priority"], "high");
    assert_eq!(data["description"], "Replace front brake pads");
    assert_eq!(data["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(data["tasks"][0]["description"], "New task A");
    assert_eq!(data["materials"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelled_order_refuses_edits(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();
    put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}/status"),
        json!({ "status": "cancelled" }),
    )
    .await;

    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}"),
        json!({ "description": "Too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(
        build_test_app(pool),
        &format!("/api/v1/work-orders/{order_id}/tasks"),
        json!({ "description": "Too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn material_update_recomputes_total_and_needs_reapproval(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}/materials"),
        json!({ "description": "Rotor", "quantity_needed": "2", "unit_cost": "30.00", "total": "5" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], "60.00");
    let material_id = json["data"]["id"].as_i64().unwrap();

    let approve_uri = format!("/api/v1/work-order-materials/{material_id}/approve");
    let response = post_json(
        build_test_app(pool.clone()),
        &approve_uri,
        json!({ "user_id": seed.user_id }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["approved"], true);
    assert_eq!(json["data"]["approved_by"], seed.user_id);

    let response = post_json(
        build_test_app(pool.clone()),
        &approve_uri,
        json!({ "user_id": seed.user_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}/materials/{material_id}"),
        json!({ "quantity_needed": "3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], "90.00");
    assert_eq!(json["data"]["approved"], false);
    assert!(json["data"]["approved_by"].is_null());

    let response = put_json(
        build_test_app(pool),
        &format!("/api/v1/work-orders/{order_id}/materials/{material_id}"),
        json!({ "unit_cost": "-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "unit_cost");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn task_crud_under_order(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(&pool, &seed, json!({})).await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();
    let base = format!("/api/v1/work-orders/{order_id}/tasks");

    let response = post_json(
        build_test_app(pool.clone()),
        &base,
        json!({ "description": "Bleed brakes" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json(
        build_test_app(pool.clone()),
        &format!("{base}/{task_id}"),
        json!({ "is_completed": true }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_completed"], true);
    assert_eq!(json["data"]["description"], "Bleed brakes");

    let response = common::delete(build_test_app(pool.clone()), &format!("{base}/{task_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(build_test_app(pool), &base).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_work_order_cascades(pool: PgPool) {
    let seed = common::seed(&pool).await;
    let response = common::create_work_order(
        &pool,
        &seed,
        json!({ "tasks": [{ "description": "Inspect" }] }),
    )
    .await;
    let order_id = body_json(response).await["data"]["order"]["id"].as_i64().unwrap();

    let response = common::delete(
        build_test_app(pool.clone()),
        &format!("/api/v1/work-orders/{order_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(
        build_test_app(pool),
        &format!("/api/v1/work-orders/{order_id}/tasks"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
