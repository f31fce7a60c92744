//! Integration tests for best-effort child writes and the material ledger.

mod common;

use std::str::FromStr;

use assert_matches::assert_matches;
use fleetcare_core::work_order::{
    ChildCollection, WorkOrderPriority, WorkOrderTransition, DIRECT_CREATE_STATUS,
    MAX_EVIDENCE_PER_ORDER,
};
use fleetcare_db::models::work_order::{NewWorkOrder, UpdateWorkOrder, WorkOrderDetail};
use fleetcare_db::models::work_order_evidence::CreateWorkOrderEvidence;
use fleetcare_db::models::work_order_material::{
    CreateWorkOrderMaterial, MaterialLine, UpdateWorkOrderMaterial,
};
use fleetcare_db::models::work_order_task::CreateWorkOrderTask;
use fleetcare_db::repositories::{
    WorkOrderEvidenceRepo, WorkOrderMaterialRepo, WorkOrderRepo, WorkOrderTaskRepo,
};
use fleetcare_db::{ChildBatch, Guarded};
use rust_decimal::Decimal;
use sqlx::PgPool;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn new_order(vehicle_id: i64) -> NewWorkOrder {
    NewWorkOrder {
        diagnostic_id: None,
        vehicle_id,
        assigned_to_employee_id: None,
        description: "Brake service".to_string(),
        status: DIRECT_CREATE_STATUS,
        priority: WorkOrderPriority::High,
        estimated_cost: Some(dec("250.00")),
    }
}

fn material(description: &str, qty: &str, cost: &str) -> CreateWorkOrderMaterial {
    CreateWorkOrderMaterial {
        description: description.to_string(),
        quantity_needed: dec(qty),
        unit_cost: dec(cost),
        total: None,
    }
}

fn task(description: &str) -> CreateWorkOrderTask {
    CreateWorkOrderTask {
        description: description.to_string(),
        assigned_employee_id: None,
        estimated_hours: Some(dec("1.5")),
        is_completed: false,
    }
}

fn evidence(n: usize) -> Vec<CreateWorkOrderEvidence> {
    (0..n)
        .map(|i| CreateWorkOrderEvidence {
            file_url: format!("uploads/photo-{i}.jpg"),
            description: None,
        })
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_material_does_not_roll_back_order(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let materials = vec![
        material("Pads", "2", "40.00"),
        material("Fluid", "-1", "12.00"),
        material("Rotor", "1", "95.50"),
    ];
    let tasks = vec![task("Remove wheels")];

    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            tasks: Some(&tasks),
            materials: Some(&materials),
            evidence: None,
            replace: false,
        },
    )
    .await
    .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.failed_collections(), vec![ChildCollection::Materials]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, Some(1));
    assert!(outcome.failures[0].message.contains("quantity_needed"));
    assert_eq!(outcome.created_materials.len(), 2);
    assert_eq!(outcome.created_tasks.len(), 1);

    // The parent and the valid siblings are persisted.
    let order_id = outcome.order.id;
    assert!(WorkOrderRepo::find_by_id(&pool, order_id).await.unwrap().is_some());
    let stored = WorkOrderMaterialRepo::list_for_work_order(&pool, order_id).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_insert_is_reported_with_index(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let tasks = vec![
        task("Inspect"),
        CreateWorkOrderTask {
            assigned_employee_id: Some(999_999),
            ..task("Assigned to a ghost")
        },
    ];

    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            tasks: Some(&tasks),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.failed_collections(), vec![ChildCollection::Tasks]);
    assert_eq!(outcome.failures[0].index, Some(1));
    assert_eq!(outcome.created_tasks.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_material_total_is_recomputed(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let materials = vec![CreateWorkOrderMaterial {
        total: Some(dec("1.00")),
        ..material("Belt", "3", "19.99")
    }];

    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            materials: Some(&materials),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();

    assert!(outcome.is_complete());
    let stored = &outcome.created_materials[0];
    assert_eq!(stored.total, dec("59.97"));
    assert!(!stored.approved);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_evidence_beyond_cap_is_dropped(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let items = evidence(MAX_EVIDENCE_PER_ORDER + 3);

    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            evidence: Some(&items),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.created_evidence.len(), MAX_EVIDENCE_PER_ORDER);
    assert_eq!(outcome.evidence_dropped, 3);

    // Single inserts respect the same cap.
    let extra = WorkOrderEvidenceRepo::create_capped(
        &pool,
        outcome.order.id,
        &items[0],
        MAX_EVIDENCE_PER_ORDER,
    )
    .await
    .unwrap();
    assert!(extra.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_replaces_present_collections_only(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let tasks = vec![task("Old task A"), task("Old task B")];
    let materials = vec![material("Old part", "1", "10.00")];
    let created = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            tasks: Some(&tasks),
            materials: Some(&materials),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();
    let order_id = created.order.id;

    let new_tasks = vec![task("New task")];
    let patch = UpdateWorkOrder {
        description: Some("Brake service, revised".to_string()),
        ..UpdateWorkOrder::default()
    };
    let outcome = assert_matches!(
        WorkOrderRepo::update_with_children(
            &pool,
            order_id,
            &patch,
            ChildBatch {
                tasks: Some(&new_tasks),
                replace: true,
                ..ChildBatch::default()
            },
        )
        .await
        .unwrap(),
        Guarded::Applied(o) => o
    );
    assert_eq!(outcome.order.description, "Brake service, revised");
    assert_eq!(outcome.order.priority, WorkOrderPriority::High);

    let stored_tasks = WorkOrderTaskRepo::list_for_work_order(&pool, order_id).await.unwrap();
    assert_eq!(stored_tasks.len(), 1);
    assert_eq!(stored_tasks[0].description, "New task");

    let stored_materials = WorkOrderMaterialRepo::list_for_work_order(
        &pool,
        order_id,
    )
    .await
    .unwrap();
    assert_eq!(stored_materials.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validated_or_cancelled_order_rejects_edits(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let created = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch::default(),
    )
    .await
    .unwrap();
    WorkOrderRepo::transition(&pool, created.order.id, WorkOrderTransition::Cancel, None)
        .await
        .unwrap();

    let result = WorkOrderRepo::update_with_children(
        &pool,
        created.order.id,
        &UpdateWorkOrder::default(),
        ChildBatch::default(),
    )
    .await
    .unwrap();
    assert_matches!(result, Guarded::Blocked(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_material_update_recomputes_and_clears_approval(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let materials = vec![material("Hose", "2", "15.00")];
    let created = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            materials: Some(&materials),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();
    let stored = created.created_materials[0].clone();

    let approved = assert_matches!(
        WorkOrderMaterialRepo::approve(&pool, stored.id, fx.user.id).await.unwrap(),
        Guarded::Applied(m) => m
    );
    assert!(approved.approved);
    assert_eq!(approved.approved_by, Some(fx.user.id));

    // Approving again is a conflict, not an overwrite.
    assert_matches!(
        WorkOrderMaterialRepo::approve(&pool, stored.id, fx.user.id).await.unwrap(),
        Guarded::Blocked(m) if m.approved_at == approved.approved_at
    );

    let patch = UpdateWorkOrderMaterial {
        description: None,
        quantity_needed: Some(dec("4")),
        unit_cost: None,
        total: Some(dec("0")),
    };
    let line = MaterialLine::merged(&approved, &patch).unwrap();
    let updated = WorkOrderMaterialRepo::update(&pool, created.order.id, stored.id, &line)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.total, dec("60.00"));
    assert!(!updated.approved);
    assert!(updated.approved_by.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stored_material_totals_match_stored_values(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let materials = vec![
        material("Wiper blades", "3", "1.005"),
        material("Coolant", "1.0004", "100"),
    ];

    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            materials: Some(&materials),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();
    assert!(outcome.is_complete());

    let stored = WorkOrderMaterialRepo::list_for_work_order(&pool, outcome.order.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    for line in &stored {
        assert_eq!(line.total, line.quantity_needed * line.unit_cost);
    }
    let total_of = |description: &str| {
        stored
            .iter()
            .find(|m| m.description == description)
            .map(|m| m.total)
            .unwrap()
    };
    assert_eq!(total_of("Wiper blades"), dec("3.03"));
    assert_eq!(total_of("Coolant"), dec("100.00"));

    let summed: Decimal = stored.iter().map(|m| m.total).sum();
    let detail = WorkOrderDetail::assemble(outcome.order, Vec::new(), stored, Vec::new()).unwrap();
    assert_eq!(detail.materials_total, summed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_single_evidence_inserts_respect_cap(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let items = evidence(MAX_EVIDENCE_PER_ORDER - 1);
    let outcome = WorkOrderRepo::create_with_children(
        &pool,
        &new_order(fx.vehicle.id),
        ChildBatch {
            evidence: Some(&items),
            ..ChildBatch::default()
        },
    )
    .await
    .unwrap();
    let order_id = outcome.order.id;

    let extra = evidence(8);
    let results = futures::future::join_all(extra.iter().map(|item| {
        WorkOrderEvidenceRepo::create_capped(&pool, order_id, item, MAX_EVIDENCE_PER_ORDER)
    }))
    .await;

    let inserted = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count();
    assert_eq!(inserted, 1);

    let stored = WorkOrderEvidenceRepo::list_for_work_order(&pool, order_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), MAX_EVIDENCE_PER_ORDER);
}
