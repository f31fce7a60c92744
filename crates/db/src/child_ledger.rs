//! Best-effort writes of a work order's child collections.
//!
//! Children are written only after the parent row has committed. Each item
//! is an independent statement on the pool: the three collections run
//! concurrently, as do the items inside each one. A failed item is recorded
//! in the outcome and never undoes the parent or its siblings.

use fleetcare_core::error::CoreError;
use fleetcare_core::types::DbId;
use fleetcare_core::work_order::{cap_evidence, ChildCollection, ChildFailure};
use futures::future::{join3, join_all};
use sqlx::PgPool;
use validator::Validate;

use crate::models::work_order::{WorkOrder, WorkOrderWriteOutcome};
use crate::models::work_order_evidence::{CreateWorkOrderEvidence, WorkOrderEvidence};
use crate::models::work_order_material::{
    CreateWorkOrderMaterial, MaterialLine, WorkOrderMaterial,
};
use crate::models::work_order_task::{CreateWorkOrderTask, WorkOrderTask};
use crate::repositories::{WorkOrderEvidenceRepo, WorkOrderMaterialRepo, WorkOrderTaskRepo};

/// The child collections submitted with a create or edit.
///
/// `None` leaves a collection untouched. With `replace` set, every present
/// collection has its stored rows deleted before the new ones are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildBatch<'a> {
    pub tasks: Option<&'a [CreateWorkOrderTask]>,
    pub materials: Option<&'a [CreateWorkOrderMaterial]>,
    pub evidence: Option<&'a [CreateWorkOrderEvidence]>,
    pub replace: bool,
}

type ItemResult<T> = Result<T, String>;

/// Write `batch` under `order` and collect what succeeded and what failed.
pub async fn write_children(
    pool: &PgPool,
    order: WorkOrder,
    batch: ChildBatch<'_>,
) -> WorkOrderWriteOutcome {
    let work_order_id = order.id;

    let (evidence_items, evidence_dropped) = match batch.evidence {
        Some(items) => {
            let (kept, dropped) = cap_evidence(items);
            (Some(kept), dropped)
        }
        None => (None, 0),
    };
    if evidence_dropped > 0 {
        tracing::info!(
            work_order_id,
            evidence_dropped,
            "Evidence beyond the per-order cap dropped"
        );
    }

    let ((tasks, task_failures), (materials, material_failures), (evidence, evidence_failures)) =
        join3(
            write_tasks(pool, work_order_id, batch.tasks, batch.replace),
            write_materials(pool, work_order_id, batch.materials, batch.replace),
            write_evidence(pool, work_order_id, evidence_items, batch.replace),
        )
        .await;

    let mut failures = task_failures;
    failures.extend(material_failures);
    failures.extend(evidence_failures);

    WorkOrderWriteOutcome {
        order,
        created_tasks: tasks,
        created_materials: materials,
        created_evidence: evidence,
        evidence_dropped,
        failures,
    }
}

async fn write_tasks(
    pool: &PgPool,
    work_order_id: DbId,
    items: Option<&[CreateWorkOrderTask]>,
    replace: bool,
) -> (Vec<WorkOrderTask>, Vec<ChildFailure>) {
    let collection = ChildCollection::Tasks;
    let Some(items) = items else {
        return (Vec::new(), Vec::new());
    };
    if replace {
        if let Err(e) = WorkOrderTaskRepo::delete_for_work_order(pool, work_order_id).await {
            return (Vec::new(), vec![clear_failure(collection, work_order_id, &e)]);
        }
    }

    let results = join_all(items.iter().map(|item| async move {
        item.validate().map_err(|e| CoreError::from(e).to_string())?;
        WorkOrderTaskRepo::create(pool, work_order_id, item)
            .await
            .map_err(|e| describe_db_error(&e))
    }))
    .await;
    partition(collection, work_order_id, results)
}

async fn write_materials(
    pool: &PgPool,
    work_order_id: DbId,
    items: Option<&[CreateWorkOrderMaterial]>,
    replace: bool,
) -> (Vec<WorkOrderMaterial>, Vec<ChildFailure>) {
    let collection = ChildCollection::Materials;
    let Some(items) = items else {
        return (Vec::new(), Vec::new());
    };
    if replace {
        if let Err(e) = WorkOrderMaterialRepo::delete_for_work_order(pool, work_order_id).await {
            return (Vec::new(), vec![clear_failure(collection, work_order_id, &e)]);
        }
    }

    let results = join_all(items.iter().map(|item| async move {
        let line = MaterialLine::from_create(item).map_err(|e| e.to_string())?;
        WorkOrderMaterialRepo::create(pool, work_order_id, &line)
            .await
            .map_err(|e| describe_db_error(&e))
    }))
    .await;
    partition(collection, work_order_id, results)
}

async fn write_evidence(
    pool: &PgPool,
    work_order_id: DbId,
    items: Option<&[CreateWorkOrderEvidence]>,
    replace: bool,
) -> (Vec<WorkOrderEvidence>, Vec<ChildFailure>) {
    let collection = ChildCollection::Evidence;
    let Some(items) = items else {
        return (Vec::new(), Vec::new());
    };
    if replace {
        if let Err(e) = WorkOrderEvidenceRepo::delete_for_work_order(pool, work_order_id).await {
            return (Vec::new(), vec![clear_failure(collection, work_order_id, &e)]);
        }
    }

    let results = join_all(items.iter().map(|item| async move {
        item.validate().map_err(|e| CoreError::from(e).to_string())?;
        WorkOrderEvidenceRepo::create(pool, work_order_id, item)
            .await
            .map_err(|e| describe_db_error(&e))
    }))
    .await;
    partition(collection, work_order_id, results)
}

/// Split per-item results, keeping each failure's submitted position.
fn partition<T>(
    collection: ChildCollection,
    work_order_id: DbId,
    results: Vec<ItemResult<T>>,
) -> (Vec<T>, Vec<ChildFailure>) {
    let mut created = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(row) => created.push(row),
            Err(message) => {
                tracing::warn!(
                    work_order_id,
                    collection = %collection,
                    index,
                    error = %message,
                    "Work order child write failed",
                );
                failures.push(ChildFailure::item(collection, index, message));
            }
        }
    }
    (created, failures)
}

fn clear_failure(
    collection: ChildCollection,
    work_order_id: DbId,
    err: &sqlx::Error,
) -> ChildFailure {
    tracing::warn!(
        work_order_id,
        collection = %collection,
        error = %err,
        "Clearing work order children before replace failed",
    );
    ChildFailure::collection(collection, format!("could not clear existing {collection}"))
}

/// Describe a failed child insert without exposing driver internals.
fn describe_db_error(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some(constraint) => format!("violates constraint {constraint}"),
            None => "rejected by the database".to_string(),
        },
        _ => "database write failed".to_string(),
    }
}
