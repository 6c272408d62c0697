//! Production workflow tests: transactional stock commitment at creation,
//! the stage machine, cancellation with stock restoration and search.

mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};

use npcs_api::{
    entities::{Production, ProductionMaterial, RawMaterialBatch},
    errors::ServiceError,
    models::ProductionStage,
    services::productions::{
        NewProduction, ProductionFilter, ProductionService, SelectedMaterial,
    },
};

fn production_input(template_id: i64, quantity: i32, materials: Vec<(i64, i64)>) -> NewProduction {
    NewProduction {
        product_template_id: template_id,
        quantity,
        selected_materials: materials
            .into_iter()
            .map(|(batch_id, grams)| SelectedMaterial {
                batch_id,
                amount_used: Decimal::from(grams),
            })
            .collect(),
    }
}

#[tokio::test]
async fn creating_a_production_commits_stock() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Face cream").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let shea = common::seed_material_type(&ctx.db, "Shea butter").await;
    let batch = common::seed_batch(&ctx.db, shea.id, "SB-001", 100).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_production(production_input(template.id, 2, vec![(batch.id, 30)]))
        .await
        .expect("creation should succeed");

    assert_eq!(created.product_template_id, template.id);
    assert_eq!(created.quantity, 2);

    let stored_batch = RawMaterialBatch::find_by_id(batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_batch.remaining_amount, Decimal::from(70));

    let detail = service.get_production(created.production_id).await.unwrap();
    assert_eq!(detail.summary.stage, "preparation");
    assert_eq!(detail.summary.product_name, "Face cream");
    assert_eq!(detail.summary.template_version, "v1");
    assert_eq!(detail.materials.len(), 1);
    assert_eq!(detail.materials[0].material_name, "Shea butter");
    assert_eq!(detail.materials[0].batch_serial_number, "SB-001");
    assert_eq!(detail.materials[0].amount_used, Decimal::from(30));
}

#[tokio::test]
async fn bulk_creation_is_atomic_when_stock_runs_out() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Lip balm").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let wax = common::seed_material_type(&ctx.db, "Beeswax").await;
    let batch = common::seed_batch(&ctx.db, wax.id, "BW-001", 50).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());

    // Each production alone fits, but the accumulated 60g exceeds the 50g batch.
    let err = service
        .create_productions(vec![
            production_input(template.id, 1, vec![(batch.id, 30)]),
            production_input(template.id, 1, vec![(batch.id, 30)]),
        ])
        .await
        .expect_err("combined demand exceeds the batch");

    assert_matches!(err, ServiceError::InsufficientStock(ref msg) if msg.contains(&batch.id.to_string()));

    // Nothing was written and the batch is untouched.
    let productions = Production::find().count(ctx.db.as_ref()).await.unwrap();
    assert_eq!(productions, 0);
    let materials = ProductionMaterial::find().count(ctx.db.as_ref()).await.unwrap();
    assert_eq!(materials, 0);

    let stored_batch = RawMaterialBatch::find_by_id(batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_batch.remaining_amount, Decimal::from(50));
}

#[tokio::test]
async fn bulk_creation_commits_every_production() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Soap").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let oil = common::seed_material_type(&ctx.db, "Olive oil").await;
    let lye = common::seed_material_type(&ctx.db, "Lye").await;
    let oil_batch = common::seed_batch(&ctx.db, oil.id, "OO-001", 200).await;
    let lye_batch = common::seed_batch(&ctx.db, lye.id, "LY-001", 80).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_productions(vec![
            production_input(template.id, 3, vec![(oil_batch.id, 90), (lye_batch.id, 30)]),
            production_input(template.id, 2, vec![(oil_batch.id, 60), (lye_batch.id, 20)]),
        ])
        .await
        .expect("both productions fit");

    assert_eq!(created.len(), 2);

    let summaries = service.list_productions().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.stage == "preparation"));

    let oil_stored = RawMaterialBatch::find_by_id(oil_batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oil_stored.remaining_amount, Decimal::from(50));
    let lye_stored = RawMaterialBatch::find_by_id(lye_batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lye_stored.remaining_amount, Decimal::from(30));
}

#[tokio::test]
async fn stock_can_be_drained_to_zero_but_not_below() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Bar soap").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let tallow = common::seed_material_type(&ctx.db, "Tallow").await;
    let batch = common::seed_batch(&ctx.db, tallow.id, "TW-001", 50).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());

    // The conditional decrement accepts a request that lands exactly on zero.
    service
        .create_production(production_input(template.id, 1, vec![(batch.id, 50)]))
        .await
        .expect("draining the batch exactly is allowed");

    let drained = RawMaterialBatch::find_by_id(batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(drained.remaining_amount, Decimal::ZERO);

    let err = service
        .create_production(production_input(template.id, 1, vec![(batch.id, 1)]))
        .await
        .expect_err("the batch is empty");
    assert_matches!(err, ServiceError::InsufficientStock(_));
}

#[tokio::test]
async fn missing_template_fails_creation() {
    let ctx = common::setup().await;
    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());

    let err = service
        .create_production(production_input(999, 1, vec![]))
        .await
        .expect_err("template does not exist");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn stage_machine_only_allows_forward_transitions() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Candle").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_production(production_input(template.id, 1, vec![]))
        .await
        .unwrap();
    let id = created.production_id;

    // Skipping ahead is rejected.
    let err = service
        .update_stage(id, ProductionStage::Sent)
        .await
        .expect_err("preparation cannot jump to sent");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let change = service
        .update_stage(id, ProductionStage::Producing)
        .await
        .unwrap();
    assert_eq!(change.previous_stage, ProductionStage::Preparation);
    assert_eq!(change.current_stage, ProductionStage::Producing);

    service.update_stage(id, ProductionStage::Produced).await.unwrap();
    service.update_stage(id, ProductionStage::Sent).await.unwrap();

    // Terminal stage: no further moves.
    let err = service
        .update_stage(id, ProductionStage::Producing)
        .await
        .expect_err("sent is terminal");
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn stage_update_rejects_cancelled_target() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Balm").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_production(production_input(template.id, 1, vec![]))
        .await
        .unwrap();

    let err = service
        .update_stage(created.production_id, ProductionStage::Cancelled)
        .await
        .expect_err("cancellation has its own operation");
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn stage_update_on_missing_production_is_not_found() {
    let ctx = common::setup().await;
    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());

    let err = service
        .update_stage(424242, ProductionStage::Producing)
        .await
        .expect_err("production does not exist");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cancellation_restores_stock_and_deletes_rows() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Scrub").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let salt = common::seed_material_type(&ctx.db, "Sea salt").await;
    let batch = common::seed_batch(&ctx.db, salt.id, "SS-001", 100).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_production(production_input(template.id, 1, vec![(batch.id, 40)]))
        .await
        .unwrap();

    let committed = RawMaterialBatch::find_by_id(batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(committed.remaining_amount, Decimal::from(60));

    service.cancel_production(created.production_id).await.unwrap();

    let restored = RawMaterialBatch::find_by_id(batch.id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.remaining_amount, Decimal::from(100));

    assert_eq!(Production::find().count(ctx.db.as_ref()).await.unwrap(), 0);
    assert_eq!(
        ProductionMaterial::find().count(ctx.db.as_ref()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn cancellation_requires_preparation_stage() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "Serum").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let created = service
        .create_production(production_input(template.id, 1, vec![]))
        .await
        .unwrap();
    service
        .update_stage(created.production_id, ProductionStage::Producing)
        .await
        .unwrap();

    let err = service
        .cancel_production(created.production_id)
        .await
        .expect_err("producing cannot be cancelled");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let err = service
        .cancel_production(987654)
        .await
        .expect_err("missing production");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn search_filters_by_stage_and_product() {
    let ctx = common::setup().await;
    let cream = common::seed_product(&ctx.db, "Cream").await;
    let cream_template = common::seed_template(&ctx.db, cream.id, "v1", true).await;
    let tonic = common::seed_product(&ctx.db, "Tonic").await;
    let tonic_template = common::seed_template(&ctx.db, tonic.id, "v1", true).await;

    let service = ProductionService::new(ctx.db.clone(), ctx.event_sender.clone());
    let cream_run = service
        .create_production(production_input(cream_template.id, 5, vec![]))
        .await
        .unwrap();
    service
        .create_production(production_input(tonic_template.id, 1, vec![]))
        .await
        .unwrap();
    service
        .update_stage(cream_run.production_id, ProductionStage::Producing)
        .await
        .unwrap();

    let producing = service
        .search_productions(ProductionFilter {
            stage: Some(ProductionStage::Producing),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(producing.len(), 1);
    assert_eq!(producing[0].product_name, "Cream");

    let for_tonic = service
        .search_productions(ProductionFilter {
            product_id: Some(tonic.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_tonic.len(), 1);
    assert_eq!(for_tonic[0].product_name, "Tonic");

    let big_runs = service
        .search_productions(ProductionFilter {
            min_quantity: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(big_runs.len(), 1);
    assert_eq!(big_runs[0].quantity, 5);
}
