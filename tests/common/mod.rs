//! Shared helpers for integration tests: an in-memory SQLite database with
//! migrations applied, a drained event channel and seed data builders.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};

use npcs_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    entities::{product, product_template, raw_material_batch, raw_material_type, recipe_item},
    events::{self, EventSender},
};

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
}

/// Fresh in-memory database with the full schema and a live event drain.
pub async fn setup() -> TestContext {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        // A single connection keeps every query on the same in-memory DB
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
        acquire_timeout: Duration::from_secs(5),
    };

    let db = establish_connection_with_config(&config)
        .await
        .expect("in-memory database should connect");
    run_migrations(&db).await.expect("migrations should apply");

    let (event_sender, event_rx) = events::channel(64);
    let event_task = tokio::spawn(events::process_events(event_rx));

    TestContext {
        db: Arc::new(db),
        event_sender,
        _event_task: event_task,
    }
}

pub async fn seed_product(db: &DbPool, name: &str) -> product::Model {
    product::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("product insert")
}

pub async fn seed_template(
    db: &DbPool,
    product_id: i64,
    version: &str,
    is_active: bool,
) -> product_template::Model {
    product_template::ActiveModel {
        product_id: Set(product_id),
        version: Set(version.to_string()),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("template insert")
}

pub async fn seed_material_type(db: &DbPool, name: &str) -> raw_material_type::Model {
    raw_material_type::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("material type insert")
}

pub async fn seed_batch(
    db: &DbPool,
    type_id: i64,
    serial_number: &str,
    grams: i64,
) -> raw_material_batch::Model {
    raw_material_batch::ActiveModel {
        type_id: Set(type_id),
        supplier_id: Set(None),
        serial_number: Set(serial_number.to_string()),
        remaining_amount: Set(Decimal::from(grams)),
        purchase_date: Set(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
        expiration_date: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("batch insert")
}

#[allow(dead_code)]
pub async fn seed_recipe_item(
    db: &DbPool,
    product_template_id: i64,
    raw_material_type_id: i64,
    grams: i64,
) -> recipe_item::Model {
    recipe_item::ActiveModel {
        product_template_id: Set(product_template_id),
        raw_material_type_id: Set(raw_material_type_id),
        amount_in_grams: Set(Decimal::from(grams)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("recipe item insert")
}
