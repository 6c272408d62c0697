//! HTTP-level tests exercising the routers end to end: response envelopes,
//! status codes and the camelCase wire contract.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    middleware, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use npcs_api::{config::AppConfig, handlers, observability, AppState};

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 18080,
        environment: "test".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: false,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
    }
}

async fn test_app() -> (Router, common::TestContext) {
    let ctx = common::setup().await;
    let state = AppState::new(ctx.db.clone(), test_config(), ctx.event_sender.clone());

    let router = Router::new()
        .nest("/health", handlers::health::health_routes())
        .nest("/api", npcs_api::api_routes())
        .layer(middleware::from_fn(observability::request_id_middleware))
        .with_state(state);

    (router, ctx)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (app, _ctx) = test_app().await;

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn responses_carry_a_request_id_header() {
    let (app, _ctx) = test_app().await;

    let response = app.oneshot(get_request("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn full_production_flow_over_http() {
    let (app, _ctx) = test_app().await;

    // Product
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({"name": "Face cream", "description": "Daily moisturizer"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let product_id = body["data"]["id"].as_i64().unwrap();

    // Material type and batch
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/material-types",
            json!({"name": "Shea butter"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let type_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/batches",
            json!({
                "typeId": type_id,
                "serialNumber": "SB-001",
                "remainingAmount": "100",
                "purchaseDate": "2026-01-15"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let batch = body_json(response).await;
    let batch_id = batch["data"]["id"].as_i64().unwrap();
    assert!(batch["data"]["remainingAmount"].is_string() || batch["data"]["remainingAmount"].is_number());

    // Recipe
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/products/{}/recipe", product_id),
            json!({
                "version": "v1",
                "items": [{"rawMaterialTypeId": type_id, "amountInGrams": "10"}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let template_id = body_json(response).await["data"]["productTemplateId"]
        .as_i64()
        .unwrap();

    // Production
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/productions",
            json!({
                "productTemplateId": template_id,
                "quantity": 2,
                "selectedMaterials": [{"batchId": batch_id, "amountUsed": "20"}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let production_id = body["data"]["productionId"].as_i64().unwrap();
    // The creation body echoes the committed materials.
    assert_eq!(body["data"]["quantity"], 2);
    assert_eq!(
        body["data"]["selectedMaterials"][0]["batchId"].as_i64().unwrap(),
        batch_id
    );

    // The listing surfaces the joined product and recipe information.
    let response = app
        .clone()
        .oneshot(get_request("/api/productions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let listed = &body["data"][0];
    assert_eq!(listed["id"].as_i64().unwrap(), production_id);
    assert_eq!(listed["productName"], "Face cream");
    assert_eq!(listed["templateVersion"], "v1");
    assert_eq!(listed["stage"], "preparation");

    // Forward stage moves succeed; skipping is a 400.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/productions/{}/stage", production_id),
            json!({"stage": "sent"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/productions/{}/stage", production_id),
            json!({"stage": "producing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["previousStage"], "preparation");
    assert_eq!(body["data"]["currentStage"], "producing");

    // Past preparation the production cannot be cancelled.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/productions/{}/cancel", production_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_creation_lists_template_ids() {
    let (app, ctx) = test_app().await;
    let product = common::seed_product(&ctx.db, "Soap").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let oil = common::seed_material_type(&ctx.db, "Olive oil").await;
    let batch = common::seed_batch(&ctx.db, oil.id, "OO-001", 200).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/productions/bulk",
            json!({
                "productions": [
                    {
                        "productTemplateId": template.id,
                        "quantity": 1,
                        "selectedMaterials": [{"batchId": batch.id, "amountUsed": "30"}]
                    },
                    {
                        "productTemplateId": template.id,
                        "quantity": 2,
                        "selectedMaterials": [{"batchId": batch.id, "amountUsed": "60"}]
                    }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let created = body["data"].as_array().unwrap();
    assert_eq!(created.len(), 2);
    for entry in created {
        assert!(entry["productionId"].is_i64());
        assert_eq!(entry["templateId"].as_i64().unwrap(), template.id);
        assert!(entry["quantity"].is_i64());
    }
}

#[tokio::test]
async fn cancellation_over_http_carries_a_message() {
    let (app, ctx) = test_app().await;
    let product = common::seed_product(&ctx.db, "Tonic").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/productions",
            json!({
                "productTemplateId": template.id,
                "quantity": 1,
                "selectedMaterials": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let production_id = body_json(response).await["data"]["productionId"]
        .as_i64()
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/productions/{}/cancel", production_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("cancelled"));
    assert_eq!(
        body["data"]["productionId"].as_i64().unwrap(),
        production_id
    );
}

#[tokio::test]
async fn insufficient_stock_is_a_bad_request_with_details() {
    let (app, ctx) = test_app().await;
    let product = common::seed_product(&ctx.db, "Balm").await;
    let template = common::seed_template(&ctx.db, product.id, "v1", true).await;
    let wax = common::seed_material_type(&ctx.db, "Beeswax").await;
    let batch = common::seed_batch(&ctx.db, wax.id, "BW-001", 10).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/productions",
            json!({
                "productTemplateId": template.id,
                "quantity": 1,
                "selectedMaterials": [{"batchId": batch.id, "amountUsed": "50"}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains(&batch.id.to_string()));
}

#[tokio::test]
async fn missing_resources_are_not_found() {
    let (app, _ctx) = test_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/productions/424242"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not Found");

    let response = app
        .clone()
        .oneshot(get_request("/api/products/424242"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request("/api/products/424242/recipe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_stage_filter_is_rejected() {
    let (app, _ctx) = test_app().await;

    let response = app
        .oneshot(get_request("/api/productions?stage=shipped"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn validation_failures_are_rejected_before_the_service() {
    let (app, _ctx) = test_app().await;

    // quantity below 1
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/productions",
            json!({
                "productTemplateId": 1,
                "quantity": 0,
                "selectedMaterials": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // empty product name
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({"name": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
