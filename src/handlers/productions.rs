use super::common::{
    created_response, map_service_error, success_message_response, success_response,
    validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::ProductionStage,
    services::productions::{NewProduction, ProductionFilter, SelectedMaterial},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for production endpoints
pub fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_production))
        .route("/", get(list_productions))
        .route("/search", get(list_productions))
        .route("/bulk", post(create_productions_bulk))
        .route("/:id", get(get_production))
        .route("/:id/stage", put(update_production_stage))
        .route("/:id/cancel", post(cancel_production))
}

// Request and response DTOs

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMaterialRequest {
    pub batch_id: i64,
    /// Grams to commit from the batch, already scaled by quantity
    pub amount_used: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionRequest {
    pub product_template_id: i64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub selected_materials: Vec<SelectedMaterialRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCreateProductionsRequest {
    #[validate(length(min = 1, message = "at least one production is required"))]
    pub productions: Vec<CreateProductionRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStageRequest {
    pub stage: String,
}

/// Search filters; all optional and combined with AND. Dates cover whole
/// days in UTC.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSearchParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub stage: Option<String>,
    pub product_id: Option<i64>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
}

impl ProductionSearchParams {
    fn into_filter(self) -> Result<ProductionFilter, ApiError> {
        let stage = self
            .stage
            .map(|s| ProductionStage::parse(&s))
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(ProductionFilter {
            start_date: self
                .start_date
                .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default())),
            end_date: self
                .end_date
                .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(23, 59, 59).unwrap_or_default())),
            stage,
            product_id: self.product_id,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
        })
    }
}

fn to_service_input(request: CreateProductionRequest) -> NewProduction {
    NewProduction {
        product_template_id: request.product_template_id,
        quantity: request.quantity,
        selected_materials: request
            .selected_materials
            .into_iter()
            .map(|m| SelectedMaterial {
                batch_id: m.batch_id,
                amount_used: m.amount_used,
            })
            .collect(),
    }
}

// Handler functions

/// Create a single production and commit its materials
#[utoipa::path(
    post,
    path = "/api/productions",
    request_body = CreateProductionRequest,
    responses(
        (status = 201, description = "Production created"),
        (status = 400, description = "Validation failed or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Template or batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn create_production(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let selected_materials = payload.selected_materials.clone();
    let created = state
        .services
        .productions
        .create_production(to_service_input(payload))
        .await
        .map_err(map_service_error)?;

    info!("Production created: {}", created.production_id);
    Ok(created_response(json!({
        "productionId": created.production_id,
        "quantity": created.quantity,
        "selectedMaterials": selected_materials,
    })))
}

/// Create several productions atomically
#[utoipa::path(
    post,
    path = "/api/productions/bulk",
    request_body = BulkCreateProductionsRequest,
    responses(
        (status = 201, description = "All productions created"),
        (status = 400, description = "Validation failed or insufficient stock; nothing was created", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn create_productions_bulk(
    State(state): State<AppState>,
    Json(payload): Json<BulkCreateProductionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    for production in &payload.productions {
        validate_input(production)?;
    }

    let inputs = payload.productions.into_iter().map(to_service_input).collect();
    let created = state
        .services
        .productions
        .create_productions(inputs)
        .await
        .map_err(map_service_error)?;

    info!("Productions created in bulk: {}", created.len());
    Ok(created_response(created))
}

/// List productions, optionally filtered
#[utoipa::path(
    get,
    path = "/api/productions",
    params(ProductionSearchParams),
    responses(
        (status = 200, description = "Matching productions, most recent first"),
        (status = 400, description = "Unknown stage filter", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn list_productions(
    State(state): State<AppState>,
    Query(params): Query<ProductionSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = params.into_filter()?;
    let productions = state
        .services
        .productions
        .search_productions(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(productions))
}

/// One production with its committed materials
#[utoipa::path(
    get,
    path = "/api/productions/{id}",
    params(("id" = i64, Path, description = "Production id")),
    responses(
        (status = 200, description = "Production detail"),
        (status = 404, description = "Production not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn get_production(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .productions
        .get_production(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Move a production to the next stage
#[utoipa::path(
    put,
    path = "/api/productions/{id}/stage",
    params(("id" = i64, Path, description = "Production id")),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Stage updated"),
        (status = 400, description = "Unknown stage or transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Production not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn update_production_stage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = ProductionStage::parse(&payload.stage)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let change = state
        .services
        .productions
        .update_stage(id, target)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "id": change.id,
        "previousStage": change.previous_stage.to_string(),
        "currentStage": change.current_stage.to_string(),
    })))
}

/// Cancel a production still in preparation, restoring its stock
#[utoipa::path(
    post,
    path = "/api/productions/{id}/cancel",
    params(("id" = i64, Path, description = "Production id")),
    responses(
        (status = 200, description = "Production cancelled and stock restored"),
        (status = 400, description = "Production is past preparation", body = crate::errors::ErrorResponse),
        (status = 404, description = "Production not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Productions"
)]
pub async fn cancel_production(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .productions
        .cancel_production(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_message_response(
        json!({ "productionId": id }),
        format!("Production {} cancelled", id),
    ))
}
