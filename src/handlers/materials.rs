use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::materials::{BatchUpdate, NewBatch, NewMaterialType},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for raw material type endpoints
pub fn material_type_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_material_type))
        .route("/", get(list_material_types))
        .route("/:id", get(get_material_type))
        .route("/:id", delete(delete_material_type))
}

/// Creates the router for raw material batch endpoints
pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_batch))
        .route("/", get(list_batches))
        .route("/:id", get(get_batch))
        .route("/:id", put(update_batch))
        .route("/:id", delete(delete_batch))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialTypeRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    pub type_id: i64,
    pub supplier_id: Option<i64>,
    #[validate(length(min = 1, message = "serial number is required"))]
    pub serial_number: String,
    /// Initial stock in grams
    pub remaining_amount: Decimal,
    pub purchase_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
}

/// Partial update; absent fields keep their value. `expirationDate` may be
/// set to null explicitly to clear it.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatchRequest {
    pub serial_number: Option<String>,
    pub remaining_amount: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    #[serde(default, with = "double_option")]
    pub expiration_date: Option<Option<NaiveDate>>,
}

/// Distinguishes an absent field from an explicit null.
mod double_option {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NaiveDate>::deserialize(de).map(Some)
    }
}

// Raw material type handlers

/// Create a raw material type
#[utoipa::path(
    post,
    path = "/api/material-types",
    request_body = CreateMaterialTypeRequest,
    responses(
        (status = 201, description = "Material type created"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn create_material_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterialTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let material_type = state
        .services
        .materials
        .create_material_type(NewMaterialType {
            name: payload.name,
            description: payload.description,
        })
        .await
        .map_err(map_service_error)?;

    info!("Raw material type created: {}", material_type.id);
    Ok(created_response(material_type))
}

/// All material types, alphabetical
#[utoipa::path(
    get,
    path = "/api/material-types",
    responses((status = 200, description = "Material type list")),
    tag = "Materials"
)]
pub async fn list_material_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let types = state
        .services
        .materials
        .list_material_types()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(types))
}

/// One material type by id
#[utoipa::path(
    get,
    path = "/api/material-types/{id}",
    params(("id" = i64, Path, description = "Material type id")),
    responses(
        (status = 200, description = "Material type"),
        (status = 404, description = "Material type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn get_material_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let material_type = state
        .services
        .materials
        .get_material_type(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(material_type))
}

/// Delete an unreferenced material type
#[utoipa::path(
    delete,
    path = "/api/material-types/{id}",
    params(("id" = i64, Path, description = "Material type id")),
    responses(
        (status = 204, description = "Material type deleted"),
        (status = 400, description = "Recipe items still reference the type", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn delete_material_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .materials
        .delete_material_type(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Batch handlers

/// Register a purchased batch
#[utoipa::path(
    post,
    path = "/api/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let batch = state
        .services
        .materials
        .create_batch(NewBatch {
            type_id: payload.type_id,
            supplier_id: payload.supplier_id,
            serial_number: payload.serial_number,
            remaining_amount: payload.remaining_amount,
            purchase_date: payload.purchase_date,
            expiration_date: payload.expiration_date,
        })
        .await
        .map_err(map_service_error)?;

    info!("Batch created: {}", batch.id);
    Ok(created_response(batch))
}

/// All batches with their material type, soonest expiration first
#[utoipa::path(
    get,
    path = "/api/batches",
    responses((status = 200, description = "Batch list with material type names")),
    tag = "Materials"
)]
pub async fn list_batches(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let batches = state
        .services
        .materials
        .list_batches()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(batches))
}

/// One batch by id
#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch"),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .services
        .materials
        .get_batch(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(batch))
}

/// Partially update a batch; the remaining amount can never go negative
#[utoipa::path(
    put,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch id")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .services
        .materials
        .update_batch(
            id,
            BatchUpdate {
                serial_number: payload.serial_number,
                remaining_amount: payload.remaining_amount,
                purchase_date: payload.purchase_date,
                expiration_date: payload.expiration_date,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(batch))
}

/// Delete a batch no production has consumed from
#[utoipa::path(
    delete,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch id")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 400, description = "Production materials still reference the batch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Materials"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .materials
        .delete_batch(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
