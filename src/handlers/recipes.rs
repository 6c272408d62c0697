use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::recipes::{NewRecipeItem, RecipeInput},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

/// Recipe endpoints, mounted under the owning product.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/recipe", post(create_recipe))
        .route("/:id/recipe", get(get_active_recipe))
        .route("/:id/recipe", put(update_recipe))
        .route("/:id/recipe", delete(delete_recipe))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeItemRequest {
    pub raw_material_type_id: i64,
    /// Grams required per single product unit
    pub amount_in_grams: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[validate(length(min = 1, message = "version label is required"))]
    pub version: String,
    #[validate(length(min = 1, message = "a recipe needs at least one item"))]
    pub items: Vec<RecipeItemRequest>,
}

impl RecipeRequest {
    fn into_input(self) -> RecipeInput {
        RecipeInput {
            version: self.version,
            items: self
                .items
                .into_iter()
                .map(|item| NewRecipeItem {
                    raw_material_type_id: item.raw_material_type_id,
                    amount_in_grams: item.amount_in_grams,
                })
                .collect(),
        }
    }
}

/// Create a new recipe version, deactivating the previous one
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/recipe",
    params(("product_id" = i64, Path, description = "Owning product id")),
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe version created and activated"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or material type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let template_id = state
        .services
        .recipes
        .create_recipe(product_id, payload.into_input())
        .await
        .map_err(map_service_error)?;

    info!("Recipe created: template {}", template_id);
    Ok(created_response(json!({
        "productTemplateId": template_id,
        "productId": product_id,
    })))
}

/// The product's active recipe with its items
#[utoipa::path(
    get,
    path = "/api/products/{product_id}/recipe",
    params(("product_id" = i64, Path, description = "Owning product id")),
    responses(
        (status = 200, description = "Active recipe"),
        (status = 404, description = "No active recipe for the product", body = crate::errors::ErrorResponse)
    ),
    tag = "Recipes"
)]
pub async fn get_active_recipe(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state
        .services
        .recipes
        .get_active_recipe(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(recipe))
}

/// Replace the items of the active recipe in place
#[utoipa::path(
    put,
    path = "/api/products/{product_id}/recipe",
    params(("product_id" = i64, Path, description = "Owning product id")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Active recipe updated"),
        (status = 400, description = "Validation failed or no active recipe", body = crate::errors::ErrorResponse)
    ),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let template_id = state
        .services
        .recipes
        .update_active_recipe(product_id, payload.into_input())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "productTemplateId": template_id,
        "productId": product_id,
    })))
}

/// Delete the product's active recipe
#[utoipa::path(
    delete,
    path = "/api/products/{product_id}/recipe",
    params(("product_id" = i64, Path, description = "Owning product id")),
    responses(
        (status = 200, description = "Recipe deleted"),
        (status = 400, description = "Productions still reference the product's recipes", body = crate::errors::ErrorResponse),
        (status = 404, description = "No active recipe for the product", body = crate::errors::ErrorResponse)
    ),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .recipes
        .delete_recipe(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "productId": product_id,
        "deleted": true,
    })))
}
