use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NPCS API",
        version = "1.0.0",
        description = r#"
# NPCS Production & Inventory API

Backend for small-batch manufacturing: raw material stock tracked per batch,
versioned product recipes, and a staged production workflow that commits
stock transactionally.

## Error Handling

Failing endpoints return a consistent error envelope with an appropriate
HTTP status code:

```json
{
  "success": false,
  "error": "Bad Request",
  "message": "Insufficient stock: Batch 3 has 20g remaining but 50g requested",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

Business-rule violations (bad stage transitions, insufficient stock,
delete conflicts) are 400; missing resources are 404.
        "#
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    tags(
        (name = "Productions", description = "Production workflow endpoints"),
        (name = "Recipes", description = "Recipe lifecycle endpoints"),
        (name = "Products", description = "Product master data"),
        (name = "Materials", description = "Raw material types and batches"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // Productions
        crate::handlers::productions::create_production,
        crate::handlers::productions::create_productions_bulk,
        crate::handlers::productions::list_productions,
        crate::handlers::productions::get_production,
        crate::handlers::productions::update_production_stage,
        crate::handlers::productions::cancel_production,

        // Recipes
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_active_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::delete_recipe,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::delete_products,

        // Materials
        crate::handlers::materials::create_material_type,
        crate::handlers::materials::list_material_types,
        crate::handlers::materials::get_material_type,
        crate::handlers::materials::delete_material_type,
        crate::handlers::materials::create_batch,
        crate::handlers::materials::list_batches,
        crate::handlers::materials::get_batch,
        crate::handlers::materials::update_batch,
        crate::handlers::materials::delete_batch,

        // Health
        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
        crate::handlers::health::detailed_health_check,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Production types
            crate::handlers::productions::CreateProductionRequest,
            crate::handlers::productions::SelectedMaterialRequest,
            crate::handlers::productions::BulkCreateProductionsRequest,
            crate::handlers::productions::UpdateStageRequest,
            crate::services::productions::CreatedProduction,
            crate::services::productions::ProductionSummary,
            crate::services::productions::ProductionMaterialLine,
            crate::services::productions::ProductionDetail,

            // Recipe types
            crate::handlers::recipes::RecipeRequest,
            crate::handlers::recipes::RecipeItemRequest,
            crate::services::recipes::RecipeDetail,
            crate::services::recipes::RecipeItemLine,

            // Product types
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::BulkDeleteProductsRequest,

            // Material types
            crate::handlers::materials::CreateMaterialTypeRequest,
            crate::handlers::materials::CreateBatchRequest,
            crate::handlers::materials::UpdateBatchRequest,
            crate::services::materials::BatchSummary,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_every_surface() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("NPCS API"));
        assert!(json.contains("/api/productions"));
        assert!(json.contains("/api/products/{product_id}/recipe"));
        assert!(json.contains("/api/products/bulk-delete"));
        assert!(json.contains("/api/material-types/{id}"));
        assert!(json.contains("/api/batches/{id}"));
        assert!(json.contains("/health/ready"));
    }
}
