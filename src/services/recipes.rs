use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    entities::{
        product_template, production, recipe_item, raw_material_type, Product, ProductTemplate,
        Production, RawMaterialType, RecipeItem,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// One required material line of a recipe.
#[derive(Debug, Clone)]
pub struct NewRecipeItem {
    pub raw_material_type_id: i64,
    pub amount_in_grams: Decimal,
}

#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub version: String,
    pub items: Vec<NewRecipeItem>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeItemLine {
    pub id: i64,
    pub raw_material_type_id: i64,
    pub amount_in_grams: Decimal,
    pub material_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub product_template_id: i64,
    pub product_id: i64,
    pub version: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<RecipeItemLine>,
}

#[derive(Clone)]
pub struct RecipeService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl RecipeService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    fn validate_input(input: &RecipeInput) -> Result<(), ServiceError> {
        if input.version.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Recipe version label is required".into(),
            ));
        }
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A recipe needs at least one item".into(),
            ));
        }
        for item in &input.items {
            if item.amount_in_grams <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Amount for material type {} must be positive",
                    item.raw_material_type_id
                )));
            }
        }
        Ok(())
    }

    /// Creates a new recipe version for a product: deactivates the current
    /// active template (if any) and inserts a new active one with its
    /// items, atomically. Returns the new template id.
    #[instrument(skip(self, input))]
    pub async fn create_recipe(
        &self,
        product_id: i64,
        input: RecipeInput,
    ) -> Result<i64, ServiceError> {
        Self::validate_input(&input)?;

        let db = self.db.as_ref();
        let template_id = db
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    Product::find_by_id(product_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Product {} not found", product_id))
                        })?;

                    for item in &input.items {
                        RawMaterialType::find_by_id(item.raw_material_type_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Raw material type {} not found",
                                    item.raw_material_type_id
                                ))
                            })?;
                    }

                    // At most one active template per product
                    ProductTemplate::update_many()
                        .col_expr(
                            product_template::Column::IsActive,
                            sea_orm::sea_query::Expr::value(false),
                        )
                        .filter(product_template::Column::ProductId.eq(product_id))
                        .filter(product_template::Column::IsActive.eq(true))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let template = product_template::ActiveModel {
                        product_id: Set(product_id),
                        version: Set(input.version.clone()),
                        is_active: Set(true),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    for item in &input.items {
                        recipe_item::ActiveModel {
                            product_template_id: Set(template.id),
                            raw_material_type_id: Set(item.raw_material_type_id),
                            amount_in_grams: Set(item.amount_in_grams),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    Ok(template.id)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(product_id, template_id, "recipe created");
        self.event_sender
            .send(Event::RecipeCreated {
                product_id,
                product_template_id: template_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(template_id)
    }

    /// The product's active recipe with its items.
    pub async fn get_active_recipe(&self, product_id: i64) -> Result<RecipeDetail, ServiceError> {
        let template = self.find_active_template(product_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("No active recipe for product {}", product_id))
        })?;

        let items = RecipeItem::find()
            .filter(recipe_item::Column::ProductTemplateId.eq(template.id))
            .join(
                JoinType::InnerJoin,
                recipe_item::Relation::RawMaterialType.def(),
            )
            .column_as(raw_material_type::Column::Name, "material_name")
            .order_by_asc(recipe_item::Column::Id)
            .into_model::<RecipeItemLine>()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(RecipeDetail {
            product_template_id: template.id,
            product_id: template.product_id,
            version: template.version,
            is_active: template.is_active,
            created_at: template.created_at,
            items,
        })
    }

    /// Replaces all items of the currently active template in place and
    /// updates its version label. Does not create a new template row.
    #[instrument(skip(self, input))]
    pub async fn update_active_recipe(
        &self,
        product_id: i64,
        input: RecipeInput,
    ) -> Result<i64, ServiceError> {
        Self::validate_input(&input)?;

        let db = self.db.as_ref();
        let template_id = db
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let template = ProductTemplate::find()
                        .filter(product_template::Column::ProductId.eq(product_id))
                        .filter(product_template::Column::IsActive.eq(true))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InvalidOperation(format!(
                                "No active recipe for product {}",
                                product_id
                            ))
                        })?;

                    for item in &input.items {
                        RawMaterialType::find_by_id(item.raw_material_type_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Raw material type {} not found",
                                    item.raw_material_type_id
                                ))
                            })?;
                    }

                    RecipeItem::delete_many()
                        .filter(recipe_item::Column::ProductTemplateId.eq(template.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    for item in &input.items {
                        recipe_item::ActiveModel {
                            product_template_id: Set(template.id),
                            raw_material_type_id: Set(item.raw_material_type_id),
                            amount_in_grams: Set(item.amount_in_grams),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    let template_id = template.id;
                    let mut active: product_template::ActiveModel = template.into();
                    active.version = Set(input.version.clone());
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(template_id)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(product_id, template_id, "recipe updated");
        self.event_sender
            .send(Event::RecipeUpdated {
                product_template_id: template_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(template_id)
    }

    /// Deletes the product's active recipe (items then template row).
    /// Blocked while any production references any template of the
    /// product's lineage, regardless of version.
    #[instrument(skip(self))]
    pub async fn delete_recipe(&self, product_id: i64) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let referencing = Production::find()
                    .join(
                        JoinType::InnerJoin,
                        production::Relation::ProductTemplate.def(),
                    )
                    .filter(product_template::Column::ProductId.eq(product_id))
                    .count(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if referencing > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Cannot delete recipe: {} production(s) reference recipes of product {}",
                        referencing, product_id
                    )));
                }

                let template = ProductTemplate::find()
                    .filter(product_template::Column::ProductId.eq(product_id))
                    .filter(product_template::Column::IsActive.eq(true))
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "No active recipe for product {}",
                            product_id
                        ))
                    })?;

                RecipeItem::delete_many()
                    .filter(recipe_item::Column::ProductTemplateId.eq(template.id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                ProductTemplate::delete_by_id(template.id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        info!(product_id, "recipe deleted");
        self.event_sender
            .send(Event::RecipeDeleted { product_id })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    async fn find_active_template(
        &self,
        product_id: i64,
    ) -> Result<Option<product_template::Model>, ServiceError> {
        ProductTemplate::find()
            .filter(product_template::Column::ProductId.eq(product_id))
            .filter(product_template::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
