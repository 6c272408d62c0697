use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use tracing::{info, instrument};

use crate::{
    db::{DbPool, SearchBuilder},
    entities::{
        product, product_template, production, production_material, raw_material_batch,
        raw_material_type, Production, ProductionMaterial, ProductTemplate, RawMaterialBatch,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::ProductionStage,
};

/// One caller-chosen batch commitment for a production.
#[derive(Debug, Clone)]
pub struct SelectedMaterial {
    pub batch_id: i64,
    pub amount_used: Decimal,
}

/// Input for one production in a creation call. The caller matches batches
/// to recipe items and scales `amount_used` by quantity; the service never
/// recomputes it from the recipe.
#[derive(Debug, Clone)]
pub struct NewProduction {
    pub product_template_id: i64,
    pub quantity: i32,
    pub selected_materials: Vec<SelectedMaterial>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProduction {
    pub production_id: i64,
    #[serde(rename = "templateId")]
    pub product_template_id: i64,
    pub quantity: i32,
}

/// Production row joined with its recipe version and product.
#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSummary {
    pub id: i64,
    pub product_template_id: i64,
    pub quantity: i32,
    pub stage: String,
    pub start_date: DateTime<Utc>,
    pub template_version: String,
    pub product_name: String,
    pub product_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionMaterialLine {
    pub id: i64,
    pub batch_id: i64,
    pub amount_used: Decimal,
    pub material_name: String,
    pub batch_serial_number: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductionDetail {
    #[serde(flatten)]
    pub summary: ProductionSummary,
    pub materials: Vec<ProductionMaterialLine>,
}

#[derive(Debug, Clone)]
pub struct StageChange {
    pub id: i64,
    pub previous_stage: ProductionStage,
    pub current_stage: ProductionStage,
}

/// Optional, conjunctive search filters over productions.
#[derive(Debug, Clone, Default)]
pub struct ProductionFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub stage: Option<ProductionStage>,
    pub product_id: Option<i64>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
}

#[derive(Clone)]
pub struct ProductionService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductionService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a single production. Identical contract to the bulk path
    /// with a one-element set.
    pub async fn create_production(
        &self,
        input: NewProduction,
    ) -> Result<CreatedProduction, ServiceError> {
        let mut created = self.create_productions(vec![input]).await?;
        created
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Creation returned no production".into()))
    }

    /// Creates a set of productions as one atomic unit.
    ///
    /// Inside a single transaction: a validation pass checks every template
    /// and batch and that each batch covers the amount requested across the
    /// *whole* submission; the write pass then inserts the production and
    /// material rows and decrements each batch's remaining amount. Any
    /// failure rolls back every write of the call.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn create_productions(
        &self,
        inputs: Vec<NewProduction>,
    ) -> Result<Vec<CreatedProduction>, ServiceError> {
        if inputs.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one production is required".into(),
            ));
        }
        for input in &inputs {
            if input.quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "Production quantity must be at least 1".into(),
                ));
            }
            for material in &input.selected_materials {
                if material.amount_used <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(format!(
                        "Material amount for batch {} must be positive",
                        material.batch_id
                    )));
                }
            }
        }

        let db = self.db.as_ref();
        let created = db
            .transaction::<_, Vec<CreatedProduction>, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Validation pass: nothing is written until every check
                    // across every production in the call has passed.
                    let mut requested: HashMap<i64, Decimal> = HashMap::new();
                    for input in &inputs {
                        ProductTemplate::find_by_id(input.product_template_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Product template {} not found",
                                    input.product_template_id
                                ))
                            })?;
                        for material in &input.selected_materials {
                            *requested.entry(material.batch_id).or_insert(Decimal::ZERO) +=
                                material.amount_used;
                        }
                    }

                    for (&batch_id, &total) in &requested {
                        let batch = RawMaterialBatch::find_by_id(batch_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("Batch {} not found", batch_id))
                            })?;
                        if batch.remaining_amount < total {
                            return Err(ServiceError::InsufficientStock(format!(
                                "Batch {} has {}g remaining but {}g requested",
                                batch_id, batch.remaining_amount, total
                            )));
                        }
                    }

                    // Write pass
                    let now = Utc::now();
                    let mut created = Vec::with_capacity(inputs.len());
                    for input in &inputs {
                        let row = production::ActiveModel {
                            product_template_id: Set(input.product_template_id),
                            quantity: Set(input.quantity),
                            stage: Set(ProductionStage::Preparation.as_str().to_string()),
                            start_date: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        for material in &input.selected_materials {
                            production_material::ActiveModel {
                                production_id: Set(row.id),
                                batch_id: Set(material.batch_id),
                                amount_used: Set(material.amount_used),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        }

                        created.push(CreatedProduction {
                            production_id: row.id,
                            product_template_id: input.product_template_id,
                            quantity: input.quantity,
                        });
                    }

                    // Commit the reservation. The decrement is conditional
                    // on the current remaining amount still covering the
                    // request, so a concurrent reservation that slipped in
                    // between the check and this write fails the whole
                    // transaction instead of driving the batch negative.
                    for (batch_id, total) in requested {
                        let result = RawMaterialBatch::update_many()
                            .col_expr(
                                raw_material_batch::Column::RemainingAmount,
                                sea_orm::sea_query::Expr::col(
                                    raw_material_batch::Column::RemainingAmount,
                                )
                                .sub(total),
                            )
                            .filter(raw_material_batch::Column::Id.eq(batch_id))
                            .filter(raw_material_batch::Column::RemainingAmount.gte(total))
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        if result.rows_affected == 0 {
                            let remaining = RawMaterialBatch::find_by_id(batch_id)
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .map(|b| b.remaining_amount)
                                .unwrap_or_default();
                            return Err(ServiceError::InsufficientStock(format!(
                                "Batch {} has {}g remaining but {}g requested",
                                batch_id, remaining, total
                            )));
                        }
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        for production in &created {
            info!(
                production_id = production.production_id,
                quantity = production.quantity,
                "production created"
            );
            self.event_sender
                .send(Event::ProductionCreated {
                    production_id: production.production_id,
                    product_template_id: production.product_template_id,
                    quantity: production.quantity,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(created)
    }

    /// All productions, most recent start date first.
    pub async fn list_productions(&self) -> Result<Vec<ProductionSummary>, ServiceError> {
        self.search_productions(ProductionFilter::default()).await
    }

    /// Filtered production list; absent filters match everything.
    pub async fn search_productions(
        &self,
        filter: ProductionFilter,
    ) -> Result<Vec<ProductionSummary>, ServiceError> {
        let condition = SearchBuilder::new()
            .add_optional(filter.start_date, |d| production::Column::StartDate.gte(d))
            .add_optional(filter.end_date, |d| production::Column::StartDate.lte(d))
            .add_optional(filter.stage, |s| production::Column::Stage.eq(s.as_str()))
            .add_optional(filter.product_id, |p| {
                product_template::Column::ProductId.eq(p)
            })
            .add_optional(filter.min_quantity, |q| {
                production::Column::Quantity.gte(q)
            })
            .add_optional(filter.max_quantity, |q| {
                production::Column::Quantity.lte(q)
            })
            .build();

        self.find_summaries(condition).await
    }

    async fn find_summaries(
        &self,
        condition: Condition,
    ) -> Result<Vec<ProductionSummary>, ServiceError> {
        Production::find()
            .join(
                JoinType::InnerJoin,
                production::Relation::ProductTemplate.def(),
            )
            .join(JoinType::InnerJoin, product_template::Relation::Product.def())
            .column_as(product_template::Column::Version, "template_version")
            .column_as(product::Column::Name, "product_name")
            .column_as(product::Column::Description, "product_description")
            .filter(condition)
            .order_by_desc(production::Column::StartDate)
            .order_by_desc(production::Column::Id)
            .into_model::<ProductionSummary>()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// One production joined with its committed materials.
    pub async fn get_production(&self, id: i64) -> Result<ProductionDetail, ServiceError> {
        let summaries = self
            .find_summaries(Condition::all().add(production::Column::Id.eq(id)))
            .await?;
        let summary = summaries
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("Production {} not found", id)))?;

        let materials = ProductionMaterial::find()
            .filter(production_material::Column::ProductionId.eq(id))
            .join(
                JoinType::InnerJoin,
                production_material::Relation::RawMaterialBatch.def(),
            )
            .join(
                JoinType::InnerJoin,
                raw_material_batch::Relation::RawMaterialType.def(),
            )
            .column_as(raw_material_type::Column::Name, "material_name")
            .column_as(raw_material_batch::Column::SerialNumber, "batch_serial_number")
            .order_by_asc(production_material::Column::Id)
            .into_model::<ProductionMaterialLine>()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ProductionDetail { summary, materials })
    }

    /// Moves a production to `target`, consulting the stage transition
    /// table. Returns the prior and new stage.
    #[instrument(skip(self), fields(production_id = id, target = %target))]
    pub async fn update_stage(
        &self,
        id: i64,
        target: ProductionStage,
    ) -> Result<StageChange, ServiceError> {
        if target == ProductionStage::Cancelled {
            return Err(ServiceError::InvalidOperation(
                "Cancellation deletes the production and its materials; use the cancel operation"
                    .into(),
            ));
        }

        let db = self.db.as_ref();
        let change = db
            .transaction::<_, StageChange, ServiceError>(move |txn| {
                Box::pin(async move {
                    let row = Production::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Production {} not found", id))
                        })?;

                    let current = ProductionStage::parse(&row.stage).map_err(|_| {
                        ServiceError::InternalError(format!(
                            "Production {} has unknown stage '{}'",
                            id, row.stage
                        ))
                    })?;

                    if !current.can_transition(target) {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Cannot transition production {} from '{}' to '{}'",
                            id, current, target
                        )));
                    }

                    let mut active: production::ActiveModel = row.into();
                    active.stage = Set(target.as_str().to_string());
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(StageChange {
                        id,
                        previous_stage: current,
                        current_stage: target,
                    })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            production_id = id,
            from = %change.previous_stage,
            to = %change.current_stage,
            "production stage updated"
        );
        self.event_sender
            .send(Event::ProductionStageChanged {
                production_id: id,
                previous_stage: change.previous_stage.to_string(),
                current_stage: change.current_stage.to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(change)
    }

    /// Cancels a production still in `preparation`: restores the committed
    /// amounts to their batches, deletes the material rows and then the
    /// production row, all atomically.
    #[instrument(skip(self), fields(production_id = id))]
    pub async fn cancel_production(&self, id: i64) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let row = Production::find_by_id(id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Production {} not found", id))
                    })?;

                let current = ProductionStage::parse(&row.stage).map_err(|_| {
                    ServiceError::InternalError(format!(
                        "Production {} has unknown stage '{}'",
                        id, row.stage
                    ))
                })?;
                if current != ProductionStage::Preparation {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Only productions in the preparation stage can be cancelled (production {} is '{}')",
                        id, current
                    )));
                }

                let materials = ProductionMaterial::find()
                    .filter(production_material::Column::ProductionId.eq(id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                // Return the committed amounts, mirroring the decrement at
                // creation time.
                for material in &materials {
                    let batch = RawMaterialBatch::find_by_id(material.batch_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Batch {} not found",
                                material.batch_id
                            ))
                        })?;
                    let restored = batch.remaining_amount + material.amount_used;
                    let mut active: raw_material_batch::ActiveModel = batch.into();
                    active.remaining_amount = Set(restored);
                    active.update(txn).await.map_err(ServiceError::db_error)?;
                }

                ProductionMaterial::delete_many()
                    .filter(production_material::Column::ProductionId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                Production::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        info!(production_id = id, "production cancelled");
        self.event_sender
            .send(Event::ProductionCancelled { production_id: id })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }
}
