use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    entities::{
        production_material, raw_material_batch, raw_material_type, recipe_item,
        ProductionMaterial, RawMaterialBatch, RawMaterialType, RecipeItem,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct NewMaterialType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBatch {
    pub type_id: i64,
    pub supplier_id: Option<i64>,
    pub serial_number: String,
    pub remaining_amount: Decimal,
    pub purchase_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
}

/// Partial batch update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BatchUpdate {
    pub serial_number: Option<String>,
    pub remaining_amount: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub expiration_date: Option<Option<NaiveDate>>,
}

/// Batch row joined with its material type name.
#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: i64,
    pub type_id: i64,
    pub supplier_id: Option<i64>,
    pub serial_number: String,
    pub remaining_amount: Decimal,
    pub purchase_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub material_name: String,
}

#[derive(Clone)]
pub struct MaterialService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl MaterialService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    // Raw material types

    pub async fn create_material_type(
        &self,
        input: NewMaterialType,
    ) -> Result<raw_material_type::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Material type name is required".into(),
            ));
        }

        raw_material_type::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn list_material_types(&self) -> Result<Vec<raw_material_type::Model>, ServiceError> {
        RawMaterialType::find()
            .order_by_asc(raw_material_type::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn get_material_type(
        &self,
        id: i64,
    ) -> Result<raw_material_type::Model, ServiceError> {
        RawMaterialType::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Raw material type {} not found", id)))
    }

    /// Deletes a material type. Blocked while any recipe item references it.
    #[instrument(skip(self), fields(type_id = id))]
    pub async fn delete_material_type(&self, id: i64) -> Result<(), ServiceError> {
        self.get_material_type(id).await?;

        let references = RecipeItem::find()
            .filter(recipe_item::Column::RawMaterialTypeId.eq(id))
            .count(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Cannot delete raw material type {}: {} recipe item(s) reference it",
                id, references
            )));
        }

        RawMaterialType::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(type_id = id, "raw material type deleted");
        Ok(())
    }

    // Raw material batches

    pub async fn create_batch(
        &self,
        input: NewBatch,
    ) -> Result<raw_material_batch::Model, ServiceError> {
        if input.remaining_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Batch amount cannot be negative".into(),
            ));
        }
        if input.serial_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Batch serial number is required".into(),
            ));
        }
        self.get_material_type(input.type_id).await?;

        let created = raw_material_batch::ActiveModel {
            type_id: Set(input.type_id),
            supplier_id: Set(input.supplier_id),
            serial_number: Set(input.serial_number),
            remaining_amount: Set(input.remaining_amount),
            purchase_date: Set(input.purchase_date),
            expiration_date: Set(input.expiration_date),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(batch_id = created.id, type_id = created.type_id, "batch created");
        self.event_sender
            .send(Event::BatchCreated {
                batch_id: created.id,
                type_id: created.type_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    pub async fn list_batches(&self) -> Result<Vec<BatchSummary>, ServiceError> {
        RawMaterialBatch::find()
            .join(
                JoinType::InnerJoin,
                raw_material_batch::Relation::RawMaterialType.def(),
            )
            .column_as(raw_material_type::Column::Name, "material_name")
            .order_by_asc(raw_material_batch::Column::ExpirationDate)
            .order_by_asc(raw_material_batch::Column::Id)
            .into_model::<BatchSummary>()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn get_batch(&self, id: i64) -> Result<raw_material_batch::Model, ServiceError> {
        RawMaterialBatch::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", id)))
    }

    /// Applies a partial update. The remaining amount can be corrected by
    /// an administrator but never below zero.
    pub async fn update_batch(
        &self,
        id: i64,
        update: BatchUpdate,
    ) -> Result<raw_material_batch::Model, ServiceError> {
        if let Some(amount) = update.remaining_amount {
            if amount < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Batch amount cannot be negative".into(),
                ));
            }
        }

        let batch = self.get_batch(id).await?;
        let mut active: raw_material_batch::ActiveModel = batch.into();
        if let Some(serial) = update.serial_number {
            active.serial_number = Set(serial);
        }
        if let Some(amount) = update.remaining_amount {
            active.remaining_amount = Set(amount);
        }
        if let Some(purchase_date) = update.purchase_date {
            active.purchase_date = Set(purchase_date);
        }
        if let Some(expiration_date) = update.expiration_date {
            active.expiration_date = Set(expiration_date);
        }

        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a batch. Blocked once any production has consumed from it.
    #[instrument(skip(self), fields(batch_id = id))]
    pub async fn delete_batch(&self, id: i64) -> Result<(), ServiceError> {
        self.get_batch(id).await?;

        let references = ProductionMaterial::find()
            .filter(production_material::Column::BatchId.eq(id))
            .count(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Cannot delete batch {}: {} production material(s) reference it",
                id, references
            )));
        }

        RawMaterialBatch::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(batch_id = id, "batch deleted");
        self.event_sender
            .send(Event::BatchDeleted { batch_id: id })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }
}
