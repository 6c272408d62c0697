use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::{ConnectionTrait, DatabaseTransaction};
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    entities::{product, product_template, Product, ProductTemplate},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".into(),
            ));
        }

        let created = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(product_id = created.id, "product created");
        self.event_sender
            .send(Event::ProductCreated {
                product_id: created.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn get_product(&self, id: i64) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Deletes a product. Blocked while the product still owns any recipe
    /// template.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn delete_product(&self, id: i64) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move { delete_product_in_txn(txn, id).await })
        })
        .await
        .map_err(ServiceError::from)?;

        info!(product_id = id, "product deleted");
        self.event_sender
            .send(Event::ProductDeleted { product_id: id })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    /// Deletes several products as one atomic unit; any guard violation
    /// rolls back the whole call.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_products(&self, ids: Vec<i64>) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one product id is required".into(),
            ));
        }

        let db = self.db.as_ref();
        let deleted = ids.clone();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                for id in ids {
                    delete_product_in_txn(txn, id).await?;
                }
                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        for id in deleted {
            info!(product_id = id, "product deleted");
            self.event_sender
                .send(Event::ProductDeleted { product_id: id })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(())
    }
}

async fn delete_product_in_txn(txn: &DatabaseTransaction, id: i64) -> Result<(), ServiceError> {
    exists_product(txn, id).await?;

    let templates = ProductTemplate::find()
        .filter(product_template::Column::ProductId.eq(id))
        .count(txn)
        .await
        .map_err(ServiceError::db_error)?;
    if templates > 0 {
        return Err(ServiceError::Conflict(format!(
            "Cannot delete product {}: {} recipe template(s) exist",
            id, templates
        )));
    }

    Product::delete_by_id(id)
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(())
}

async fn exists_product<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), ServiceError> {
    Product::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
    Ok(())
}
