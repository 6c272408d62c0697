use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One manufacturing run: N units of a product under one recipe version.
/// `stage` holds the string form of `models::ProductionStage`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_template_id: i64,
    pub quantity: i32,
    pub stage: String,
    pub start_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_template::Entity",
        from = "Column::ProductTemplateId",
        to = "super::product_template::Column::Id"
    )]
    ProductTemplate,
    #[sea_orm(has_many = "super::production_material::Entity")]
    ProductionMaterials,
}

impl Related<super::product_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTemplate.def()
    }
}

impl Related<super::production_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionMaterials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
