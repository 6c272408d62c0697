use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_material_types")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::raw_material_batch::Entity")]
    RawMaterialBatches,
    #[sea_orm(has_many = "super::recipe_item::Entity")]
    RecipeItems,
}

impl Related<super::raw_material_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterialBatches.def()
    }
}

impl Related<super::recipe_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
