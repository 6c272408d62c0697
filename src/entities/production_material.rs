use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grams committed from one batch to one production. Rows are immutable
/// once written; cancellation deletes them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_materials")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub production_id: i64,
    pub batch_id: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount_used: rust_decimal::Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production::Entity",
        from = "Column::ProductionId",
        to = "super::production::Column::Id"
    )]
    Production,
    #[sea_orm(
        belongs_to = "super::raw_material_batch::Entity",
        from = "Column::BatchId",
        to = "super::raw_material_batch::Column::Id"
    )]
    RawMaterialBatch,
}

impl Related<super::production::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Production.def()
    }
}

impl Related<super::raw_material_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterialBatch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
