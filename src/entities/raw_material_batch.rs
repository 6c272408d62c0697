use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_material_batches")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub type_id: i64,
    pub supplier_id: Option<i64>,
    pub serial_number: String,
    /// Live available quantity in grams; never negative
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remaining_amount: rust_decimal::Decimal,
    pub purchase_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::raw_material_type::Entity",
        from = "Column::TypeId",
        to = "super::raw_material_type::Column::Id"
    )]
    RawMaterialType,
    #[sea_orm(has_many = "super::production_material::Entity")]
    ProductionMaterials,
}

impl Related<super::raw_material_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterialType.def()
    }
}

impl Related<super::production_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionMaterials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
