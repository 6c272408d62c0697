use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Nominal grams of one material type required per single product unit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_template_id: i64,
    pub raw_material_type_id: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount_in_grams: rust_decimal::Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_template::Entity",
        from = "Column::ProductTemplateId",
        to = "super::product_template::Column::Id"
    )]
    ProductTemplate,
    #[sea_orm(
        belongs_to = "super::raw_material_type::Entity",
        from = "Column::RawMaterialTypeId",
        to = "super::raw_material_type::Column::Id"
    )]
    RawMaterialType,
}

impl Related<super::product_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTemplate.def()
    }
}

impl Related<super::raw_material_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterialType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
