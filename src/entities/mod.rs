pub mod product;
pub mod product_template;
pub mod production;
pub mod production_material;
pub mod raw_material_batch;
pub mod raw_material_type;
pub mod recipe_item;

pub use product::Entity as Product;
pub use product_template::Entity as ProductTemplate;
pub use production::Entity as Production;
pub use production_material::Entity as ProductionMaterial;
pub use raw_material_batch::Entity as RawMaterialBatch;
pub use raw_material_type::Entity as RawMaterialType;
pub use recipe_item::Entity as RecipeItem;
