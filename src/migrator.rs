use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_material_tables::Migration),
            Box::new(m20250301_000002_create_product_tables::Migration),
            Box::new(m20250301_000003_create_production_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_material_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_material_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RawMaterialTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RawMaterialTypes::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(RawMaterialTypes::Name).string().not_null())
                        .col(ColumnDef::new(RawMaterialTypes::Description).string())
                        .col(
                            ColumnDef::new(RawMaterialTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RawMaterialBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RawMaterialBatches::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RawMaterialBatches::TypeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RawMaterialBatches::SupplierId).big_integer())
                        .col(
                            ColumnDef::new(RawMaterialBatches::SerialNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RawMaterialBatches::RemainingAmount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RawMaterialBatches::PurchaseDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RawMaterialBatches::ExpirationDate).date())
                        .col(
                            ColumnDef::new(RawMaterialBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_batches_type")
                                .from(RawMaterialBatches::Table, RawMaterialBatches::TypeId)
                                .to(RawMaterialTypes::Table, RawMaterialTypes::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batches_type_id")
                        .table(RawMaterialBatches::Table)
                        .col(RawMaterialBatches::TypeId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RawMaterialBatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RawMaterialTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RawMaterialTypes {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RawMaterialBatches {
        Table,
        Id,
        TypeId,
        SupplierId,
        SerialNumber,
        RemainingAmount,
        PurchaseDate,
        ExpirationDate,
        CreatedAt,
    }
}

mod m20250301_000002_create_product_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_product_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).string())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductTemplates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductTemplates::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductTemplates::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductTemplates::Version).string().not_null())
                        .col(
                            ColumnDef::new(ProductTemplates::IsActive)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductTemplates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_templates_product")
                                .from(ProductTemplates::Table, ProductTemplates::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_templates_product_id")
                        .table(ProductTemplates::Table)
                        .col(ProductTemplates::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RecipeItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RecipeItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RecipeItems::ProductTemplateId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeItems::RawMaterialTypeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeItems::AmountInGrams)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipe_items_template")
                                .from(RecipeItems::Table, RecipeItems::ProductTemplateId)
                                .to(ProductTemplates::Table, ProductTemplates::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_recipe_items_template_id")
                        .table(RecipeItems::Table)
                        .col(RecipeItems::ProductTemplateId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RecipeItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductTemplates::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductTemplates {
        Table,
        Id,
        ProductId,
        Version,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum RecipeItems {
        Table,
        Id,
        ProductTemplateId,
        RawMaterialTypeId,
        AmountInGrams,
    }
}

mod m20250301_000003_create_production_tables {

    use sea_orm_migration::prelude::*;

    use super::m20250301_000001_create_material_tables::RawMaterialBatches;
    use super::m20250301_000002_create_product_tables::ProductTemplates;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_production_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Productions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Productions::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Productions::ProductTemplateId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Productions::Quantity).integer().not_null())
                        .col(ColumnDef::new(Productions::Stage).string().not_null())
                        .col(
                            ColumnDef::new(Productions::StartDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_productions_template")
                                .from(Productions::Table, Productions::ProductTemplateId)
                                .to(ProductTemplates::Table, ProductTemplates::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_productions_start_date")
                        .table(Productions::Table)
                        .col(Productions::StartDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_productions_stage")
                        .table(Productions::Table)
                        .col(Productions::Stage)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionMaterials::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionMaterials::ProductionId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionMaterials::BatchId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionMaterials::AmountUsed)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_materials_production")
                                .from(
                                    ProductionMaterials::Table,
                                    ProductionMaterials::ProductionId,
                                )
                                .to(Productions::Table, Productions::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_materials_batch")
                                .from(ProductionMaterials::Table, ProductionMaterials::BatchId)
                                .to(RawMaterialBatches::Table, RawMaterialBatches::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_materials_production_id")
                        .table(ProductionMaterials::Table)
                        .col(ProductionMaterials::ProductionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_materials_batch_id")
                        .table(ProductionMaterials::Table)
                        .col(ProductionMaterials::BatchId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Productions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Productions {
        Table,
        Id,
        ProductTemplateId,
        Quantity,
        Stage,
        StartDate,
    }

    #[derive(DeriveIden)]
    enum ProductionMaterials {
        Table,
        Id,
        ProductionId,
        BatchId,
        AmountUsed,
    }
}
