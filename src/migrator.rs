use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_organizations_and_buyers::Migration),
            Box::new(m20240101_000002_create_products::Migration),
            Box::new(m20240101_000003_create_pricing_rules::Migration),
            Box::new(m20240101_000004_create_credit_terms::Migration),
            Box::new(m20240101_000005_create_purchase_orders::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_organizations_and_buyers {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_organizations_and_buyers"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Organizations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Organizations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Organizations::Name).string().not_null())
                        .col(ColumnDef::new(Organizations::ContactEmail).string())
                        .col(
                            ColumnDef::new(Organizations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Organizations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Organizations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Buyers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Buyers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Buyers::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(Buyers::Name).string().not_null())
                        .col(ColumnDef::new(Buyers::Email).string().not_null())
                        .col(
                            ColumnDef::new(Buyers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Buyers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Buyers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_buyers_organization")
                                .from(Buyers::Table, Buyers::OrganizationId)
                                .to(Organizations::Table, Organizations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_buyers_organization_id")
                        .table(Buyers::Table)
                        .col(Buyers::OrganizationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Buyers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Organizations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Organizations {
        Table,
        Id,
        Name,
        ContactEmail,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Buyers {
        Table,
        Id,
        OrganizationId,
        Name,
        Email,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_products {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products"
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
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid())
                        .col(
                            ColumnDef::new(Products::ListPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Sku,
        Name,
        CategoryId,
        ListPrice,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_pricing_rules {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_pricing_rules"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WholesalePriceRules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WholesalePriceRules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WholesalePriceRules::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WholesalePriceRules::OrganizationId).uuid())
                        .col(
                            ColumnDef::new(WholesalePriceRules::MinQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WholesalePriceRules::MaxQuantity).integer())
                        .col(
                            ColumnDef::new(WholesalePriceRules::Price)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WholesalePriceRules::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(WholesalePriceRules::StartsAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(WholesalePriceRules::EndsAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(WholesalePriceRules::DeletedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(WholesalePriceRules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WholesalePriceRules::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_wholesale_price_rules_product_id")
                        .table(WholesalePriceRules::Table)
                        .col(WholesalePriceRules::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VolumeDiscountRules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VolumeDiscountRules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VolumeDiscountRules::ProductId).uuid())
                        .col(ColumnDef::new(VolumeDiscountRules::CategoryId).uuid())
                        .col(ColumnDef::new(VolumeDiscountRules::OrganizationId).uuid())
                        .col(
                            ColumnDef::new(VolumeDiscountRules::MinQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VolumeDiscountRules::MaxQuantity).integer())
                        .col(
                            ColumnDef::new(VolumeDiscountRules::DiscountPercent)
                                .decimal(),
                        )
                        .col(
                            ColumnDef::new(VolumeDiscountRules::FixedDiscountAmount)
                                .decimal(),
                        )
                        .col(
                            ColumnDef::new(VolumeDiscountRules::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(VolumeDiscountRules::StartsAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(VolumeDiscountRules::EndsAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(VolumeDiscountRules::DeletedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(VolumeDiscountRules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VolumeDiscountRules::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_volume_discount_rules_product_id")
                        .table(VolumeDiscountRules::Table)
                        .col(VolumeDiscountRules::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_volume_discount_rules_category_id")
                        .table(VolumeDiscountRules::Table)
                        .col(VolumeDiscountRules::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(VolumeDiscountRules::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WholesalePriceRules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WholesalePriceRules {
        Table,
        Id,
        ProductId,
        OrganizationId,
        MinQuantity,
        MaxQuantity,
        Price,
        Active,
        StartsAt,
        EndsAt,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum VolumeDiscountRules {
        Table,
        Id,
        ProductId,
        CategoryId,
        OrganizationId,
        MinQuantity,
        MaxQuantity,
        DiscountPercent,
        FixedDiscountAmount,
        Active,
        StartsAt,
        EndsAt,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_credit_terms {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_credit_terms"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CreditTerms::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CreditTerms::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditTerms::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(CreditTerms::Name).string().not_null())
                        .col(ColumnDef::new(CreditTerms::PaymentDays).integer().not_null())
                        .col(ColumnDef::new(CreditTerms::CreditLimit).decimal())
                        .col(
                            ColumnDef::new(CreditTerms::UsedCredit)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditTerms::Terms).string())
                        .col(
                            ColumnDef::new(CreditTerms::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(CreditTerms::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CreditTerms::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_credit_terms_organization_id")
                        .table(CreditTerms::Table)
                        .col(CreditTerms::OrganizationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CreditTerms::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CreditTerms {
        Table,
        Id,
        OrganizationId,
        Name,
        PaymentDays,
        CreditLimit,
        UsedCredit,
        Terms,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_purchase_orders {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_purchase_orders"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::OrganizationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::BuyerId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::CreditTermId).uuid())
                        .col(
                            ColumnDef::new(PurchaseOrders::Subtotal)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TaxAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ShippingAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::DiscountAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Notes).string())
                        .col(
                            ColumnDef::new(PurchaseOrders::SubmittedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ApprovedAt).timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ApprovedBy).uuid())
                        .col(
                            ColumnDef::new(PurchaseOrders::RejectedAt).timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::RejectionReason).string())
                        .col(
                            ColumnDef::new(PurchaseOrders::CancelledAt).timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Version).integer().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_organization")
                                .from(PurchaseOrders::Table, PurchaseOrders::OrganizationId)
                                .to(Organizations::Table, Organizations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // The unique index is the atomicity guard for the daily
            // count-then-format order-number sequence.
            manager
                .create_index(
                    Index::create()
                        .name("uq_purchase_orders_order_number")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::DiscountPercent)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::LineTotal)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::Notes).string())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_lines_order")
                                .from(
                                    PurchaseOrderLines::Table,
                                    PurchaseOrderLines::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_lines_order_id")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Organizations {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrders {
        Table,
        Id,
        OrderNumber,
        OrganizationId,
        BuyerId,
        Status,
        CreditTermId,
        Subtotal,
        TaxAmount,
        ShippingAmount,
        DiscountAmount,
        TotalAmount,
        Notes,
        SubmittedAt,
        ApprovedAt,
        ApprovedBy,
        RejectedAt,
        RejectionReason,
        CancelledAt,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        LineNumber,
        ProductId,
        Quantity,
        UnitPrice,
        DiscountPercent,
        LineTotal,
        Notes,
        CreatedAt,
    }
}
