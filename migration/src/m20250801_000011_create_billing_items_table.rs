use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillingItems::BillingId).uuid().not_null())
                    .col(
                        ColumnDef::new(BillingItems::InventoryItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingItems::ItemName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillingItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(BillingItems::UnitPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingItems::LineTotal)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BillingItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_items_billing_id")
                            .from(BillingItems::Table, BillingItems::BillingId)
                            .to(Billings::Table, Billings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_items_inventory_item_id")
                            .from(BillingItems::Table, BillingItems::InventoryItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_items_billing_id")
                    .table(BillingItems::Table)
                    .col(BillingItems::BillingId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillingItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BillingItems {
    Table,
    Id,
    BillingId,
    InventoryItemId,
    ItemName,
    Quantity,
    UnitPrice,
    LineTotal,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Billings {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum InventoryItems {
    Table,
    Id,
}
