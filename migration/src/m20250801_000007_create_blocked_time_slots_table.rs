use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlockedTimeSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlockedTimeSlots::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlockedTimeSlots::StartDate).date().not_null())
                    .col(ColumnDef::new(BlockedTimeSlots::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(BlockedTimeSlots::StartTime)
                            .string_len(5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlockedTimeSlots::EndTime)
                            .string_len(5)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BlockedTimeSlots::Reason).text().null())
                    .col(ColumnDef::new(BlockedTimeSlots::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(BlockedTimeSlots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BlockedTimeSlots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 日付範囲検索用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_blocked_time_slots_range")
                    .table(BlockedTimeSlots::Table)
                    .col(BlockedTimeSlots::StartDate)
                    .col(BlockedTimeSlots::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlockedTimeSlots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BlockedTimeSlots {
    Table,
    Id,
    StartDate,
    EndDate,
    StartTime,
    EndTime,
    Reason,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
