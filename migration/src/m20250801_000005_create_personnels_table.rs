use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Personnels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Personnels::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Personnels::UserId).uuid().null())
                    .col(
                        ColumnDef::new(Personnels::FirstName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Personnels::LastName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Personnels::Position)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Personnels::Specialization)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(Personnels::Email).string_len(255).null())
                    .col(ColumnDef::new(Personnels::Phone).string_len(30).null())
                    .col(
                        ColumnDef::new(Personnels::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Personnels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Personnels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personnels_user_id")
                            .from(Personnels::Table, Personnels::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_personnels_position")
                    .table(Personnels::Table)
                    .col(Personnels::Position)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Personnels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Personnels {
    Table,
    Id,
    UserId,
    FirstName,
    LastName,
    Position,
    Specialization,
    Email,
    Phone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
