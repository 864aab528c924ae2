//! Initial schema.
//!
//! - `users`: authentication
//! - `categories`: labels owned by a user, unique by name per user
//! - `expenses`: payments owned by a user, with an optional category and
//!   receipt attachment

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Icon,
    Color,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    UserId,
    Amount,
    Currency,
    CategoryId,
    Date,
    Description,
    AttachmentUrl,
    AttachmentName,
    AttachmentType,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::UserId).string().not_null())
                    .col(ColumnDef::new(Expenses::Amount).double().not_null())
                    .col(ColumnDef::new(Expenses::Currency).string().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).uuid())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(ColumnDef::new(Expenses::Description).string())
                    .col(ColumnDef::new(Expenses::AttachmentUrl).string())
                    .col(ColumnDef::new(Expenses::AttachmentName).string())
                    .col(ColumnDef::new(Expenses::AttachmentType).string())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-user_id")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-user_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-category_id")
                    .table(Expenses::Table)
                    .col(Expenses::CategoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
