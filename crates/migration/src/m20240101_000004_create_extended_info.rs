//! Create `extended_info` table.
//! One row per (instance, context_instance_id); `vars` holds the JSON object text.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExtendedInfo::Table)
                    .if_not_exists()
                    .col(uuid(ExtendedInfo::Id).primary_key())
                    .col(string_len(ExtendedInfo::Instance, 16).not_null())
                    .col(big_integer(ExtendedInfo::ContextInstanceId).not_null())
                    .col(text(ExtendedInfo::Vars).not_null())
                    .col(timestamp_with_time_zone(ExtendedInfo::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ExtendedInfo::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        // At most one record per target
        manager
            .create_index(
                Index::create()
                    .name("uniq_extended_info_target")
                    .table(ExtendedInfo::Table)
                    .col(ExtendedInfo::Instance)
                    .col(ExtendedInfo::ContextInstanceId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ExtendedInfo::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ExtendedInfo {
    Table,
    Id,
    Instance,
    ContextInstanceId,
    Vars,
    CreatedAt,
    UpdatedAt,
}
