//! Create `course_categories` table.
//!
//! Host-owned table; mirrored here so the service can run and be tested standalone.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CourseCategories::Table)
                    .if_not_exists()
                    .col(big_integer(CourseCategories::Id).auto_increment().primary_key())
                    .col(string_len(CourseCategories::Name, 255).not_null())
                    .col(big_integer(CourseCategories::Parent).not_null().default(0))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CourseCategories::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CourseCategories { Table, Id, Name, Parent }
