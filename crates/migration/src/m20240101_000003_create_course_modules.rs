//! Create `course_modules` table (host-owned).
//! `module` holds the activity type (e.g. `page`, `forum`), `name` the activity title.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CourseModules::Table)
                    .if_not_exists()
                    .col(big_integer(CourseModules::Id).auto_increment().primary_key())
                    .col(big_integer(CourseModules::Course).not_null())
                    .col(string_len(CourseModules::Module, 64).not_null())
                    .col(string_len(CourseModules::Name, 255).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CourseModules::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CourseModules { Table, Id, Course, Module, Name }
