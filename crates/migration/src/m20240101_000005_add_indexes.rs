use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Course: listing filtered by category
        manager
            .create_index(
                Index::create()
                    .name("idx_course_category")
                    .table(Course::Table)
                    .col(Course::Category)
                    .to_owned(),
            )
            .await?;

        // CourseModules: listing filtered by course
        manager
            .create_index(
                Index::create()
                    .name("idx_course_modules_course")
                    .table(CourseModules::Table)
                    .col(CourseModules::Course)
                    .to_owned(),
            )
            .await?;

        // ExtendedInfo: reconciliation and listing scan by instance
        manager
            .create_index(
                Index::create()
                    .name("idx_extended_info_instance")
                    .table(ExtendedInfo::Table)
                    .col(ExtendedInfo::Instance)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_course_category").table(Course::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_course_modules_course").table(CourseModules::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_extended_info_instance").table(ExtendedInfo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Course { Table, Category }

#[derive(DeriveIden)]
enum CourseModules { Table, Course }

#[derive(DeriveIden)]
enum ExtendedInfo { Table, Instance }
