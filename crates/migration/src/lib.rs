//! Migrator registering the host entity tables, the extended info table,
//! and secondary indexes, in dependency order. Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_course_categories;
mod m20240101_000002_create_course;
mod m20240101_000003_create_course_modules;
mod m20240101_000004_create_extended_info;
mod m20240101_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_course_categories::Migration),
            Box::new(m20240101_000002_create_course::Migration),
            Box::new(m20240101_000003_create_course_modules::Migration),
            Box::new(m20240101_000004_create_extended_info::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000005_add_indexes::Migration),
        ]
    }
}
