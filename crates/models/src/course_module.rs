use std::collections::HashSet;

use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Host course-module (activity) row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_modules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course: i64,
    /// Activity type, e.g. `page` or `forum`.
    pub module: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, course: i64, module: &str, name: &str) -> Result<Model, errors::ModelError> {
    if module.trim().is_empty() { return Err(errors::ModelError::Validation("module type required".into())); }
    let am = ActiveModel {
        course: Set(course),
        module: Set(module.to_string()),
        name: Set(name.to_string()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn existing_ids(db: &DatabaseConnection, ids: &[i64]) -> Result<HashSet<i64>, errors::ModelError> {
    if ids.is_empty() { return Ok(HashSet::new()); }
    let found: Vec<i64> = Entity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(found.into_iter().collect())
}

pub async fn list(db: &DatabaseConnection, course: Option<i64>) -> Result<Vec<Model>, errors::ModelError> {
    let mut select = Entity::find();
    if let Some(c) = course { select = select.filter(Column::Course.eq(c)); }
    select.all(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
