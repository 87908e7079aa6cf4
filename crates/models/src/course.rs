use std::collections::HashSet;

use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Host course row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category: i64,
    pub fullname: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

/// The site course lives in category 0 and is never listed.
pub const SITE_CATEGORY: i64 = 0;

pub async fn create(db: &DatabaseConnection, category: i64, fullname: &str) -> Result<Model, errors::ModelError> {
    if fullname.trim().is_empty() { return Err(errors::ModelError::Validation("fullname required".into())); }
    let am = ActiveModel { category: Set(category), fullname: Set(fullname.to_string()), ..Default::default() };
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

/// Courses, optionally restricted to one category. The site course is excluded.
pub async fn list(db: &DatabaseConnection, category: Option<i64>) -> Result<Vec<Model>, errors::ModelError> {
    let mut select = Entity::find().filter(Column::Category.ne(SITE_CATEGORY));
    if let Some(c) = category { select = select.filter(Column::Category.eq(c)); }
    select.all(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
