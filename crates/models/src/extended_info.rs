use std::collections::BTreeMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::instance::InstanceKind;

/// Variables of one target, keyed by name. Iteration (and JSON encoding) is sorted by key.
pub type VarMap = BTreeMap<String, String>;

static VAR_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.\-]+$").expect("static var name pattern"));

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extended_info")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub instance: String,
    pub context_instance_id: i64,
    #[sea_orm(column_type = "Text")]
    pub vars: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Result<InstanceKind, errors::ModelError> {
        self.instance.parse()
    }
}

/// Variable names are non-empty and limited to letters, digits, `.` and `-`.
pub fn validate_var_name(name: &str) -> Result<(), errors::ModelError> {
    if !VAR_NAME.is_match(name) {
        return Err(errors::ModelError::Validation(format!("invalid variable name `{name}`")));
    }
    Ok(())
}

pub fn encode_vars(vars: &VarMap) -> Result<String, errors::ModelError> {
    serde_json::to_string(vars).map_err(|e| errors::ModelError::Json(e.to_string()))
}

pub fn decode_vars(json: &str) -> Result<VarMap, errors::ModelError> {
    serde_json::from_str(json).map_err(|e| errors::ModelError::Json(e.to_string()))
}

pub async fn find_by_target(
    db: &DatabaseConnection,
    instance: InstanceKind,
    context_instance_id: i64,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Instance.eq(instance.as_str()))
        .filter(Column::ContextInstanceId.eq(context_instance_id))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Insert or replace the vars of a target. Concurrent writers resolve to the last one.
pub async fn upsert(
    db: &DatabaseConnection,
    instance: InstanceKind,
    context_instance_id: i64,
    vars_json: &str,
) -> Result<Model, errors::ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        instance: Set(instance.as_str().to_string()),
        context_instance_id: Set(context_instance_id),
        vars: Set(vars_json.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Entity::insert(am)
        .on_conflict(
            OnConflict::columns([Column::Instance, Column::ContextInstanceId])
                .update_columns([Column::Vars, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;

    find_by_target(db, instance, context_instance_id)
        .await?
        .ok_or_else(|| errors::ModelError::Db("upserted extended_info row not found".into()))
}

/// Delete the record of a target; returns whether a row existed.
pub async fn delete_by_target(
    db: &DatabaseConnection,
    instance: InstanceKind,
    context_instance_id: i64,
) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Instance.eq(instance.as_str()))
        .filter(Column::ContextInstanceId.eq(context_instance_id))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

pub async fn list_by_instance(db: &DatabaseConnection, instance: InstanceKind) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Instance.eq(instance.as_str()))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find().all(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_name_pattern() {
        for ok in ["color", "Color-2", "a.b.c", "0", "x-y.z"] {
            assert!(validate_var_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "has space", "under_score", "tab\t", "ünï", "[[wwwroot]]", "a/b"] {
            assert!(validate_var_name(bad).is_err(), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn encoding_sorts_keys() {
        let mut vars = VarMap::new();
        vars.insert("zeta".into(), "1".into());
        vars.insert("alpha".into(), "2".into());
        vars.insert("Mid".into(), "3".into());
        assert_eq!(encode_vars(&vars).unwrap(), r#"{"Mid":"3","alpha":"2","zeta":"1"}"#);
    }

    #[test]
    fn decode_then_encode_is_stable_for_sorted_input() {
        let json = r#"{"color":"[[wwwroot]]/blue","size":"<b>xl</b>"}"#;
        let vars = decode_vars(json).unwrap();
        assert_eq!(encode_vars(&vars).unwrap(), json);
    }

    #[test]
    fn decode_rejects_non_string_values() {
        assert!(decode_vars(r#"{"n":1}"#).is_err());
        assert!(decode_vars("[]").is_err());
        assert!(decode_vars("not json").is_err());
    }
}
