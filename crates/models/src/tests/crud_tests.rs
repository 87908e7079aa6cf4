use anyhow::Result;
use sea_orm::EntityTrait;

use super::setup_test_db;
use crate::extended_info::{self, VarMap};
use crate::{course, course_category, course_module, InstanceKind, NO_INSTANCE};

/// Upsert creates once, then replaces in place keeping the surrogate id
#[tokio::test]
async fn test_extended_info_upsert_and_delete() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let cat = course_category::create(&db, "Upsert Category").await?;
    let c = course::create(&db, cat.id, "Upsert Course").await?;

    let first = extended_info::upsert(&db, InstanceKind::Course, c.id, r#"{"a":"1"}"#).await?;
    let second = extended_info::upsert(&db, InstanceKind::Course, c.id, r#"{"a":"2","b":"3"}"#).await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.vars, r#"{"a":"2","b":"3"}"#);
    assert_eq!(second.kind()?, InstanceKind::Course);

    let found = extended_info::find_by_target(&db, InstanceKind::Course, c.id).await?.unwrap();
    assert_eq!(found.vars, second.vars);

    assert!(extended_info::delete_by_target(&db, InstanceKind::Course, c.id).await?);
    assert!(!extended_info::delete_by_target(&db, InstanceKind::Course, c.id).await?);
    assert!(extended_info::find_by_target(&db, InstanceKind::Course, c.id).await?.is_none());

    course::Entity::delete_by_id(c.id).exec(&db).await?;
    course_category::Entity::delete_by_id(cat.id).exec(&db).await?;
    Ok(())
}

/// Same id under different instance kinds are distinct targets
#[tokio::test]
async fn test_targets_are_scoped_by_instance() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let mut vars = VarMap::new();
    vars.insert("k".into(), "v".into());
    let json = extended_info::encode_vars(&vars)?;

    let dash = extended_info::upsert(&db, InstanceKind::Dashboard, NO_INSTANCE, &json).await?;
    let cat_index = extended_info::upsert(&db, InstanceKind::Category, NO_INSTANCE, &json).await?;
    assert_ne!(dash.id, cat_index.id);

    let dashboards = extended_info::list_by_instance(&db, InstanceKind::Dashboard).await?;
    assert!(dashboards.iter().any(|m| m.id == dash.id));
    assert!(dashboards.iter().all(|m| m.instance == "dashboard"));

    assert!(extended_info::delete_by_id(&db, dash.id).await?);
    assert!(extended_info::delete_by_id(&db, cat_index.id).await?);
    Ok(())
}

/// existing_ids only returns ids that are present
#[tokio::test]
async fn test_existing_ids_filters_missing() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let cat = course_category::create(&db, "Lookup Category").await?;
    let c = course::create(&db, cat.id, "Lookup Course").await?;
    let cm = course_module::create(&db, c.id, "page", "Lookup Page").await?;

    let missing = i64::MAX - 7;
    assert_eq!(course_category::existing_ids(&db, &[cat.id, missing]).await?.len(), 1);
    assert!(course::existing_ids(&db, &[c.id]).await?.contains(&c.id));
    assert!(course_module::existing_ids(&db, &[missing]).await?.is_empty());
    assert!(course_module::existing_ids(&db, &[]).await?.is_empty());

    let listed = course_module::list(&db, Some(c.id)).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].module, "page");

    course_module::Entity::delete_by_id(cm.id).exec(&db).await?;
    course::Entity::delete_by_id(c.id).exec(&db).await?;
    course_category::Entity::delete_by_id(cat.id).exec(&db).await?;
    Ok(())
}
