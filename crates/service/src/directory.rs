//! Lookups against the host's entity tables (categories, courses, course modules).

use std::collections::HashSet;

use async_trait::async_trait;
use models::{course, course_category, course_module, InstanceKind};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::errors::ServiceError;

/// One live host entity, as shown in management listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
    /// Parent category of a category or course, course of a module.
    pub parent: i64,
    /// Activity type of a module.
    pub module: Option<String>,
}

#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Subset of `ids` that exist for `kind`. Dashboard targets have no table and always exist.
    async fn existing_ids(&self, kind: InstanceKind, ids: &[i64]) -> Result<HashSet<i64>, ServiceError>;

    async fn exists(&self, kind: InstanceKind, id: i64) -> Result<bool, ServiceError> {
        Ok(self.existing_ids(kind, &[id]).await?.contains(&id))
    }

    /// Live entities of `kind`, optionally restricted to a parent category (courses) or course (modules).
    async fn list(&self, kind: InstanceKind, parent: Option<i64>) -> Result<Vec<EntitySummary>, ServiceError>;
}

pub struct SeaOrmEntityDirectory {
    pub db: DatabaseConnection,
}

#[async_trait]
impl EntityDirectory for SeaOrmEntityDirectory {
    async fn existing_ids(&self, kind: InstanceKind, ids: &[i64]) -> Result<HashSet<i64>, ServiceError> {
        let found = match kind {
            InstanceKind::Category => course_category::existing_ids(&self.db, ids).await?,
            InstanceKind::Course => course::existing_ids(&self.db, ids).await?,
            InstanceKind::Module => course_module::existing_ids(&self.db, ids).await?,
            InstanceKind::Dashboard => ids.iter().copied().collect(),
        };
        Ok(found)
    }

    async fn list(&self, kind: InstanceKind, parent: Option<i64>) -> Result<Vec<EntitySummary>, ServiceError> {
        let rows: Vec<EntitySummary> = match kind {
            InstanceKind::Category => course_category::list(&self.db)
                .await?
                .into_iter()
                .filter(|c| parent.map_or(true, |p| c.parent == p))
                .map(|c| EntitySummary { id: c.id, name: c.name, parent: c.parent, module: None })
                .collect(),
            InstanceKind::Course => course::list(&self.db, parent)
                .await?
                .into_iter()
                .map(|c| EntitySummary { id: c.id, name: c.fullname, parent: c.category, module: None })
                .collect(),
            InstanceKind::Module => course_module::list(&self.db, parent)
                .await?
                .into_iter()
                .map(|m| EntitySummary { id: m.id, name: m.name, parent: m.course, module: Some(m.module) })
                .collect(),
            InstanceKind::Dashboard => {
                return Err(ServiceError::InvalidTarget("dashboard targets cannot be listed".into()))
            }
        };
        Ok(rows)
    }
}

/// In-memory directory for tests
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockEntityDirectory {
        entities: Mutex<BTreeMap<(InstanceKind, i64), EntitySummary>>,
        failing: AtomicBool,
        batches: Mutex<Vec<usize>>,
    }

    impl MockEntityDirectory {
        pub fn add_category(&self, id: i64, name: &str) -> &Self {
            self.insert(InstanceKind::Category, EntitySummary { id, name: name.into(), parent: 0, module: None })
        }

        pub fn add_course(&self, id: i64, category: i64, name: &str) -> &Self {
            self.insert(InstanceKind::Course, EntitySummary { id, name: name.into(), parent: category, module: None })
        }

        pub fn add_module(&self, id: i64, course: i64, module: &str, name: &str) -> &Self {
            self.insert(
                InstanceKind::Module,
                EntitySummary { id, name: name.into(), parent: course, module: Some(module.into()) },
            )
        }

        /// Simulate the host deleting an entity.
        pub fn remove(&self, kind: InstanceKind, id: i64) {
            self.entities.lock().unwrap().remove(&(kind, id));
        }

        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        /// Number of ids passed to each `existing_ids` call, in call order.
        pub fn lookup_batches(&self) -> Vec<usize> { self.batches.lock().unwrap().clone() }

        fn insert(&self, kind: InstanceKind, e: EntitySummary) -> &Self {
            self.entities.lock().unwrap().insert((kind, e.id), e);
            self
        }

        fn check(&self) -> Result<(), ServiceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Db("mock directory unavailable".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntityDirectory for MockEntityDirectory {
        async fn existing_ids(&self, kind: InstanceKind, ids: &[i64]) -> Result<HashSet<i64>, ServiceError> {
            self.batches.lock().unwrap().push(ids.len());
            self.check()?;
            if kind == InstanceKind::Dashboard {
                return Ok(ids.iter().copied().collect());
            }
            let entities = self.entities.lock().unwrap();
            Ok(ids.iter().copied().filter(|id| entities.contains_key(&(kind, *id))).collect())
        }

        async fn list(&self, kind: InstanceKind, parent: Option<i64>) -> Result<Vec<EntitySummary>, ServiceError> {
            self.check()?;
            if kind == InstanceKind::Dashboard {
                return Err(ServiceError::InvalidTarget("dashboard targets cannot be listed".into()));
            }
            let entities = self.entities.lock().unwrap();
            Ok(entities
                .iter()
                .filter(|((k, _), e)| *k == kind && parent.map_or(true, |p| e.parent == p))
                .map(|(_, e)| e.clone())
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockEntityDirectory;
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn mock_existence_and_listing() {
        let dir = MockEntityDirectory::default();
        dir.add_category(1, "Science").add_course(5, 1, "Physics").add_course(6, 2, "Art").add_module(9, 5, "page", "Intro");

        assert!(dir.exists(InstanceKind::Course, 5).await.unwrap());
        assert!(!dir.exists(InstanceKind::Module, 5).await.unwrap());
        assert!(dir.exists(InstanceKind::Dashboard, -1).await.unwrap());

        let found = dir.existing_ids(InstanceKind::Course, &[5, 6, 7]).await.unwrap();
        assert_eq!(found, HashSet::from([5, 6]));

        let in_cat = dir.list(InstanceKind::Course, Some(1)).await.unwrap();
        assert_eq!(in_cat.iter().map(|e| e.id).collect::<Vec<_>>(), vec![5]);
        assert!(dir.list(InstanceKind::Dashboard, None).await.is_err());

        dir.remove(InstanceKind::Course, 5);
        assert!(!dir.exists(InstanceKind::Course, 5).await.unwrap());
    }

    #[tokio::test]
    async fn seaorm_directory_batches_existence() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let dir = SeaOrmEntityDirectory { db };
        let cat = course_category::create(&dir.db, "Dir Category").await?;
        let crs = course::create(&dir.db, cat.id, "Dir Course").await?;
        let cm = course_module::create(&dir.db, crs.id, "forum", "News").await?;

        let found = dir.existing_ids(InstanceKind::Course, &[crs.id, i64::MAX]).await?;
        assert_eq!(found, HashSet::from([crs.id]));
        assert!(dir.exists(InstanceKind::Module, cm.id).await?);

        let modules = dir.list(InstanceKind::Module, Some(crs.id)).await?;
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].module.as_deref(), Some("forum"));
        Ok(())
    }
}
