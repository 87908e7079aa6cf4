use async_trait::async_trait;
use models::InstanceKind;
use uuid::Uuid;

use super::domain::InfoRecord;
use crate::errors::ServiceError;

/// Persistence of extended info records, one per (instance, context_instance_id).
#[async_trait]
pub trait ExtendedInfoRepository: Send + Sync {
    async fn find(&self, instance: InstanceKind, context_instance_id: i64) -> Result<Option<InfoRecord>, ServiceError>;
    async fn upsert(&self, instance: InstanceKind, context_instance_id: i64, vars_json: &str) -> Result<InfoRecord, ServiceError>;
    async fn delete(&self, instance: InstanceKind, context_instance_id: i64) -> Result<bool, ServiceError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn list_by_instance(&self, instance: InstanceKind) -> Result<Vec<InfoRecord>, ServiceError>;
    async fn list_all(&self) -> Result<Vec<InfoRecord>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockExtendedInfoRepository {
        records: Mutex<BTreeMap<(InstanceKind, i64), InfoRecord>>,
        failing: AtomicBool,
        finds: AtomicUsize,
        scans: AtomicUsize,
    }

    impl MockExtendedInfoRepository {
        /// Make every subsequent call fail with a database error.
        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        /// Number of `find` calls served so far.
        pub fn find_calls(&self) -> usize { self.finds.load(Ordering::SeqCst) }

        /// Number of `list_all` calls served so far.
        pub fn scan_calls(&self) -> usize { self.scans.load(Ordering::SeqCst) }

        pub fn len(&self) -> usize { self.records.lock().unwrap().len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }

        /// Store a blob verbatim, bypassing validation.
        pub fn insert_raw(&self, instance: InstanceKind, context_instance_id: i64, vars_json: &str) -> InfoRecord {
            let rec = InfoRecord {
                id: Uuid::new_v4(),
                instance,
                context_instance_id,
                vars: vars_json.to_string(),
                updated_at: chrono::Utc::now(),
            };
            self.records.lock().unwrap().insert((instance, context_instance_id), rec.clone());
            rec
        }

        pub fn stored(&self, instance: InstanceKind, context_instance_id: i64) -> Option<String> {
            self.records.lock().unwrap().get(&(instance, context_instance_id)).map(|r| r.vars.clone())
        }

        fn check(&self) -> Result<(), ServiceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Db("mock repository unavailable".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ExtendedInfoRepository for MockExtendedInfoRepository {
        async fn find(&self, instance: InstanceKind, context_instance_id: i64) -> Result<Option<InfoRecord>, ServiceError> {
            self.check()?;
            self.finds.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.lock().unwrap().get(&(instance, context_instance_id)).cloned())
        }

        async fn upsert(&self, instance: InstanceKind, context_instance_id: i64, vars_json: &str) -> Result<InfoRecord, ServiceError> {
            self.check()?;
            let mut records = self.records.lock().unwrap();
            let rec = records
                .entry((instance, context_instance_id))
                .and_modify(|r| {
                    r.vars = vars_json.to_string();
                    r.updated_at = chrono::Utc::now();
                })
                .or_insert_with(|| InfoRecord {
                    id: Uuid::new_v4(),
                    instance,
                    context_instance_id,
                    vars: vars_json.to_string(),
                    updated_at: chrono::Utc::now(),
                });
            Ok(rec.clone())
        }

        async fn delete(&self, instance: InstanceKind, context_instance_id: i64) -> Result<bool, ServiceError> {
            self.check()?;
            Ok(self.records.lock().unwrap().remove(&(instance, context_instance_id)).is_some())
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError> {
            self.check()?;
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|_, r| r.id != id);
            Ok(records.len() < before)
        }

        async fn list_by_instance(&self, instance: InstanceKind) -> Result<Vec<InfoRecord>, ServiceError> {
            self.check()?;
            let records = self.records.lock().unwrap();
            Ok(records.values().filter(|r| r.instance == instance).cloned().collect())
        }

        async fn list_all(&self) -> Result<Vec<InfoRecord>, ServiceError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }
    }
}
