use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use models::{InstanceKind, NO_INSTANCE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::directory::EntityDirectory;
use crate::errors::ServiceError;
use crate::extended_info::cache::InfoCache;
use crate::extended_info::domain::InfoRecord;
use crate::extended_info::repository::ExtendedInfoRepository;
use crate::metrics;

/// Ids per existence query. Keeps `IN (...)` lists well below the Postgres bind limit.
pub const EXISTENCE_BATCH: usize = 1000;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("reconciliation failed while {stage}: {source}")]
    Failed {
        stage: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl ReconcileError {
    fn at(stage: &'static str) -> impl FnOnce(ServiceError) -> Self {
        move |source| Self::Failed { stage, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedRecord {
    pub id: Uuid,
    pub instance: InstanceKind,
    pub context_instance_id: i64,
    pub cache_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Records examined.
    pub scanned: usize,
    /// Records exempt from checking: id `-1` or dashboard.
    pub skipped: usize,
    pub removed: Vec<RemovedRecord>,
}

pub struct ReconcileJob {
    repo: Arc<dyn ExtendedInfoRepository>,
    directory: Arc<dyn EntityDirectory>,
    cache: Arc<dyn InfoCache>,
}

impl ReconcileJob {
    pub fn new(
        repo: Arc<dyn ExtendedInfoRepository>,
        directory: Arc<dyn EntityDirectory>,
        cache: Arc<dyn InfoCache>,
    ) -> Self {
        Self { repo, directory, cache }
    }

    /// One pass over every stored record. Deletions made before a failure are kept.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<ReconcileReport, ReconcileError> {
        let started = Instant::now();
        info!("extended info reconciliation BEGIN");
        let result = self.pass().await;
        metrics::RECONCILE_DURATION.observe(started.elapsed().as_secs_f64());
        match &result {
            Ok(report) => {
                metrics::RECONCILE_RUNS_TOTAL.inc();
                metrics::RECONCILE_REMOVED_TOTAL.inc_by(report.removed.len() as u64);
                if report.removed.is_empty() {
                    info!(scanned = report.scanned, "nothing to delete");
                }
                info!(scanned = report.scanned, removed = report.removed.len(), "extended info reconciliation END");
            }
            Err(_) => metrics::RECONCILE_FAILURES_TOTAL.inc(),
        }
        result
    }

    async fn pass(&self) -> Result<ReconcileReport, ReconcileError> {
        let records = self.repo.list_all().await.map_err(ReconcileError::at("listing records"))?;
        let mut report = ReconcileReport { scanned: records.len(), ..Default::default() };

        let mut by_kind: BTreeMap<InstanceKind, Vec<InfoRecord>> = BTreeMap::new();
        for rec in records {
            if rec.context_instance_id == NO_INSTANCE || !rec.instance.has_backing_table() {
                report.skipped += 1;
                continue;
            }
            by_kind.entry(rec.instance).or_default().push(rec);
        }

        for (kind, recs) in by_kind {
            let ids: Vec<i64> = recs.iter().map(|r| r.context_instance_id).collect();
            let mut live = HashSet::with_capacity(ids.len());
            for chunk in ids.chunks(EXISTENCE_BATCH) {
                let found = self
                    .directory
                    .existing_ids(kind, chunk)
                    .await
                    .map_err(ReconcileError::at("checking targets"))?;
                live.extend(found);
            }
            for rec in recs.into_iter().filter(|r| !live.contains(&r.context_instance_id)) {
                self.repo.delete_by_id(rec.id).await.map_err(ReconcileError::at("deleting records"))?;
                let key = rec.cache_key();
                self.cache.delete(&key).await;
                info!(id = %rec.id, instance = %kind, context_instance_id = rec.context_instance_id, "deleted orphaned extended info");
                info!(cache_key = %key, "invalidated cache entry");
                report.removed.push(RemovedRecord {
                    id: rec.id,
                    instance: kind,
                    context_instance_id: rec.context_instance_id,
                    cache_key: key,
                });
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::mock::MockEntityDirectory;
    use crate::extended_info::cache::MokaInfoCache;
    use crate::extended_info::repository::mock::MockExtendedInfoRepository;

    struct Fixture {
        repo: Arc<MockExtendedInfoRepository>,
        dir: Arc<MockEntityDirectory>,
        cache: Arc<MokaInfoCache>,
        job: ReconcileJob,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MockExtendedInfoRepository::default());
        let dir = Arc::new(MockEntityDirectory::default());
        let cache = Arc::new(MokaInfoCache::new(100, None));
        let job = ReconcileJob::new(repo.clone(), dir.clone(), cache.clone());
        Fixture { repo, dir, cache, job }
    }

    #[tokio::test]
    async fn removes_orphans_and_their_cache_entries() {
        let f = fixture();
        f.dir.add_course(5, 1, "Physics").add_module(9, 5, "page", "Intro");
        f.repo.insert_raw(InstanceKind::Course, 5, "{}");
        let gone = f.repo.insert_raw(InstanceKind::Course, 6, r#"{"a":"1"}"#);
        f.repo.insert_raw(InstanceKind::Module, 9, "{}");
        f.cache.set("course/6", r#"{"a":"1"}"#.into()).await;

        let report = f.job.run_once().await.unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].id, gone.id);
        assert_eq!(report.removed[0].cache_key, "course/6");
        assert_eq!(f.repo.len(), 2);
        assert_eq!(f.cache.get("course/6").await, None);
    }

    #[tokio::test]
    async fn never_removes_unset_or_dashboard_targets() {
        let f = fixture();
        f.repo.insert_raw(InstanceKind::Course, -1, "{}");
        f.repo.insert_raw(InstanceKind::Category, -1, "{}");
        f.repo.insert_raw(InstanceKind::Dashboard, -1, "{}");

        let report = f.job.run_once().await.unwrap();
        assert_eq!(report.skipped, 3);
        assert!(report.removed.is_empty());
        assert_eq!(f.repo.len(), 3);
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let f = fixture();
        f.repo.insert_raw(InstanceKind::Category, 4, "{}");
        assert_eq!(f.job.run_once().await.unwrap().removed.len(), 1);
        let again = f.job.run_once().await.unwrap();
        assert_eq!(again.scanned, 0);
        assert!(again.removed.is_empty());
    }

    #[tokio::test]
    async fn existence_checks_are_batched() {
        let f = fixture();
        for id in 1..=2500 {
            if id % 2 == 0 {
                f.dir.add_course(id, 1, "Course");
            }
            f.repo.insert_raw(InstanceKind::Course, id, "{}");
        }

        let report = f.job.run_once().await.unwrap();
        assert_eq!(f.dir.lookup_batches(), vec![1000, 1000, 500]);
        assert_eq!(report.removed.len(), 1250);
        assert!(report.removed.iter().all(|r| r.context_instance_id % 2 == 1));
        assert_eq!(f.repo.len(), 1250);
    }

    #[tokio::test]
    async fn directory_failure_aborts_pass() {
        let f = fixture();
        f.repo.insert_raw(InstanceKind::Course, 5, "{}");
        f.dir.set_failing(true);
        let err = f.job.run_once().await.unwrap_err();
        assert!(matches!(err, ReconcileError::Failed { stage: "checking targets", .. }));
        assert_eq!(f.repo.len(), 1);
    }
}
