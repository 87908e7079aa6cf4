use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::job::ReconcileJob;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(24 * 60 * 60), run_on_startup: false }
    }
}

impl From<&configs::ReconcileConfig> for SchedulerConfig {
    fn from(cfg: &configs::ReconcileConfig) -> Self {
        Self { interval: Duration::from_secs(cfg.interval_secs), run_on_startup: cfg.run_on_startup }
    }
}

/// Background task running one reconciliation pass per tick.
pub struct ReconcileScheduler {
    task: JoinHandle<()>,
}

impl ReconcileScheduler {
    pub fn start(job: Arc<ReconcileJob>, config: SchedulerConfig) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !config.run_on_startup {
                // the first tick completes immediately
                ticker.tick().await;
            }
            info!(interval_secs = config.interval.as_secs(), "reconcile scheduler started");
            loop {
                ticker.tick().await;
                match job.run_once().await {
                    Ok(report) => info!(scanned = report.scanned, removed = report.removed.len(), "scheduled reconciliation done"),
                    Err(e) => error!(error = %e, "scheduled reconciliation failed; retrying next tick"),
                }
            }
        });
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::mock::MockEntityDirectory;
    use crate::extended_info::cache::MokaInfoCache;
    use crate::extended_info::repository::mock::MockExtendedInfoRepository;
    use models::InstanceKind;

    fn job(repo: Arc<MockExtendedInfoRepository>) -> Arc<ReconcileJob> {
        Arc::new(ReconcileJob::new(repo, Arc::new(MockEntityDirectory::default()), Arc::new(MokaInfoCache::new(10, None))))
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn runs_on_startup_then_every_interval() {
        let repo = Arc::new(MockExtendedInfoRepository::default());
        repo.insert_raw(InstanceKind::Course, 5, "{}");
        let _sched = ReconcileScheduler::start(job(repo.clone()), SchedulerConfig { interval: MINUTE, run_on_startup: true });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(repo.scan_calls(), 1);
        assert!(repo.is_empty());

        tokio::time::sleep(MINUTE).await;
        assert_eq!(repo.scan_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_one_interval_without_startup_run() {
        let repo = Arc::new(MockExtendedInfoRepository::default());
        let _sched = ReconcileScheduler::start(job(repo.clone()), SchedulerConfig { interval: MINUTE, run_on_startup: false });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(repo.scan_calls(), 0);
        tokio::time::sleep(MINUTE).await;
        assert_eq!(repo.scan_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pass_is_retried_next_tick() {
        let repo = Arc::new(MockExtendedInfoRepository::default());
        repo.set_failing(true);
        let sched = ReconcileScheduler::start(job(repo.clone()), SchedulerConfig { interval: MINUTE, run_on_startup: true });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(repo.scan_calls(), 1);
        assert!(!sched.is_finished());

        repo.set_failing(false);
        tokio::time::sleep(MINUTE).await;
        assert_eq!(repo.scan_calls(), 2);
    }
}
