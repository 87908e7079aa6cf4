use std::sync::Arc;

use service::directory::EntityDirectory;
use service::extended_info::repository::ExtendedInfoRepository;
use service::extended_info::ExtendedInfoService;
use service::reconcile::ReconcileJob;

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExtendedInfoService>,
    pub repo: Arc<dyn ExtendedInfoRepository>,
    pub directory: Arc<dyn EntityDirectory>,
    pub reconcile: Arc<ReconcileJob>,
    /// Expected `X-Admin-Token`; admin routes refuse every request when unset.
    pub admin_token: Option<Arc<str>>,
    pub wwwroot: Arc<str>,
}
