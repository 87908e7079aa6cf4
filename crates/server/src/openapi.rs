use std::collections::BTreeMap;

use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct InfoResponseDoc {
    pub instance: String,
    pub context_instance_id: i64,
    pub format: String,
    pub vars: BTreeMap<String, String>,
}

#[derive(ToSchema)]
pub struct VarSubmissionDoc {
    pub name: String,
    pub value: String,
    pub delete: bool,
}

#[derive(ToSchema)]
pub struct SaveRequestDoc { pub vars: Vec<VarSubmissionDoc> }

#[derive(ToSchema)]
pub struct ListingRowDoc {
    pub id: i64,
    pub name: String,
    pub module: Option<String>,
    pub has_info: bool,
}

#[derive(ToSchema)]
pub struct ListingPageDoc {
    pub rows: Vec<ListingRowDoc>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

#[derive(ToSchema)]
pub struct RemovedRecordDoc {
    pub id: Uuid,
    pub instance: String,
    pub context_instance_id: i64,
    pub cache_key: String,
}

#[derive(ToSchema)]
pub struct ReconcileReportDoc {
    pub scanned: usize,
    pub skipped: usize,
    pub removed: Vec<RemovedRecordDoc>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::extended_info::get_info,
        crate::routes::extended_info::settings_button,
        crate::routes::admin::list,
        crate::routes::admin::load,
        crate::routes::admin::save,
        crate::routes::admin::delete,
        crate::routes::admin::reconcile,
    ),
    components(
        schemas(
            HealthResponse,
            InfoResponseDoc,
            VarSubmissionDoc,
            SaveRequestDoc,
            ListingRowDoc,
            ListingPageDoc,
            RemovedRecordDoc,
            ReconcileReportDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "extended-info"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
