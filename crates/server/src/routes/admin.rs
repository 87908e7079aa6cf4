use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use common::types::Notice;
use models::extended_info::VarMap;
use models::InstanceKind;
use serde::{Deserialize, Serialize};
use service::errors::ServiceError;
use service::extended_info::{InfoRecord, SaveOutcome, VarSubmission};
use service::listing::{list_targets, ListingPage, ListingQuery, SortColumn, SortDir};
use service::pagination::Pagination;
use service::reconcile::ReconcileReport;
use service::routing::{check_filters, check_listing_kind, check_target};
use tracing::info;

use super::extended_info::parse_id;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Category filter for course listings.
    pub catid: Option<String>,
    /// Course filter for module listings.
    pub cid: Option<String>,
    /// `id` or `name`.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub dir: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn opt_id(raw: Option<&str>, name: &'static str) -> Result<Option<i64>, JsonApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| JsonApiError::bad_param(name)),
    }
}

#[utoipa::path(
    get, path = "/admin/extended-info/{instance}", tag = "admin",
    params(("instance" = String, Path, description = "category, course or module"), ListParams),
    responses(
        (status = 200, description = "Entities with extended info flags", body = crate::openapi::ListingPageDoc),
        (status = 400, description = "Invalid parameter"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Filter entity does not exist")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Query(p): Query<ListParams>,
) -> Result<Json<ListingPage>, JsonApiError> {
    let kind = check_listing_kind(&instance)?;
    let catid = opt_id(p.catid.as_deref(), "catid")?;
    let cid = opt_id(p.cid.as_deref(), "cid")?;
    check_filters(state.directory.as_ref(), catid, cid).await?;

    let defaults = Pagination::default();
    let query = ListingQuery {
        catid,
        cid,
        sort: p.sort.as_deref().map(str::parse::<SortColumn>).transpose().map_err(|_| JsonApiError::bad_param("sort"))?.unwrap_or_default(),
        dir: p.dir.as_deref().map(str::parse::<SortDir>).transpose().map_err(|_| JsonApiError::bad_param("dir"))?.unwrap_or_default(),
        pagination: Pagination { page: p.page.unwrap_or(defaults.page), per_page: p.per_page.unwrap_or(defaults.per_page) },
    };
    let page = list_targets(state.directory.as_ref(), state.repo.as_ref(), kind, &query).await?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct StoredVars {
    pub instance: InstanceKind,
    pub context_instance_id: i64,
    pub exists: bool,
    pub vars: VarMap,
}

#[utoipa::path(
    get, path = "/admin/extended-info/{instance}/{id}", tag = "admin",
    params(("instance" = String, Path,), ("id" = i64, Path,)),
    responses(
        (status = 200, description = "Stored variables with placeholders unexpanded"),
        (status = 400, description = "Invalid parameter"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Target entity does not exist")
    )
)]
pub async fn load(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
) -> Result<Json<StoredVars>, JsonApiError> {
    let id = parse_id(&id)?;
    let kind = check_target(state.directory.as_ref(), &instance, id).await?;
    let stored = state.service.load_raw(kind, id).await?;
    Ok(Json(StoredVars { instance: kind, context_instance_id: id, exists: stored.is_some(), vars: stored.unwrap_or_default() }))
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub vars: Vec<VarSubmission>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<InfoRecord>,
}

#[utoipa::path(
    put, path = "/admin/extended-info/{instance}/{id}", tag = "admin",
    params(("instance" = String, Path,), ("id" = i64, Path,)),
    request_body = crate::openapi::SaveRequestDoc,
    responses(
        (status = 200, description = "Saved, or removed when no variables remain"),
        (status = 400, description = "Invalid parameter"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Target entity does not exist"),
        (status = 422, description = "Invalid or duplicate variable names")
    )
)]
pub async fn save(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, JsonApiError> {
    let id = parse_id(&id)?;
    let kind = check_target(state.directory.as_ref(), &instance, id).await?;
    let resp = match state.service.save(kind, id, &req.vars).await? {
        SaveOutcome::Saved(rec) => SaveResponse { status: "saved", notice: Notice::success("Changes saved"), record: Some(rec) },
        SaveOutcome::Deleted { existed } => {
            info!(instance = %kind, context_instance_id = id, existed, "all variables removed");
            SaveResponse { status: "deleted", notice: Notice::success("Extended info removed"), record: None }
        }
    };
    Ok(Json(resp))
}

#[utoipa::path(
    delete, path = "/admin/extended-info/{instance}/{id}", tag = "admin",
    params(("instance" = String, Path,), ("id" = i64, Path,)),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid parameter"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "No extended info stored")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
) -> Result<StatusCode, JsonApiError> {
    let id = parse_id(&id)?;
    // orphans are deletable, so the target entity is not required to exist
    let kind: InstanceKind = instance.parse().map_err(|_| JsonApiError::bad_param("instance"))?;
    kind.validate_context_instance_id(id).map_err(|_| JsonApiError::bad_param("contextinstanceid"))?;
    if state.service.delete(kind, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::no_info(kind, id).into())
    }
}

#[utoipa::path(
    post, path = "/admin/reconcile", tag = "admin",
    responses(
        (status = 200, description = "Pass report", body = crate::openapi::ReconcileReportDoc),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 500, description = "Pass failed")
    )
)]
pub async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileReport>, JsonApiError> {
    let report = state.reconcile.run_once().await?;
    Ok(Json(report))
}
