use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use models::extended_info::VarMap;
use models::InstanceKind;
use serde::{Deserialize, Serialize};
use service::extended_info::OutputFormat;
use service::page::{settings_button as render_button, PageContext};
use service::errors::ServiceError;
use tracing::debug;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormatQuery {
    /// Output format name or code: raw (-1), auto (0), html (1), plain (2), wiki (3), markdown (4).
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub instance: InstanceKind,
    pub context_instance_id: i64,
    pub format: OutputFormat,
    pub vars: VarMap,
}

pub(crate) fn parse_id(raw: &str) -> Result<i64, JsonApiError> {
    raw.trim().parse().map_err(|_| JsonApiError::bad_param("contextinstanceid"))
}

#[utoipa::path(
    get, path = "/extended-info/{instance}/{id}", tag = "extended-info",
    params(
        ("instance" = String, Path, description = "category, course, module or dashboard"),
        ("id" = i64, Path, description = "Context instance id, -1 for none"),
        FormatQuery
    ),
    responses(
        (status = 200, description = "Rendered variables", body = crate::openapi::InfoResponseDoc),
        (status = 400, description = "Invalid parameter"),
        (status = 404, description = "No extended info stored for the target")
    )
)]
pub async fn get_info(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
    Query(q): Query<FormatQuery>,
) -> Result<Json<InfoResponse>, JsonApiError> {
    let id = parse_id(&id)?;
    let format = match q.format.as_deref() {
        None | Some("") => OutputFormat::default(),
        Some(f) => f.parse().map_err(|_| JsonApiError::bad_param("format"))?,
    };
    let kind: InstanceKind = instance.parse().map_err(|_| JsonApiError::bad_param("instance"))?;
    kind.validate_context_instance_id(id).map_err(|_| JsonApiError::bad_param("contextinstanceid"))?;
    let vars = state.service.get(kind, id, format).await?.ok_or_else(|| ServiceError::no_info(kind, id))?;
    debug!(instance = %kind, context_instance_id = id, vars = vars.len(), "extended info served");
    Ok(Json(InfoResponse { instance: kind, context_instance_id: id, format, vars }))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ButtonQuery {
    pub layout: String,
    pub category_id: Option<i64>,
    pub course_id: Option<i64>,
    pub cm_id: Option<i64>,
    pub url: Option<String>,
    #[serde(default)]
    pub site_admin: bool,
}

#[utoipa::path(
    get, path = "/settings-button", tag = "extended-info",
    params(ButtonQuery),
    responses((status = 200, description = "Button HTML, empty when the page has no target", content_type = "text/html"))
)]
pub async fn settings_button(State(state): State<AppState>, Query(q): Query<ButtonQuery>) -> Result<Html<String>, JsonApiError> {
    let page = PageContext {
        layout: q.layout.as_str().into(),
        category_id: q.category_id,
        course_id: q.course_id,
        cm_id: q.cm_id,
        url: q.url.unwrap_or_else(|| state.wwwroot.to_string()),
        is_site_admin: q.site_admin,
    };
    let html = render_button(&page, &state.wwwroot).map_err(|e| {
        JsonApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Bad Site Root", Some(e.to_string()))
    })?;
    Ok(Html(html))
}
