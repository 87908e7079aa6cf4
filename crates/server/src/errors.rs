use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::Notice;
use serde::Serialize;
use service::errors::ServiceError;
use service::extended_info::domain::FieldError;
use service::reconcile::ReconcileError;
use service::routing::RoutingError;
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error", "detail", "notice", "fields"}`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, error: error.into(), detail, notice: None, fields: Vec::new() }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn bad_param(name: &'static str) -> Self {
        RoutingError::InvalidParam(name).into()
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.error, detail = ?self.detail, "request failed");
        }
        (self.status, Json(self)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        match e {
            ServiceError::Validation(errs) => {
                let mut api = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", Some(errs.to_string()))
                    .with_notice(Notice::error("Please fix the highlighted variables."));
                api.fields = errs.fields;
                api
            }
            ServiceError::InvalidTarget(msg) => Self::new(StatusCode::BAD_REQUEST, "Invalid Target", Some(msg)),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some(format!("[{code}] {other}"))),
        }
    }
}

impl From<RoutingError> for JsonApiError {
    fn from(e: RoutingError) -> Self {
        let msg = e.to_string();
        match e {
            RoutingError::InvalidParam(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid Parameter", Some(msg.clone())).with_notice(Notice::error(msg))
            }
            RoutingError::InvalidInstance(_) => {
                Self::new(StatusCode::NOT_FOUND, "Invalid Instance", Some(msg.clone())).with_notice(Notice::error(msg))
            }
            RoutingError::Lookup(inner) => inner.into(),
        }
    }
}

impl From<ReconcileError> for JsonApiError {
    fn from(e: ReconcileError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Reconciliation Failed", Some(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::extended_info::domain::{FieldErrorKind, ValidationErrors};

    #[test]
    fn validation_maps_to_422_with_fields() {
        let mut errs = ValidationErrors::default();
        errs.push(FieldError::new(1, FieldErrorKind::Duplicate));
        let api: JsonApiError = ServiceError::Validation(errs).into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(&api).unwrap();
        assert_eq!(body["fields"][0]["field"], "varname-1");
        assert_eq!(body["fields"][0]["kind"], "duplicate");
    }

    #[test]
    fn routing_errors_carry_notice() {
        let api: JsonApiError = RoutingError::InvalidInstance("Course ID").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.notice.as_ref().map(|n| n.message.as_str()), Some("Invalid Course ID."));
        let api = JsonApiError::bad_param("format");
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.detail.as_deref(), Some("Invalid/missing URL query parameter: format"));
    }

    #[test]
    fn store_errors_are_500() {
        let api: JsonApiError = ServiceError::Db("down".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(serde_json::to_value(&api).unwrap().get("fields").is_none());
    }
}
