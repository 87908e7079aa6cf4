use thiserror::Error;

use crate::extended_info::domain::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("stored vars are not valid json: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    /// No record is stored for the target.
    pub fn no_info(kind: models::InstanceKind, id: i64) -> Self { Self::NotFound(format!("no extended info for {kind}/{id}")) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::InvalidTarget(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Decode(_) => 1101,
            ServiceError::Db(_) => 1200,
            ServiceError::Model(_) => 1201,
        }
    }
}
