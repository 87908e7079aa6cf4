//! Extended info store: validation, persistence, caching and rendering of per-target variables.

pub mod cache;
pub mod domain;
pub mod format;
pub mod placeholders;
pub mod repo;
pub mod repository;
pub mod service;

pub use domain::{cache_key, InfoRecord, OutputFormat, SaveOutcome, VarSubmission};
pub use service::ExtendedInfoService;
