use std::collections::HashSet;
use std::sync::Arc;

use models::extended_info::{decode_vars, encode_vars, validate_var_name, VarMap};
use models::InstanceKind;
use tracing::{debug, info, instrument, warn};

use super::cache::InfoCache;
use super::domain::{cache_key, FieldError, FieldErrorKind, OutputFormat, SaveOutcome, ValidationErrors, VarSubmission};
use super::format::TextFormatter;
use super::placeholders::PlaceholderRegistry;
use super::repository::ExtendedInfoRepository;
use crate::errors::ServiceError;
use crate::metrics;

/// Check every submitted row and collect the surviving variables.
///
/// Rows flagged for deletion are validated too, then dropped from the result.
pub fn validate_submission(rows: &[VarSubmission]) -> Result<VarMap, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut seen = HashSet::new();
    let mut vars = VarMap::new();
    for (index, row) in rows.iter().enumerate() {
        let name = row.name.trim();
        if validate_var_name(name).is_err() {
            errors.push(FieldError::new(index, FieldErrorKind::InvalidName));
            continue;
        }
        if !seen.insert(name) {
            errors.push(FieldError::new(index, FieldErrorKind::Duplicate));
            continue;
        }
        if !row.delete {
            vars.insert(name.to_string(), row.value.clone());
        }
    }
    if errors.is_empty() {
        Ok(vars)
    } else {
        Err(errors)
    }
}

/// Reads, writes and renders extended info through the store and the cache.
pub struct ExtendedInfoService {
    repo: Arc<dyn ExtendedInfoRepository>,
    cache: Arc<dyn InfoCache>,
    formatter: Arc<dyn TextFormatter>,
    placeholders: PlaceholderRegistry,
}

impl ExtendedInfoService {
    pub fn new(
        repo: Arc<dyn ExtendedInfoRepository>,
        cache: Arc<dyn InfoCache>,
        formatter: Arc<dyn TextFormatter>,
        placeholders: PlaceholderRegistry,
    ) -> Self {
        Self { repo, cache, formatter, placeholders }
    }

    /// Fetch the variables of a target, substituted and formatted for display.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::InstanceKind;
    /// use service::extended_info::{cache::MokaInfoCache, format::SanitizingFormatter, placeholders::PlaceholderRegistry};
    /// use service::extended_info::{repository::mock::MockExtendedInfoRepository, ExtendedInfoService, OutputFormat, VarSubmission};
    /// let svc = ExtendedInfoService::new(
    ///     Arc::new(MockExtendedInfoRepository::default()),
    ///     Arc::new(MokaInfoCache::default()),
    ///     Arc::new(SanitizingFormatter),
    ///     PlaceholderRegistry::new("https://lms.example.edu"),
    /// );
    /// tokio_test::block_on(svc.save(InstanceKind::Course, 5, &[VarSubmission::new("color", "[[wwwroot]]/blue")])).unwrap();
    /// let vars = tokio_test::block_on(svc.get(InstanceKind::Course, 5, OutputFormat::Raw)).unwrap().unwrap();
    /// assert_eq!(vars["color"], "https://lms.example.edu/blue");
    /// ```
    #[instrument(skip(self), fields(cache_key = %cache_key(instance, context_instance_id)))]
    pub async fn get(
        &self,
        instance: InstanceKind,
        context_instance_id: i64,
        format: OutputFormat,
    ) -> Result<Option<VarMap>, ServiceError> {
        let Some(raw) = self.load_blob(instance, context_instance_id).await? else {
            return Ok(None);
        };
        let vars = decode_vars(&raw).map_err(|e| ServiceError::Decode(e.to_string()))?;
        let rendered = vars
            .into_iter()
            .map(|(name, value)| {
                let value = self.placeholders.substitute(&value);
                let value = match format {
                    OutputFormat::Raw => value,
                    other => self.formatter.format(&value, other),
                };
                (name, value)
            })
            .collect();
        Ok(Some(rendered))
    }

    /// Stored variables without substitution or formatting, for edit forms.
    #[instrument(skip(self))]
    pub async fn load_raw(&self, instance: InstanceKind, context_instance_id: i64) -> Result<Option<VarMap>, ServiceError> {
        match self.repo.find(instance, context_instance_id).await? {
            Some(rec) => Ok(Some(decode_vars(&rec.vars).map_err(|e| ServiceError::Decode(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn load_blob(&self, instance: InstanceKind, context_instance_id: i64) -> Result<Option<String>, ServiceError> {
        let key = cache_key(instance, context_instance_id);
        if let Some(hit) = self.cache.get(&key).await {
            metrics::CACHE_HITS_TOTAL.inc();
            return Ok(Some(hit));
        }
        metrics::CACHE_MISSES_TOTAL.inc();
        match self.repo.find(instance, context_instance_id).await? {
            Some(rec) => {
                debug!(%key, "cache repaired from store");
                self.cache.set(&key, rec.vars.clone()).await;
                Ok(Some(rec.vars))
            }
            None => Ok(None),
        }
    }

    /// Validate and persist an edit submission; an empty result removes the record.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn save(
        &self,
        instance: InstanceKind,
        context_instance_id: i64,
        rows: &[VarSubmission],
    ) -> Result<SaveOutcome, ServiceError> {
        instance
            .validate_context_instance_id(context_instance_id)
            .map_err(|e| ServiceError::InvalidTarget(e.to_string()))?;
        let vars = validate_submission(rows).map_err(|errs| {
            warn!(errors = errs.fields.len(), "submission rejected");
            ServiceError::Validation(errs)
        })?;

        let key = cache_key(instance, context_instance_id);
        if vars.is_empty() {
            let existed = self.repo.delete(instance, context_instance_id).await?;
            self.cache.delete(&key).await;
            metrics::DELETES_TOTAL.inc();
            info!(%key, existed, "extended info cleared");
            return Ok(SaveOutcome::Deleted { existed });
        }

        let blob = encode_vars(&vars)?;
        let rec = self.repo.upsert(instance, context_instance_id, &blob).await?;
        self.cache.set(&key, blob).await;
        metrics::SAVES_TOTAL.inc();
        info!(%key, vars = vars.len(), "extended info saved");
        Ok(SaveOutcome::Saved(rec))
    }

    /// Remove the record of a target and its cache entry; returns whether a record existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, instance: InstanceKind, context_instance_id: i64) -> Result<bool, ServiceError> {
        let existed = self.repo.delete(instance, context_instance_id).await?;
        self.cache.delete(&cache_key(instance, context_instance_id)).await;
        if existed {
            metrics::DELETES_TOTAL.inc();
        }
        Ok(existed)
    }
}
