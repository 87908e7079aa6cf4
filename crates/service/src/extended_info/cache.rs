use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

/// Process-wide cache of raw vars blobs keyed by `"<instance>/<id>"`.
///
/// Lookups never fail; a miss is `None`.
#[async_trait]
pub trait InfoCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, vars_json: String);
    async fn delete(&self, key: &str);
}

pub struct MokaInfoCache {
    inner: Cache<String, String>,
}

impl MokaInfoCache {
    /// `ttl` of `None` keeps entries until invalidated or evicted by capacity.
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self { inner: builder.build() }
    }

    pub fn from_config(cfg: &configs::CacheConfig) -> Self {
        let ttl = (cfg.ttl_secs > 0).then(|| Duration::from_secs(cfg.ttl_secs));
        Self::new(cfg.max_capacity, ttl)
    }
}

impl Default for MokaInfoCache {
    fn default() -> Self { Self::from_config(&configs::CacheConfig::default()) }
}

#[async_trait]
impl InfoCache for MokaInfoCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, vars_json: String) {
        self.inner.insert(key.to_string(), vars_json).await;
    }

    async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let cache = MokaInfoCache::default();
        assert_eq!(cache.get("course/5").await, None);

        cache.set("course/5", r#"{"a":"1"}"#.into()).await;
        assert_eq!(cache.get("course/5").await.as_deref(), Some(r#"{"a":"1"}"#));

        cache.set("course/5", r#"{"a":"2"}"#.into()).await;
        assert_eq!(cache.get("course/5").await.as_deref(), Some(r#"{"a":"2"}"#));

        cache.delete("course/5").await;
        assert_eq!(cache.get("course/5").await, None);
        // deleting an absent key is a no-op
        cache.delete("course/5").await;
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = MokaInfoCache::new(16, None);
        cache.set("course/5", "{}".into()).await;
        assert_eq!(cache.get("module/5").await, None);
        assert_eq!(cache.get("course/-1").await, None);
    }
}
