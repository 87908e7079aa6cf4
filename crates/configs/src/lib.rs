use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Token expected in `X-Admin-Token` on admin routes. Falls back to `ADMIN_TOKEN`.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Bind address of the healthz/metrics listener; disabled when unset.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), admin_token: None, metrics_addr: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

/// Sizing of the in-process extended info cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// Entry lifetime in seconds; `0` keeps entries until invalidated or evicted.
    #[serde(default)]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_capacity: default_cache_capacity(), ttl_secs: 0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reconcile_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub run_on_startup: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { enabled: true, interval_secs: default_reconcile_interval(), run_on_startup: false }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Site root URL substituted for `[[wwwroot]]`. Falls back to `WWWROOT`.
    #[serde(default)]
    pub wwwroot: String,
    /// Additional `[[name]]` placeholders, applied after `wwwroot`.
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_cache_capacity() -> u64 { 10_000 }
fn default_reconcile_interval() -> u64 { 24 * 60 * 60 }
fn default_true() -> bool { true }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_toml_str(&content)
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(content)?;
        Ok(cfg)
    }

    /// Load `CONFIG_PATH` (default `config.toml`) and validate. A missing file falls back to defaults plus env vars.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.cache.validate()?;
        self.reconcile.validate()?;
        self.site.normalize_from_env();
        self.site.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.admin_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.trim().is_empty());
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(anyhow!("cache.max_capacity must be >= 1"));
        }
        Ok(())
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval_secs == 0 {
            return Err(anyhow!("reconcile.interval_secs must be > 0 when reconciliation is enabled"));
        }
        Ok(())
    }
}

impl SiteConfig {
    pub fn normalize_from_env(&mut self) {
        if self.wwwroot.trim().is_empty() {
            if let Ok(root) = std::env::var("WWWROOT") {
                self.wwwroot = root;
            }
        }
        // The root is joined with relative paths, so keep it without a trailing slash.
        while self.wwwroot.ends_with('/') {
            self.wwwroot.pop();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.wwwroot.trim().is_empty() {
            return Err(anyhow!("site.wwwroot is empty; set it in config.toml or WWWROOT"));
        }
        for name in self.placeholders.keys() {
            if name == "wwwroot" {
                return Err(anyhow!("site.placeholders must not redefine wwwroot"));
            }
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(anyhow!("site.placeholders key `{name}` must be alphanumeric"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [server]
        host = ""
        port = 9090
        worker_threads = 0
        admin_token = "s3cret"

        [database]
        url = "postgres://u:p@localhost:5432/lms"

        [cache]
        max_capacity = 50
        ttl_secs = 120

        [reconcile]
        interval_secs = 600
        run_on_startup = true

        [site]
        wwwroot = "https://lms.example.edu/"

        [site.placeholders]
        supportemail = "help@example.edu"

        [logging]
        format = "json"
    "#;

    #[test]
    fn parses_and_normalizes_full_config() {
        let mut cfg = AppConfig::from_toml_str(FULL).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.server.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(cfg.cache.max_capacity, 50);
        assert_eq!(cfg.cache.ttl_secs, 120);
        assert!(cfg.reconcile.enabled);
        assert!(cfg.reconcile.run_on_startup);
        assert_eq!(cfg.site.wwwroot, "https://lms.example.edu");
        assert_eq!(cfg.site.placeholders.get("supportemail").map(String::as_str), Some("help@example.edu"));
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cache.max_capacity, 10_000);
        assert_eq!(cfg.reconcile.interval_secs, 86_400);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.logging.format, LogFormat::Compact);
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/lms".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_zero_reconcile_interval_only_when_enabled() {
        let mut rc = ReconcileConfig { enabled: true, interval_secs: 0, run_on_startup: false };
        assert!(rc.validate().is_err());
        rc.enabled = false;
        assert!(rc.validate().is_ok());
    }

    #[test]
    fn rejects_placeholder_shadowing_wwwroot() {
        let mut site = SiteConfig { wwwroot: "https://x.test".into(), placeholders: BTreeMap::new() };
        site.placeholders.insert("wwwroot".into(), "https://y.test".into());
        assert!(site.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(load_from_file(path.to_str().unwrap()).is_err());
    }
}
