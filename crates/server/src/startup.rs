use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::admin_http::spawn_admin_server;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::directory::{EntityDirectory, SeaOrmEntityDirectory};
use service::extended_info::cache::{InfoCache, MokaInfoCache};
use service::extended_info::format::SanitizingFormatter;
use service::extended_info::placeholders::PlaceholderRegistry;
use service::extended_info::repo::seaorm::SeaOrmExtendedInfoRepository;
use service::extended_info::repository::ExtendedInfoRepository;
use service::extended_info::ExtendedInfoService;
use service::metrics::encode_metrics;
use service::reconcile::{ReconcileJob, ReconcileScheduler, SchedulerConfig};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the service, reconcile job and handler state from its collaborators.
pub fn assemble(
    repo: Arc<dyn ExtendedInfoRepository>,
    directory: Arc<dyn EntityDirectory>,
    cache: Arc<dyn InfoCache>,
    placeholders: PlaceholderRegistry,
    admin_token: Option<String>,
) -> AppState {
    let wwwroot: Arc<str> = placeholders.wwwroot().into();
    let service = Arc::new(ExtendedInfoService::new(repo.clone(), cache.clone(), Arc::new(SanitizingFormatter), placeholders));
    let reconcile = Arc::new(ReconcileJob::new(repo.clone(), directory.clone(), cache));
    AppState { service, repo, directory, reconcile, admin_token: admin_token.map(Into::into), wwwroot }
}

/// State backed by the database and a moka cache sized from config.
pub fn database_state(db: DatabaseConnection, cfg: &AppConfig) -> AppState {
    assemble(
        Arc::new(SeaOrmExtendedInfoRepository { db: db.clone() }),
        Arc::new(SeaOrmEntityDirectory { db }),
        Arc::new(MokaInfoCache::from_config(&cfg.cache)),
        PlaceholderRegistry::from_site(&cfg.site),
        cfg.server.admin_token.clone(),
    )
}

pub fn app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

/// Load `.env` and config, then initialize logging in the configured format.
pub fn load_config() -> anyhow::Result<AppConfig> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(cfg.logging.format);
    Ok(cfg)
}

/// Connect with the configured pool and apply pending migrations when enabled.
pub async fn connect_database(cfg: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await?;
        info!("database migrations applied");
    }
    Ok(db)
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: build the app and run the HTTP server until ctrl-c.
pub async fn run() -> anyhow::Result<()> {
    let cfg = load_config()?;
    let db = connect_database(&cfg).await?;
    let state = database_state(db, &cfg);

    let _scheduler = if cfg.reconcile.enabled {
        Some(ReconcileScheduler::start(state.reconcile.clone(), SchedulerConfig::from(&cfg.reconcile)))
    } else {
        info!("scheduled reconciliation disabled");
        None
    };
    if let Some(addr) = cfg.server.metrics_addr.as_deref() {
        spawn_admin_server(addr, encode_metrics).await?;
    }
    if state.admin_token.is_none() {
        warn!("no admin token configured; admin routes will reject every request");
    }

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, wwwroot = %state.wwwroot, "extended info server listening");
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
