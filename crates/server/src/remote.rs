//! Client for a running server's `POST /admin/reconcile`.
//!
//! The info cache lives inside the server process, so an out-of-process pass
//! has to run there for its cache invalidations to take effect.

use anyhow::{bail, Context};
use configs::AppConfig;
use service::reconcile::ReconcileReport;
use tracing::debug;

use crate::admin::ADMIN_TOKEN_HEADER;

/// Base URL of the server to reconcile: `RECONCILE_URL`, else the configured listen address.
pub fn server_url(cfg: &AppConfig) -> String {
    if let Ok(url) = std::env::var("RECONCILE_URL") {
        if !url.trim().is_empty() {
            return url.trim().trim_end_matches('/').to_string();
        }
    }
    let host = match cfg.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        h => h,
    };
    format!("http://{}:{}", host, cfg.server.port)
}

/// Run one reconciliation pass inside the server at `base_url`.
pub async fn trigger_reconcile(base_url: &str, token: &str) -> anyhow::Result<ReconcileReport> {
    let url = format!("{}/admin/reconcile", base_url.trim_end_matches('/'));
    debug!(%url, "requesting reconciliation");
    let resp = reqwest::Client::new()
        .post(&url)
        .header(ADMIN_TOKEN_HEADER, token)
        .send()
        .await
        .with_context(|| format!("could not reach {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("reconcile request failed with {status}: {body}");
    }
    resp.json::<ReconcileReport>().await.context("unexpected reconcile response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_listen_address_maps_to_loopback() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "0.0.0.0".into();
        cfg.server.port = 9090;
        if std::env::var("RECONCILE_URL").is_err() {
            assert_eq!(server_url(&cfg), "http://127.0.0.1:9090");
        }
    }
}
