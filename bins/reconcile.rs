//! Trigger one reconciliation pass on the running server, for cron-style scheduling.

use std::process::ExitCode;

use anyhow::anyhow;
use tracing::{error, info};

async fn run_once() -> anyhow::Result<usize> {
    let cfg = server::startup::load_config()?;
    let token = cfg
        .server
        .admin_token
        .clone()
        .ok_or_else(|| anyhow!("server.admin_token or ADMIN_TOKEN must be set to trigger reconciliation"))?;
    let base_url = server::remote::server_url(&cfg);
    let report = server::remote::trigger_reconcile(&base_url, &token).await?;
    for removed in &report.removed {
        info!(id = %removed.id, cache_key = %removed.cache_key, "removed");
    }
    info!(scanned = report.scanned, skipped = report.skipped, server = %base_url, "pass complete");
    Ok(report.removed.len())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_once().await {
        Ok(removed) => {
            info!(service = "reconcile", event = "done", removed, "reconciliation finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // logging may not be initialized when config loading failed
            eprintln!("reconciliation failed: {e:#}");
            error!(service = "reconcile", event = "failed", error = %e, "reconciliation failed");
            ExitCode::FAILURE
        }
    }
}
