use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use service::directory::mock::MockEntityDirectory;
use service::extended_info::cache::MokaInfoCache;
use service::extended_info::placeholders::PlaceholderRegistry;
use service::extended_info::repository::mock::MockExtendedInfoRepository;
use models::InstanceKind;
use tokio::net::TcpListener;

use server::remote::trigger_reconcile;
use server::startup::{app, assemble};

struct TestApp {
    base_url: String,
    repo: Arc<MockExtendedInfoRepository>,
    dir: Arc<MockEntityDirectory>,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let repo = Arc::new(MockExtendedInfoRepository::default());
    let dir = Arc::new(MockEntityDirectory::default());
    dir.add_category(3, "Humanities");
    let state = assemble(
        repo.clone(),
        dir.clone(),
        Arc::new(MokaInfoCache::new(100, None)),
        PlaceholderRegistry::new("https://lms.example.edu").with("support", "help@example.edu"),
        Some("e2e-token".into()),
    );

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());
    let router = app(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await { eprintln!("server error: {}", e); }
    });
    Ok(TestApp { base_url, repo, dir })
}

#[tokio::test]
async fn edit_and_read_over_http() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{}/admin/extended-info/category/3", app.base_url))
        .header("X-Admin-Token", "e2e-token")
        .json(&json!({"vars": [
            {"name": "contact", "value": "Mail [[support]]\nor visit [[wwwroot]]"},
            {"name": "banner", "value": "**Welcome**"}
        ]}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);

    let body: Value = client.get(format!("{}/extended-info/category/3?format=auto", app.base_url)).send().await?.json().await?;
    assert_eq!(body["vars"]["contact"], "Mail help@example.edu<br />\nor visit https://lms.example.edu");

    let body: Value = client.get(format!("{}/extended-info/category/3?format=markdown", app.base_url)).send().await?.json().await?;
    assert_eq!(body["vars"]["banner"], "<p><strong>Welcome</strong></p>\n");

    let resp = client.post(format!("{}/admin/reconcile", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn triggered_reconcile_clears_server_cache() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();
    app.repo.insert_raw(InstanceKind::Category, 3, r#"{"a":"1"}"#);

    let resp = client.get(format!("{}/extended-info/category/3?format=raw", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);

    app.dir.remove(InstanceKind::Category, 3);
    let report = trigger_reconcile(&app.base_url, "e2e-token").await?;
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].cache_key, "category/3");
    assert!(app.repo.is_empty());

    let resp = client.get(format!("{}/extended-info/category/3?format=raw", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::NOT_FOUND);

    let err = trigger_reconcile(&app.base_url, "wrong").await.unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");
    Ok(())
}
