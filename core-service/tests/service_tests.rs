//! End-to-end tests for the core service
//!
//! A mocked HTTP client serves canned Zotero responses while the real
//! `TokioFileSystem` writes into temporary directories.

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpRequest, HttpResponse},
    watch::{ChangeWatcher, WatchSubscription},
};
use bytes::Bytes;
use core_service::{CoreDependencies, CoreError, CoreService, MirrorConfig};
use mockall::mock;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

struct NoWatcher;

impl ChangeWatcher for NoWatcher {
    fn watch(&self, _root: &Path) -> BridgeResult<WatchSubscription> {
        Err(BridgeError::NotAvailable("watching disabled in tests".to_string()))
    }
}

const COLLECTIONS: &str = r#"[
    {"key": "COL1", "meta": {"numItems": 1}, "data": {"name": "PhD", "parentCollection": false}},
    {"key": "COL2", "meta": {"numItems": 1}, "data": {"name": "Methods: Core", "parentCollection": "COL1"}}
]"#;

const ITEMS: &str = r#"[
    {"key": "ITEM1", "data": {
        "itemType": "journalArticle",
        "title": "Forecasting with Transformers",
        "creators": [{"creatorType": "author", "firstName": "Jane", "lastName": "Smith"}],
        "date": "2024-02-01",
        "collections": ["COL2"]
    }}
]"#;

const CHILDREN: &str = r#"[
    {"key": "ATT1", "data": {
        "itemType": "attachment",
        "parentItem": "ITEM1",
        "contentType": "application/pdf",
        "filename": "smith2024.pdf"
    }}
]"#;

fn respond(status: u16, body: &str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: Bytes::from(body.to_string()),
    })
}

fn route(url: &str) -> BridgeResult<HttpResponse> {
    if url.contains("/items/ITEM1?format=bibtex") {
        respond(200, "@article{smith2024,\n  title = {Forecasting with Transformers}\n}\n")
    } else if url.contains("/items/ITEM1/children") {
        respond(200, CHILDREN)
    } else if url.contains("/collections?") {
        respond(200, COLLECTIONS)
    } else if url.contains("/items?") {
        respond(200, ITEMS)
    } else {
        respond(404, "Not found")
    }
}

fn mock_catalog() -> MockHttpClient {
    let mut http = MockHttpClient::new();
    http.expect_execute().returning(|req| route(&req.url));
    http
}

struct Setup {
    _storage: TempDir,
    vault: TempDir,
    service: CoreService,
}

fn setup() -> Setup {
    let storage = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();
    fs::create_dir_all(storage.path().join("ATT1")).unwrap();
    fs::write(storage.path().join("ATT1/smith2024.pdf"), b"%PDF-1.5").unwrap();

    let config = MirrorConfig::builder()
        .storage_path(storage.path().to_string_lossy().into_owned())
        .vault_root(vault.path())
        .build()
        .unwrap();
    let deps = CoreDependencies::new(
        Arc::new(mock_catalog()),
        Arc::new(TokioFileSystem::new()),
        Arc::new(NoWatcher),
    );

    Setup {
        service: CoreService::new(deps, config).unwrap(),
        _storage: storage,
        vault,
    }
}

#[tokio::test]
async fn test_sync_mirrors_catalog_into_vault() {
    let s = setup();

    let outcome = s.service.sync_now(&|_: &str| {}).await.unwrap();

    assert_eq!((outcome.synced, outcome.total), (1, 1));
    let mirrored = s
        .vault
        .path()
        .join("Library/PhD/Methods- Core/Smith et al. 2024.pdf");
    assert_eq!(fs::read(mirrored).unwrap(), b"%PDF-1.5");
}

#[tokio::test]
async fn test_collection_tree_and_queries() {
    let s = setup();

    let tree = s.service.collection_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children[0].name, "Methods: Core");

    let hits = s.service.search("smith").await.unwrap();
    assert_eq!(hits[0].key, "ITEM1");

    let entry = s.service.bibtex("ITEM1").await.unwrap();
    assert!(entry.starts_with("@article{smith2024"));

    assert!(s.service.check_connection().await);
}

#[tokio::test]
async fn test_missing_item_surfaces_catalog_error() {
    let s = setup();
    let result = s.service.bibtex("NOPE").await;
    assert!(matches!(result, Err(CoreError::Catalog(_))));
}

#[tokio::test]
async fn test_update_config_repoints_catalog() {
    let s = setup();
    let mut config = s.service.config();
    config.catalog_base_url = "http://127.0.0.1:23120".to_string();

    s.service.update_config(config).await.unwrap();

    assert_eq!(s.service.catalog().base_url(), "http://127.0.0.1:23120");
    assert!(!s.service.coordinator().is_running().await);
}

#[tokio::test]
async fn test_watch_failure_still_starts_in_poll_mode() {
    let s = setup();

    s.service.start_watching().await.unwrap();
    assert!(s.service.coordinator().is_running().await);
    assert!(!s.service.coordinator().is_watching().await);

    s.service.shutdown().await;
    assert!(!s.service.coordinator().is_running().await);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let s = setup();
    let mut config = s.service.config();
    config.debounce = Duration::ZERO;

    assert!(matches!(
        s.service.update_config(config.clone()).await,
        Err(CoreError::Config(_))
    ));

    let deps = CoreDependencies::new(
        Arc::new(mock_catalog()),
        Arc::new(TokioFileSystem::new()),
        Arc::new(NoWatcher),
    );
    assert!(CoreService::new(deps, config).is_err());
}
