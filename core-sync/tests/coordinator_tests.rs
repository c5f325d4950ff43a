//! Timing tests for the sync coordinator
//!
//! All tests run on paused tokio time, so sleeps advance the clock instantly
//! once every task is idle. The catalog and filesystem are in-memory fakes
//! that only count passes.

use async_trait::async_trait;
use bridge_traits::{
    catalog::{Attachment, CatalogProvider, Collection, Item, ItemsWithAttachments},
    error::{BridgeError, Result as BridgeResult},
    storage::{FileMetadata, FileSystemAccess},
    watch::{ChangeWatcher, WatchEvent, WatchSubscription},
};
use core_runtime::config::MirrorConfig;
use core_sync::{LibraryReconciler, SyncCoordinator};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::sleep;

// ============================================================================
// Mock Implementations
// ============================================================================

/// Empty catalog that counts passes (one collections fetch per pass).
#[derive(Default)]
struct CountingCatalog {
    passes: AtomicUsize,
    base_url: Mutex<String>,
}

impl CountingCatalog {
    fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for CountingCatalog {
    async fn fetch_collections(&self) -> BridgeResult<Vec<Collection>> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn fetch_all_items(&self) -> BridgeResult<Vec<Item>> {
        Ok(Vec::new())
    }

    async fn fetch_items_with_attachments(
        &self,
        _collection_key: Option<&str>,
    ) -> BridgeResult<ItemsWithAttachments> {
        Ok(ItemsWithAttachments::default())
    }

    async fn fetch_attachments(&self, _parent_key: &str) -> BridgeResult<Vec<Attachment>> {
        Ok(Vec::new())
    }

    async fn test_connection(&self) -> bool {
        true
    }

    fn set_base_url(&self, base_url: &str) {
        *self.base_url.lock().unwrap() = base_url.to_string();
    }
}

/// Filesystem with no files that accepts every write.
struct EmptyFileSystem;

fn not_found(path: &Path) -> BridgeError {
    BridgeError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        path.display().to_string(),
    ))
}

#[async_trait]
impl FileSystemAccess for EmptyFileSystem {
    async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
        Ok(false)
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        Err(not_found(path))
    }

    async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
        Ok(())
    }

    async fn copy_file(&self, from: &Path, _to: &Path) -> BridgeResult<u64> {
        Err(not_found(from))
    }

    async fn rename(&self, from: &Path, _to: &Path) -> BridgeResult<()> {
        Err(not_found(from))
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        Err(not_found(path))
    }

    async fn list_files_recursive(&self, _root: &Path) -> BridgeResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// Hands out subscriptions and keeps the sending side for the test.
#[derive(Default)]
struct ChannelWatcher {
    sender: Mutex<Option<mpsc::UnboundedSender<WatchEvent>>>,
    watched: Mutex<Vec<PathBuf>>,
}

impl ChannelWatcher {
    fn emit(&self) {
        let sender = self.sender.lock().unwrap();
        sender
            .as_ref()
            .expect("no active watch")
            .send(WatchEvent::Changed(vec![PathBuf::from("ATT1/paper.pdf")]))
            .unwrap();
    }
}

impl ChangeWatcher for ChannelWatcher {
    fn watch(&self, root: &Path) -> BridgeResult<WatchSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(tx);
        self.watched.lock().unwrap().push(root.to_path_buf());
        Ok(WatchSubscription::new(rx, Box::new(())))
    }
}

struct RefusingWatcher;

impl ChangeWatcher for RefusingWatcher {
    fn watch(&self, _root: &Path) -> BridgeResult<WatchSubscription> {
        Err(BridgeError::OperationFailed("inotify limit reached".to_string()))
    }
}

// ============================================================================
// Test Utilities
// ============================================================================

struct Harness {
    storage: TempDir,
    catalog: Arc<CountingCatalog>,
    coordinator: SyncCoordinator,
}

fn config_for(storage: &Path) -> MirrorConfig {
    MirrorConfig::builder()
        .storage_path(storage.to_string_lossy().into_owned())
        .vault_root("/vault")
        .debounce(Duration::from_millis(5_000))
        .poll_interval(Duration::from_millis(30_000))
        .build()
        .unwrap()
}

fn harness(watcher: Arc<dyn ChangeWatcher>) -> Harness {
    let storage = TempDir::new().unwrap();
    let catalog = Arc::new(CountingCatalog::default());
    let reconciler = Arc::new(LibraryReconciler::new(
        catalog.clone() as Arc<dyn CatalogProvider>,
        Arc::new(EmptyFileSystem),
        config_for(storage.path()),
    ));

    Harness {
        storage,
        catalog,
        coordinator: SyncCoordinator::new(reconciler, watcher),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_of_events_triggers_one_pass() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    h.coordinator.start().await.unwrap();
    assert!(h.coordinator.is_watching().await);

    watcher.emit();
    sleep(Duration::from_secs(3)).await;
    watcher.emit();
    sleep(Duration::from_secs(3)).await;

    // Second event pushed the deadline back
    assert_eq!(h.catalog.passes(), 0);

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(h.catalog.passes(), 1);

    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_fires_without_events() {
    let h = harness(Arc::new(ChannelWatcher::default()));
    h.coordinator.start().await.unwrap();

    sleep(Duration::from_millis(29_000)).await;
    assert_eq!(h.catalog.passes(), 0);

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(h.catalog.passes(), 1);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.catalog.passes(), 2);

    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_events_do_not_reset_poll() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    h.coordinator.start().await.unwrap();

    // Events every 4s keep the debounce from ever firing
    for _ in 0..8 {
        watcher.emit();
        sleep(Duration::from_secs(4)).await;
    }

    assert_eq!(h.catalog.passes(), 1);
    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_watch_failure_falls_back_to_poll() {
    let h = harness(Arc::new(RefusingWatcher));
    h.coordinator.start().await.unwrap();

    assert!(h.coordinator.is_running().await);
    assert!(!h.coordinator.is_watching().await);

    sleep(Duration::from_millis(30_500)).await;
    assert_eq!(h.catalog.passes(), 1);

    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_storage_is_poll_only() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    let mut config = h.coordinator.reconciler().config();
    config.storage_path = h.storage.path().join("does-not-exist");
    h.coordinator.reconciler().apply_config(config);

    h.coordinator.start().await.unwrap();

    assert!(!h.coordinator.is_watching().await);
    assert!(watcher.watched.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_storage_that_is_a_file_is_poll_only() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    let file = h.storage.path().join("storage.txt");
    std::fs::write(&file, b"not a directory").unwrap();
    let mut config = h.coordinator.reconciler().config();
    config.storage_path = file;
    h.coordinator.reconciler().apply_config(config);

    h.coordinator.start().await.unwrap();

    assert!(h.coordinator.is_running().await);
    assert!(!h.coordinator.is_watching().await);
    assert!(watcher.watched.lock().unwrap().is_empty());
    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_future_passes() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    h.coordinator.start().await.unwrap();
    watcher.emit();

    h.coordinator.stop().await;
    assert!(!h.coordinator.is_running().await);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(h.catalog.passes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_applies_new_settings() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());
    h.coordinator.start().await.unwrap();

    let new_storage = TempDir::new().unwrap();
    let mut config = config_for(new_storage.path());
    config.catalog_base_url = "http://127.0.0.1:23120".to_string();
    config.poll_interval = Duration::from_secs(10);

    h.coordinator.restart(config).await.unwrap();

    assert!(h.coordinator.is_running().await);
    assert_eq!(
        *h.catalog.base_url.lock().unwrap(),
        "http://127.0.0.1:23120"
    );
    assert_eq!(
        watcher.watched.lock().unwrap().last(),
        Some(&new_storage.path().to_path_buf())
    );

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(h.catalog.passes(), 1);

    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_rejects_invalid_config() {
    let h = harness(Arc::new(ChannelWatcher::default()));
    h.coordinator.start().await.unwrap();

    let mut config = h.coordinator.reconciler().config();
    config.poll_interval = Duration::ZERO;

    assert!(h.coordinator.restart(config).await.is_err());
    assert!(h.coordinator.is_running().await);

    h.coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_sync_runs_immediately() {
    let h = harness(Arc::new(ChannelWatcher::default()));

    let outcome = h.coordinator.sync_now(&|_: &str| {}).await.unwrap();

    assert_eq!((outcome.synced, outcome.total), (0, 0));
    assert_eq!(h.catalog.passes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_noop() {
    let watcher = Arc::new(ChannelWatcher::default());
    let h = harness(watcher.clone());

    h.coordinator.start().await.unwrap();
    h.coordinator.start().await.unwrap();

    assert_eq!(watcher.watched.lock().unwrap().len(), 1);
    h.coordinator.stop().await;
}
