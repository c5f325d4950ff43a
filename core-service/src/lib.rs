//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! change watching) into the library mirror. Desktop apps typically enable
//! the `desktop-shims` feature (which depends on `bridge-desktop`); other
//! hosts build a [`CoreDependencies`] from their own adapters.
//!
//! The `cli` feature adds the `catalog-mirror` binary.

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::progress::{NoopProgress, ProgressSink};
pub use core_runtime::config::{AttachmentLookup, HostSettings, MirrorConfig};
pub use core_sync::{CollectionTreeNode, SyncOutcome};

use std::sync::Arc;

use bridge_traits::{
    catalog::{CatalogProvider, Item},
    http::HttpClient,
    storage::FileSystemAccess,
    watch::ChangeWatcher,
};
use core_sync::{LibraryReconciler, SyncCoordinator};
use provider_zotero::ZoteroClient;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub watcher: Arc<dyn ChangeWatcher>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        filesystem: Arc<dyn FileSystemAccess>,
        watcher: Arc<dyn ChangeWatcher>,
    ) -> Self {
        Self {
            http_client,
            filesystem,
            watcher,
        }
    }

    /// reqwest, tokio::fs and notify adapters.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Self {
        use bridge_desktop::{NotifyChangeWatcher, ReqwestHttpClient, TokioFileSystem};

        Self::new(
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(TokioFileSystem::new()),
            Arc::new(NotifyChangeWatcher::new()),
        )
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    catalog: Arc<ZoteroClient>,
    coordinator: Arc<SyncCoordinator>,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    ///
    /// Nothing runs until [`start_watching`](Self::start_watching) or
    /// [`sync_now`](Self::sync_now) is called.
    pub fn new(deps: CoreDependencies, config: MirrorConfig) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(ZoteroClient::new(
            Arc::clone(&deps.http_client),
            &config.catalog_base_url,
        ));
        let reconciler = Arc::new(LibraryReconciler::new(
            Arc::clone(&catalog) as Arc<dyn CatalogProvider>,
            Arc::clone(&deps.filesystem),
            config,
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            reconciler,
            Arc::clone(&deps.watcher),
        ));

        Ok(Self {
            deps: Arc::new(deps),
            catalog,
            coordinator,
        })
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn catalog(&self) -> Arc<ZoteroClient> {
        Arc::clone(&self.catalog)
    }

    pub fn coordinator(&self) -> Arc<SyncCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn config(&self) -> MirrorConfig {
        self.coordinator.reconciler().config()
    }

    /// Start the storage watch and the poll timer.
    pub async fn start_watching(&self) -> Result<()> {
        self.coordinator.start().await?;
        Ok(())
    }

    pub async fn stop_watching(&self) {
        self.coordinator.stop().await;
    }

    /// Apply new settings. A running watcher is fully restarted.
    pub async fn update_config(&self, config: MirrorConfig) -> Result<()> {
        config.validate()?;
        if !self.config().requires_restart(&config) {
            return Ok(());
        }

        if self.coordinator.is_running().await {
            info!("Settings changed, restarting watcher");
            self.coordinator.restart(config).await?;
        } else {
            self.coordinator.reconciler().apply_config(config);
        }
        Ok(())
    }

    /// Run one reconciliation pass now.
    pub async fn sync_now(&self, progress: &dyn ProgressSink) -> Result<SyncOutcome> {
        Ok(self.coordinator.sync_now(progress).await?)
    }

    pub async fn collection_tree(&self) -> Result<Vec<CollectionTreeNode>> {
        Ok(self.coordinator.reconciler().collection_tree().await?)
    }

    /// Whether the catalog answers at its configured address.
    pub async fn check_connection(&self) -> bool {
        self.catalog.ping().await
    }

    /// Quick search over titles, creators and years.
    pub async fn search(&self, query: &str) -> Result<Vec<Item>> {
        Ok(self.catalog.search_items(query).await?)
    }

    pub async fn bibtex(&self, item_key: &str) -> Result<String> {
        Ok(self.catalog.fetch_item_bibtex(item_key).await?)
    }

    /// Stop the watcher. A pass already running is allowed to finish.
    pub async fn shutdown(&self) {
        self.coordinator.stop().await;
    }
}

/// Build a service on the desktop adapters.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, MirrorConfig};
///
/// let config = MirrorConfig::builder().vault_root("/home/me/vault").build()?;
/// let core = bootstrap_desktop(config)?;
/// core.start_watching().await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: MirrorConfig) -> Result<CoreService> {
    CoreService::new(CoreDependencies::desktop(), config)
}
