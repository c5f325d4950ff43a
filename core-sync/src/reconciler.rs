//! # Library Reconciler
//!
//! One reconciliation pass mirrors the catalog into the vault's library
//! folder.
//!
//! ## Workflow
//!
//! 1. Fetch collections and build the folder hierarchy
//! 2. Fetch items (and, in prefetched mode, the attachment map in the same pass)
//! 3. Assign a filename to every item
//! 4. Create the library folder, every collection folder and `_Unsorted`
//! 5. Place each item's PDF into every folder it belongs to, skipping copies
//!    whose size already matches and renaming files still stored under the
//!    catalog's original filename
//! 6. Delete every PDF below the library folder that step 5 did not account for
//!
//! A failed collection or item listing aborts the pass before the orphan
//! scan, so an unreachable catalog never empties the library. Failures scoped
//! to one item, including its attachment lookup, are logged and the item is
//! reported as not synced. When the lookup itself fails, the item's existing
//! copies are kept.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::LibraryReconciler;
//! use std::sync::Arc;
//!
//! # async fn example(reconciler: Arc<LibraryReconciler>) -> core_sync::Result<()> {
//! let outcome = reconciler.sync(&|msg: &str| println!("{msg}")).await?;
//! println!("{}/{} synced, {} removed", outcome.synced, outcome.total, outcome.removed);
//! # Ok(())
//! # }
//! ```

use crate::{
    hierarchy::{build_collection_tree, collection_paths, flatten_collection_tree, CollectionTreeNode},
    naming::assign_filenames,
    Result, SyncError,
};
use bridge_traits::{
    catalog::{Attachment, CatalogProvider, Item},
    progress::ProgressSink,
    storage::FileSystemAccess,
};
use core_runtime::config::{AttachmentLookup, MirrorConfig};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Folder (inside the library) for items that belong to no known collection.
pub const UNSORTED_DIR: &str = "_Unsorted";

/// Title characters shown in per-item progress lines.
const PROGRESS_TITLE_CHARS: usize = 50;

/// Tally of one reconciliation pass.
///
/// A pass skipped because another one was running reports all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Items whose PDF now sits in every destination folder.
    pub synced: usize,
    /// Items in the catalog working set.
    pub total: usize,
    pub copied: usize,
    pub renamed: usize,
    pub up_to_date: usize,
    /// Items without a PDF attachment or whose stored file is absent.
    pub missing: usize,
    /// Items with at least one destination that could not be written.
    pub failed: usize,
    /// Orphaned PDFs deleted from the library.
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Copied,
    Renamed,
    UpToDate,
}

/// Per-pass bookkeeping.
#[derive(Default)]
struct PassState {
    expected: HashSet<PathBuf>,
    outcome: SyncOutcome,
}

impl PassState {
    fn record(&mut self, placement: Placement, path: PathBuf) {
        match placement {
            Placement::Copied => self.outcome.copied += 1,
            Placement::Renamed => self.outcome.renamed += 1,
            Placement::UpToDate => self.outcome.up_to_date += 1,
        }
        self.expected.insert(path);
    }
}

/// Runs reconciliation passes. At most one pass runs at a time; a pass
/// requested while another is in flight returns an empty outcome at once.
pub struct LibraryReconciler {
    catalog: Arc<dyn CatalogProvider>,
    fs: Arc<dyn FileSystemAccess>,
    config: RwLock<MirrorConfig>,
    pass_lock: Mutex<()>,
}

impl LibraryReconciler {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        fs: Arc<dyn FileSystemAccess>,
        config: MirrorConfig,
    ) -> Self {
        Self {
            catalog,
            fs,
            config: RwLock::new(config),
            pass_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> MirrorConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the configuration used by future passes and repoint the catalog.
    ///
    /// A pass already running keeps the snapshot it started with.
    pub fn apply_config(&self, config: MirrorConfig) {
        self.catalog.set_base_url(&config.catalog_base_url);
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    pub fn is_syncing(&self) -> bool {
        self.pass_lock.try_lock().is_err()
    }

    /// Fetch collections and build the folder forest without touching disk.
    pub async fn collection_tree(&self) -> Result<Vec<CollectionTreeNode>> {
        let config = self.config();
        let collections = self
            .catalog
            .fetch_collections()
            .await
            .map_err(SyncError::from_catalog)?;
        Ok(build_collection_tree(&collections, &config.library_dir))
    }

    /// Run one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns `CatalogUnavailable`/`CatalogUnreachable` when the collection
    /// or item listing fails, and `Filesystem` when the library folder cannot
    /// be created.
    /// Item-level problems never surface here.
    #[instrument(skip_all)]
    pub async fn sync(&self, progress: &dyn ProgressSink) -> Result<SyncOutcome> {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            debug!("Sync pass already running, skipping");
            return Ok(SyncOutcome::default());
        };

        let config = self.config();
        let library_root = config.library_root();
        info!(
            library = %library_root.display(),
            storage = %config.storage_path.display(),
            "Starting sync pass"
        );

        progress.report("Fetching collections...");
        let collections = self
            .catalog
            .fetch_collections()
            .await
            .map_err(SyncError::from_catalog)?;
        let tree = build_collection_tree(&collections, &config.library_dir);
        let folders = collection_paths(&tree);

        progress.report("Fetching items...");
        let (items, prefetched) = match config.attachment_lookup {
            AttachmentLookup::PerItem => {
                let items = self
                    .catalog
                    .fetch_all_items()
                    .await
                    .map_err(SyncError::from_catalog)?;
                (items, None)
            }
            AttachmentLookup::Prefetched => {
                let listing = self
                    .catalog
                    .fetch_items_with_attachments(None)
                    .await
                    .map_err(SyncError::from_catalog)?;
                (listing.items, Some(listing.attachments))
            }
        };
        let filenames = assign_filenames(&items);

        let unsorted = config.library_dir.join(UNSORTED_DIR);
        self.ensure_folders(&config, &tree, &unsorted).await?;

        let total = items.len();
        let mut state = PassState::default();
        state.outcome.total = total;

        for (index, item) in items.iter().enumerate() {
            let title: String = item.title.chars().take(PROGRESS_TITLE_CHARS).collect();
            progress.report(&format!("Syncing {}/{}: {}...", index + 1, total, title));

            let Some(filename) = filenames.get(&item.key) else {
                continue;
            };

            let complete = self
                .sync_item(
                    &config,
                    item,
                    filename,
                    &folders,
                    &unsorted,
                    prefetched.as_ref(),
                    &mut state,
                )
                .await;
            if complete {
                state.outcome.synced += 1;
            }
        }

        progress.report("Cleaning up removed papers...");
        state.outcome.removed = self.remove_orphans(&library_root, &state.expected).await;
        if state.outcome.removed > 0 {
            progress.report(&format!("Removed {} orphaned PDF(s)", state.outcome.removed));
        }

        let outcome = state.outcome;
        progress.report(&format!(
            "Sync complete: {}/{} papers synced",
            outcome.synced, outcome.total
        ));
        info!(
            synced = outcome.synced,
            total = outcome.total,
            copied = outcome.copied,
            renamed = outcome.renamed,
            up_to_date = outcome.up_to_date,
            missing = outcome.missing,
            failed = outcome.failed,
            removed = outcome.removed,
            "Sync pass finished"
        );

        Ok(outcome)
    }

    async fn ensure_folders(
        &self,
        config: &MirrorConfig,
        tree: &[CollectionTreeNode],
        unsorted: &Path,
    ) -> Result<()> {
        let library_root = config.library_root();
        self.fs.create_dir_all(&library_root).await.map_err(|e| {
            SyncError::Filesystem(format!("cannot create {}: {}", library_root.display(), e))
        })?;

        for node in flatten_collection_tree(tree) {
            let folder = config.vault_root.join(&node.path);
            if let Err(e) = self.fs.create_dir_all(&folder).await {
                // Placements into this folder will fail and be reported per item
                warn!(folder = %folder.display(), error = %e, "Failed to create collection folder");
            }
        }

        let unsorted = config.vault_root.join(unsorted);
        self.fs.create_dir_all(&unsorted).await.map_err(|e| {
            SyncError::Filesystem(format!("cannot create {}: {}", unsorted.display(), e))
        })
    }

    /// Locate the item's PDF attachment.
    async fn pdf_attachment(
        &self,
        item: &Item,
        prefetched: Option<&HashMap<String, Attachment>>,
    ) -> Result<Option<Attachment>> {
        match prefetched {
            Some(map) => Ok(map.get(&item.key).filter(|a| a.is_pdf()).cloned()),
            None => {
                let attachments = self
                    .catalog
                    .fetch_attachments(&item.key)
                    .await
                    .map_err(SyncError::from_catalog)?;
                Ok(attachments.into_iter().find(Attachment::is_pdf))
            }
        }
    }

    /// Place one item. Returns whether every destination now holds its PDF.
    #[allow(clippy::too_many_arguments)]
    async fn sync_item(
        &self,
        config: &MirrorConfig,
        item: &Item,
        filename: &str,
        folders: &HashMap<String, PathBuf>,
        unsorted: &Path,
        prefetched: Option<&HashMap<String, Attachment>>,
        state: &mut PassState,
    ) -> bool {
        let destinations = destination_folders(item, folders, unsorted);

        let attachment = match self.pdf_attachment(item, prefetched).await {
            Ok(Some(attachment)) => attachment,
            Ok(None) => {
                debug!(item = %item.key, "No PDF attachment");
                state.outcome.missing += 1;
                return false;
            }
            Err(e) => {
                warn!(item = %item.key, error = %e, "Attachment lookup failed");
                state.outcome.failed += 1;
                state.expected.extend(
                    destinations
                        .iter()
                        .map(|folder| config.vault_root.join(folder).join(filename)),
                );
                return false;
            }
        };
        let Some(source) = attachment.source_path(&config.storage_path) else {
            state.outcome.missing += 1;
            return false;
        };

        let source_size = match self.fs.metadata(&source).await {
            Ok(meta) if !meta.is_directory => meta.size,
            Ok(_) => {
                let missing = SyncError::SourceFileMissing { path: source };
                debug!(item = %item.key, error = %missing, "Skipping item");
                state.outcome.missing += 1;
                return false;
            }
            Err(e) if e.is_not_found() => {
                let missing = SyncError::SourceFileMissing { path: source };
                debug!(item = %item.key, error = %missing, "Skipping item");
                state.outcome.missing += 1;
                return false;
            }
            Err(e) => {
                warn!(item = %item.key, source = %source.display(), error = %e, "Cannot read source PDF");
                state.outcome.failed += 1;
                return false;
            }
        };

        let original = attachment.filename.as_deref();
        let mut complete = true;
        for folder in destinations {
            let folder = config.vault_root.join(folder);
            let dest = folder.join(filename);

            match self
                .place(&source, source_size, &folder, filename, original)
                .await
            {
                Ok(placement) => {
                    debug!(item = %item.key, dest = %dest.display(), ?placement, "Placed PDF");
                    state.record(placement, dest);
                }
                Err(e) => {
                    warn!(item = %item.key, error = %e, "Failed to place PDF");
                    complete = false;
                }
            }
        }

        if !complete {
            state.outcome.failed += 1;
        }
        complete
    }

    async fn place(
        &self,
        source: &Path,
        source_size: u64,
        folder: &Path,
        filename: &str,
        original: Option<&str>,
    ) -> Result<Placement> {
        let dest = folder.join(filename);

        match self.fs.metadata(&dest).await {
            Ok(meta) if !meta.is_directory && meta.size == source_size => {
                return Ok(Placement::UpToDate);
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                // Files mirrored before renaming still carry the catalog filename
                if let Some(original) = original.filter(|o| *o != filename) {
                    let legacy = folder.join(original);
                    if self.fs.exists(&legacy).await.unwrap_or(false) {
                        self.fs
                            .rename(&legacy, &dest)
                            .await
                            .map_err(|e| SyncError::destination(&dest, e))?;
                        return Ok(Placement::Renamed);
                    }
                }
            }
            Err(e) => return Err(SyncError::destination(&dest, e)),
        }

        self.fs
            .copy_file(source, &dest)
            .await
            .map_err(|e| SyncError::destination(&dest, e))?;
        Ok(Placement::Copied)
    }

    /// Delete PDFs under the library root that no item claimed. Best effort.
    async fn remove_orphans(&self, library_root: &Path, expected: &HashSet<PathBuf>) -> usize {
        let files = match self.fs.list_files_recursive(library_root).await {
            Ok(files) => files,
            Err(e) => {
                warn!(library = %library_root.display(), error = %e, "Orphan scan failed");
                return 0;
            }
        };

        let mut removed = 0;
        for file in files {
            if !is_pdf_path(&file) || expected.contains(&file) {
                continue;
            }

            match self.fs.delete_file(&file).await {
                Ok(()) => {
                    info!(path = %file.display(), "Removed orphaned PDF");
                    removed += 1;
                }
                Err(e) => warn!(path = %file.display(), error = %e, "Failed to remove orphaned PDF"),
            }
        }
        removed
    }
}

/// Folders (relative to the vault) the item is mirrored into, deduplicated,
/// falling back to `unsorted` when no membership resolves.
fn destination_folders<'a>(
    item: &Item,
    folders: &'a HashMap<String, PathBuf>,
    unsorted: &'a Path,
) -> Vec<&'a Path> {
    let mut destinations: Vec<&Path> = Vec::new();
    for key in &item.collections {
        if let Some(folder) = folders.get(key) {
            if !destinations.contains(&folder.as_path()) {
                destinations.push(folder);
            }
        }
    }
    if destinations.is_empty() {
        destinations.push(unsorted);
    }
    destinations
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
