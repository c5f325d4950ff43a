//! Recursive Change Watcher using `notify`

use bridge_traits::{
    error::{BridgeError, Result},
    watch::{ChangeWatcher, WatchEvent, WatchSubscription},
};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Watches a directory tree with the platform's recommended backend
/// (inotify, FSEvents, ReadDirectoryChangesW).
///
/// Access-only events are dropped; everything else is forwarded as a raw
/// [`WatchEvent::Changed`] without coalescing.
#[derive(Debug, Clone, Default)]
pub struct NotifyChangeWatcher;

impl NotifyChangeWatcher {
    pub fn new() -> Self {
        Self
    }

    fn map_notify_error(e: notify::Error) -> BridgeError {
        match e.kind {
            notify::ErrorKind::Io(io) => BridgeError::Io(io),
            notify::ErrorKind::PathNotFound => BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "watch path not found",
            )),
            other => BridgeError::OperationFailed(format!("Watcher error: {:?}", other)),
        }
    }
}

impl ChangeWatcher for NotifyChangeWatcher {
    fn watch(&self, root: &Path) -> Result<WatchSubscription> {
        if !root.is_dir() {
            return Err(BridgeError::NotAvailable(format!(
                "Watch root is not a directory: {}",
                root.display()
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) if matches!(event.kind, EventKind::Access(_)) => return,
                Ok(event) => WatchEvent::Changed(event.paths),
                Err(e) => WatchEvent::Error(e.to_string()),
            };
            // The receiver is gone once the subscription is dropped.
            let _ = tx.send(event);
        })
        .map_err(Self::map_notify_error)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| {
                warn!(path = ?root, error = %e, "Failed to start recursive watch");
                Self::map_notify_error(e)
            })?;

        debug!(path = ?root, "Started recursive watch");
        Ok(WatchSubscription::new(rx, Box::new(watcher)))
    }
}
