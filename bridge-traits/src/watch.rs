//! Filesystem Change Watching
//!
//! A recursive watch over a directory tree that delivers raw change
//! notifications on a channel. Consumers debounce; watchers never coalesce.

use std::any::Any;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::error::Result;

/// A raw notification from the platform watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Something below the watched root changed.
    Changed(Vec<PathBuf>),
    /// The watcher reported an error but keeps running.
    Error(String),
}

/// An active watch. Dropping it stops the underlying watcher.
pub struct WatchSubscription {
    events: mpsc::UnboundedReceiver<WatchEvent>,
    _guard: Box<dyn Any + Send>,
}

impl WatchSubscription {
    /// `guard` is whatever keeps the platform watcher alive.
    pub fn new(events: mpsc::UnboundedReceiver<WatchEvent>, guard: Box<dyn Any + Send>) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Next event, or `None` once the watcher has shut down.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription").finish_non_exhaustive()
    }
}

/// Recursive directory watcher
///
/// # Errors
///
/// `watch` fails when the root does not exist or the platform refuses the
/// watch. Callers are expected to fall back to polling.
pub trait ChangeWatcher: Send + Sync {
    fn watch(&self, root: &Path) -> Result<WatchSubscription>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = WatchSubscription::new(rx, Box::new(()));

        tx.send(WatchEvent::Changed(vec![PathBuf::from("/storage/ABCD/x.pdf")]))
            .unwrap();
        drop(tx);

        assert!(matches!(sub.next().await, Some(WatchEvent::Changed(_))));
        assert_eq!(sub.next().await, None);
    }
}
