//! # Sync Coordinator
//!
//! Decides when reconciliation passes run.
//!
//! ## Overview
//!
//! Three sources drive the same [`LibraryReconciler::sync`] entry point:
//! - A recursive watch on the catalog storage directory. Every raw event
//!   pushes a single debounce deadline back; the pass starts only once the
//!   deadline passes without further events.
//! - A fixed-interval poll that fires regardless of watch activity. Native
//!   watchers can miss deletions, so the poll is what guarantees the library
//!   eventually converges.
//! - [`SyncCoordinator::restart`], which tears both down and recreates them
//!   from a new configuration.
//!
//! Passes triggered while one is running are dropped by the reconciler's
//! guard; nothing is queued. Stopping the coordinator prevents future passes
//! but lets an in-flight pass finish.
//!
//! When the storage directory is missing or cannot be watched the
//! coordinator logs the failure and runs on the poll alone.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{LibraryReconciler, SyncCoordinator};
//! use std::sync::Arc;
//!
//! # async fn example(reconciler: Arc<LibraryReconciler>, watcher: Arc<dyn bridge_traits::ChangeWatcher>) -> core_sync::Result<()> {
//! let coordinator = SyncCoordinator::new(reconciler, watcher);
//! coordinator.start().await?;
//!
//! // Settings changed
//! coordinator.restart(new_config).await?;
//!
//! coordinator.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::{
    reconciler::{LibraryReconciler, SyncOutcome},
    Result, SyncError,
};
use bridge_traits::{
    progress::ProgressSink,
    watch::{ChangeWatcher, WatchEvent, WatchSubscription},
};
use core_runtime::config::MirrorConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Progress sink for timer-triggered passes: every line goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str) {
        info!("[catalog sync] {}", message);
    }
}

/// Handles owned while the coordinator is running.
struct RunningState {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    watching: bool,
}

/// Owns the watch, the debounce timer and the poll timer.
pub struct SyncCoordinator {
    reconciler: Arc<LibraryReconciler>,
    watcher: Arc<dyn ChangeWatcher>,
    state: Mutex<Option<RunningState>>,
}

impl SyncCoordinator {
    pub fn new(reconciler: Arc<LibraryReconciler>, watcher: Arc<dyn ChangeWatcher>) -> Self {
        Self {
            reconciler,
            watcher,
            state: Mutex::new(None),
        }
    }

    pub fn reconciler(&self) -> &Arc<LibraryReconciler> {
        &self.reconciler
    }

    /// Start the watch and the poll timer. Does nothing if already running.
    ///
    /// A watch that cannot be established is not an error: the failure is
    /// logged and the coordinator runs in poll-only mode.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            debug!("Coordinator already running");
            return Ok(());
        }

        let config = self.reconciler.config();
        config.validate()?;

        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(2);

        let watching = match self.open_watch(&config).await {
            Ok(subscription) => {
                info!(
                    storage = %config.storage_path.display(),
                    debounce_ms = config.debounce.as_millis() as u64,
                    "Watching catalog storage"
                );
                tasks.push(tokio::spawn(debounce_loop(
                    Arc::clone(&self.reconciler),
                    subscription,
                    config.debounce,
                    cancel.clone(),
                )));
                true
            }
            Err(e) => {
                warn!(error = %e, "Continuing in poll-only mode");
                false
            }
        };

        tasks.push(tokio::spawn(poll_loop(
            Arc::clone(&self.reconciler),
            config.poll_interval,
            cancel.clone(),
        )));
        info!(
            poll_ms = config.poll_interval.as_millis() as u64,
            watching, "Sync coordinator started"
        );

        *state = Some(RunningState {
            cancel,
            tasks,
            watching,
        });
        Ok(())
    }

    async fn open_watch(&self, config: &MirrorConfig) -> Result<WatchSubscription> {
        let storage = &config.storage_path;
        let is_dir = tokio::fs::metadata(storage)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(SyncError::WatchStartFailure {
                path: storage.clone(),
                message: "storage directory does not exist".to_string(),
            });
        }

        self.watcher
            .watch(storage)
            .map_err(|e| SyncError::WatchStartFailure {
                path: storage.clone(),
                message: e.to_string(),
            })
    }

    /// Close the watch and clear both timers. A pass already running finishes.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let Some(running) = self.state.lock().await.take() else {
            return;
        };

        running.cancel.cancel();
        for task in running.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Coordinator task ended abnormally");
            }
        }
        info!("Sync coordinator stopped");
    }

    /// Full teardown and rebuild with `config`.
    ///
    /// The reconciler and catalog client pick up the new settings before the
    /// watch and poll are recreated.
    #[instrument(skip(self, config))]
    pub async fn restart(&self, config: MirrorConfig) -> Result<()> {
        config.validate()?;
        self.stop().await;
        self.reconciler.apply_config(config);
        self.start().await
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Whether the storage watch is active (false in poll-only mode).
    pub async fn is_watching(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| running.watching)
    }

    /// Run a pass now, sharing the busy guard with the timers.
    pub async fn sync_now(&self, progress: &dyn ProgressSink) -> Result<SyncOutcome> {
        self.reconciler.sync(progress).await
    }
}

/// Start a pass without blocking the caller's loop.
fn trigger_pass(reconciler: &Arc<LibraryReconciler>, reason: &'static str) {
    if reconciler.is_syncing() {
        debug!(reason, "Pass already running, trigger dropped");
        return;
    }

    let reconciler = Arc::clone(reconciler);
    tokio::spawn(async move {
        debug!(reason, "Triggering sync pass");
        if let Err(e) = reconciler.sync(&TracingProgress).await {
            error!(reason, error = %e, "Sync pass failed");
        }
    });
}

async fn debounce_loop(
    reconciler: Arc<LibraryReconciler>,
    mut subscription: WatchSubscription,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = subscription.next() => match event {
                Some(WatchEvent::Changed(paths)) => {
                    debug!(count = paths.len(), "Storage changed");
                    deadline = Some(Instant::now() + debounce);
                }
                Some(WatchEvent::Error(message)) => {
                    warn!(%message, "Storage watcher error");
                }
                None => {
                    warn!("Storage watcher closed; relying on poll");
                    break;
                }
            },
            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                trigger_pass(&reconciler, "watch");
            }
        }
    }
}

async fn poll_loop(reconciler: Arc<LibraryReconciler>, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => trigger_pass(&reconciler, "poll"),
        }
    }
}
