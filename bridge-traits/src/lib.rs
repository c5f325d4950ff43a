//! # Host Bridge Traits
//!
//! Capability contracts between the library-mirror core and the host it runs in.
//!
//! ## Overview
//!
//! The core never talks to the network, the disk or the platform file
//! watcher directly. Each capability it needs is a trait here, and each host
//! ships concrete adapters (see `bridge-desktop`).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Single-attempt async GET requests
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for placing and pruning PDFs
//! - [`ChangeWatcher`](watch::ChangeWatcher) - Recursive directory change notifications
//!
//! ### Catalog
//! - [`CatalogProvider`](catalog::CatalogProvider) - Collections, items and attachments
//!   of a remote bibliographic catalog
//!
//! ### Utilities
//! - [`ProgressSink`](progress::ProgressSink) - Human-readable progress lines
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations should
//! convert platform-specific errors to `BridgeError` and keep context such as
//! file paths, URLs and HTTP status codes.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared across
//! async tasks behind an `Arc`.

pub mod catalog;
pub mod error;
pub mod http;
pub mod logging;
pub mod progress;
pub mod storage;
pub mod watch;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{Attachment, CatalogProvider, Collection, Creator, Item, ItemsWithAttachments};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use progress::{NoopProgress, ProgressSink};
pub use storage::{FileMetadata, FileSystemAccess};
pub use watch::{ChangeWatcher, WatchEvent, WatchSubscription};
