//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`
//! - `ChangeWatcher` using `notify`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{NotifyChangeWatcher, ReqwestHttpClient, TokioFileSystem};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = Arc::new(ReqwestHttpClient::new());
//!     let fs = Arc::new(TokioFileSystem::new());
//!     let watcher = Arc::new(NotifyChangeWatcher::new());
//!
//!     // Hand these to the core service
//! }
//! ```

mod filesystem;
mod http;
mod watcher;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use watcher::NotifyChangeWatcher;
