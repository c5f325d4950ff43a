//! # Zotero Provider
//!
//! Implements the `CatalogProvider` trait for the Zotero desktop client's
//! local HTTP API.
//!
//! ## Overview
//!
//! This module provides:
//! - Collection listing with `parentCollection: false` roots
//! - Paginated item listing (100 records per page, until a short page)
//! - Attachment lookup per item, or a single-pass parent-to-PDF map
//! - Quick search and BibTeX export for host features
//! - Schema-checked deserialization of every response

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{ZoteroClient, DEFAULT_BASE_URL, PAGE_SIZE};
pub use error::{Result, ZoteroError};
