//! Bibliographic Catalog Abstraction
//!
//! Domain model for a remote reference catalog (collections, items and their
//! attachments) and the [`CatalogProvider`] trait the sync engine consumes.
//! Providers translate their own wire format into these types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Content type carried by PDF attachments.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A named grouping of items. Collections nest through `parent_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub key: String,
    pub name: String,
    /// `None` marks a root collection.
    pub parent_key: Option<String>,
    pub item_count: u32,
}

impl Collection {
    pub fn is_root(&self) -> bool {
        self.parent_key.is_none()
    }
}

/// A contributor to an item, tagged with its role (author, editor, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub creator_type: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Single-field name, used by institutional creators.
    pub name: Option<String>,
}

impl Creator {
    pub fn is_author(&self) -> bool {
        self.creator_type == "author"
    }

    /// Last name when present, otherwise the single-field name.
    pub fn display_last_name(&self) -> Option<&str> {
        self.last_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// A bibliographic record (paper, book, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub item_type: String,
    pub title: String,
    pub creators: Vec<Creator>,
    /// Free-form date string as entered in the catalog.
    pub date: String,
    pub abstract_note: String,
    /// Keys of every collection the item belongs to.
    pub collections: Vec<String>,
}

impl Item {
    /// Attachments and notes are child records, not part of the working set.
    pub fn is_top_level(&self) -> bool {
        !matches!(self.item_type.as_str(), "attachment" | "note")
    }
}

/// A file attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub key: String,
    pub parent_key: Option<String>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub title: Option<String>,
}

impl Attachment {
    /// A PDF attachment with a filename on disk.
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_CONTENT_TYPE)
            && self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Location of the stored file: `{storage_root}/{key}/{filename}`.
    pub fn source_path(&self, storage_root: &Path) -> Option<PathBuf> {
        self.filename
            .as_deref()
            .map(|filename| storage_root.join(&self.key).join(filename))
    }
}

/// Result of a single pass over the raw item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemsWithAttachments {
    /// Top-level items only.
    pub items: Vec<Item>,
    /// Parent item key to its PDF attachment. The last PDF seen for a parent wins.
    pub attachments: HashMap<String, Attachment>,
}

/// Remote catalog trait
///
/// Abstracts a bibliographic catalog service. Every call is a fresh read;
/// implementations do not cache between calls and do not retry.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::CatalogProvider;
///
/// async fn count_roots(catalog: &dyn CatalogProvider) -> Result<usize> {
///     let collections = catalog.fetch_collections().await?;
///     Ok(collections.iter().filter(|c| c.is_root()).count())
/// }
/// ```
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch every collection.
    async fn fetch_collections(&self) -> Result<Vec<Collection>>;

    /// Fetch every top-level item, following pagination until a short page.
    async fn fetch_all_items(&self) -> Result<Vec<Item>>;

    /// Fetch all records in one paginated pass, optionally scoped to a
    /// collection, and split them into items and a PDF attachment map.
    async fn fetch_items_with_attachments(
        &self,
        collection_key: Option<&str>,
    ) -> Result<ItemsWithAttachments>;

    /// Fetch the attachment children of one item.
    async fn fetch_attachments(&self, parent_key: &str) -> Result<Vec<Attachment>>;

    /// Returns `true` if the catalog answers a minimal request.
    async fn test_connection(&self) -> bool;

    /// Point subsequent calls at a different service root.
    fn set_base_url(&self, base_url: &str);
}
