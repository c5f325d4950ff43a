//! Zotero local API response types
//!
//! Wire records returned by the Zotero desktop client's local API
//! (`/api/users/0/...`) and their conversion into catalog domain types.
//! Required fields are enforced by serde; records that deserialize but are
//! still unusable are rejected in the `into_*` conversions.

use bridge_traits::catalog::{Attachment, Collection, Creator, Item};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoteroError};

/// `parentCollection` is either a collection key or the literal `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentCollection {
    Key(String),
    Flag(bool),
}

impl Default for ParentCollection {
    fn default() -> Self {
        ParentCollection::Flag(false)
    }
}

/// Collection statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMeta {
    #[serde(default)]
    pub num_collections: u32,
    #[serde(default)]
    pub num_items: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    pub name: String,
    #[serde(default)]
    pub parent_collection: ParentCollection,
}

/// Zotero collection resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoteroCollection {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub meta: CollectionMeta,
    pub data: CollectionData,
}

impl ZoteroCollection {
    pub fn into_collection(self) -> Result<Collection> {
        if self.key.is_empty() {
            return Err(ZoteroError::ParseError(
                "collection record without a key".to_string(),
            ));
        }

        let parent_key = match self.data.parent_collection {
            ParentCollection::Key(key) if !key.is_empty() => Some(key),
            ParentCollection::Key(_) | ParentCollection::Flag(false) => None,
            ParentCollection::Flag(true) => {
                return Err(ZoteroError::ParseError(format!(
                    "collection {} has parentCollection=true",
                    self.key
                )))
            }
        };

        Ok(Collection {
            key: self.key,
            name: self.data.name,
            parent_key,
            item_count: self.meta.num_items,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoteroCreator {
    pub creator_type: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
}

impl From<ZoteroCreator> for Creator {
    fn from(c: ZoteroCreator) -> Self {
        Creator {
            creator_type: c.creator_type,
            first_name: c.first_name,
            last_name: c.last_name,
            name: c.name,
        }
    }
}

/// The `data` object shared by regular items, attachments and notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub item_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creators: Vec<ZoteroCreator>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub abstract_note: String,
    #[serde(default)]
    pub collections: Vec<String>,

    // Attachment-only fields
    pub parent_item: Option<String>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// Zotero item resource (any item type)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoteroRecord {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    pub data: RecordData,
}

impl ZoteroRecord {
    pub fn is_attachment(&self) -> bool {
        self.data.item_type == "attachment"
    }

    pub fn is_note(&self) -> bool {
        self.data.item_type == "note"
    }

    fn check_key(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(ZoteroError::ParseError("item record without a key".to_string()));
        }
        Ok(())
    }

    pub fn into_item(self) -> Result<Item> {
        self.check_key()?;

        Ok(Item {
            key: self.key,
            item_type: self.data.item_type,
            title: self.data.title,
            creators: self.data.creators.into_iter().map(Creator::from).collect(),
            date: self.data.date,
            abstract_note: self.data.abstract_note,
            collections: self.data.collections,
        })
    }

    pub fn into_attachment(self) -> Result<Attachment> {
        self.check_key()?;

        let title = Some(self.data.title).filter(|t| !t.is_empty());
        Ok(Attachment {
            key: self.key,
            parent_key: self.data.parent_item.filter(|p| !p.is_empty()),
            content_type: self.data.content_type,
            filename: self.data.filename,
            title,
        })
    }
}
