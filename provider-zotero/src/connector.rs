//! Zotero local API connector
//!
//! Implements the `CatalogProvider` trait against the HTTP API the Zotero
//! desktop client serves on `localhost:23119`.

use async_trait::async_trait;
use bridge_traits::catalog::{
    Attachment, CatalogProvider, Collection, Item, ItemsWithAttachments,
};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ZoteroError};
use crate::types::{ZoteroCollection, ZoteroRecord};

/// Default address of the Zotero desktop client's local API
pub const DEFAULT_BASE_URL: &str = "http://localhost:23119";

/// Path of the local user's library below the base URL
const LIBRARY_PREFIX: &str = "/api/users/0";

/// Records per page; a shorter page ends pagination
pub const PAGE_SIZE: usize = 100;

/// Server-side filter that drops child records
const TOP_LEVEL_FILTER: &str = "-attachment || -note";

/// Zotero local API connector
///
/// Every call is a single GET with no timeout and no retry. Any status other
/// than 200 fails with [`ZoteroError::Unavailable`].
///
/// # Example
///
/// ```ignore
/// use provider_zotero::ZoteroClient;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let client = ZoteroClient::new(http_client, "http://localhost:23119");
/// let collections = client.fetch_collections().await?;
/// ```
pub struct ZoteroClient {
    http_client: Arc<dyn HttpClient>,
    base_url: RwLock<String>,
}

impl ZoteroClient {
    /// Create a new connector; a trailing slash on `base_url` is ignored.
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: RwLock::new(Self::normalize_base_url(base_url)),
        }
    }

    /// Connector for the default local address
    pub fn with_default_url(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, DEFAULT_BASE_URL)
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn normalize_base_url(base_url: &str) -> String {
        base_url.trim().trim_end_matches('/').to_string()
    }

    /// `{base}/api/users/0{path}?{params}`
    fn library_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}{}", self.base_url(), LIBRARY_PREFIX, path);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    async fn get(&self, url: String) -> Result<HttpResponse> {
        debug!(url = %url, "GET");

        let response = self
            .http_client
            .execute(HttpRequest::get(url.clone()))
            .await
            .map_err(|e| ZoteroError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if response.status != 200 {
            warn!(status = response.status, url = %url, "Zotero API request failed");
            return Err(ZoteroError::Unavailable {
                status_code: response.status,
                url,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self.get(url.clone()).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| ZoteroError::ParseError(format!("{}: {}", url, e)))
    }

    /// Follow `start` offsets until a page comes back shorter than [`PAGE_SIZE`].
    async fn paginate(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<ZoteroRecord>> {
        let mut all = Vec::new();
        let mut start = 0usize;

        loop {
            let mut params = vec![
                ("format", "json".to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("start", start.to_string()),
            ];
            params.extend(extra.iter().cloned());

            let batch: Vec<ZoteroRecord> = self.get_json(self.library_url(path, &params)).await?;
            let count = batch.len();
            all.extend(batch);

            debug!(path, start, count, "Fetched page");
            if count < PAGE_SIZE {
                break;
            }
            start += PAGE_SIZE;
        }

        Ok(all)
    }

    fn items_path(collection_key: Option<&str>) -> String {
        match collection_key {
            Some(key) => format!("/collections/{}/items", key),
            None => "/items".to_string(),
        }
    }

    fn convert_items(records: Vec<ZoteroRecord>) -> Result<Vec<Item>> {
        records
            .into_iter()
            .filter(|r| !r.is_attachment() && !r.is_note())
            .map(ZoteroRecord::into_item)
            .collect()
    }

    /// Split a mixed listing into top-level items and a parent-to-PDF map.
    ///
    /// Only PDF attachments with both a filename and a parent are kept; when
    /// a parent has several, the last one in listing order wins.
    pub fn partition_records(records: Vec<ZoteroRecord>) -> Result<ItemsWithAttachments> {
        let mut items = Vec::new();
        let mut attachments = HashMap::new();

        for record in records {
            if record.is_attachment() {
                let attachment = record.into_attachment()?;
                if !attachment.is_pdf() {
                    continue;
                }
                if let Some(parent) = attachment.parent_key.clone() {
                    attachments.insert(parent, attachment);
                }
            } else if !record.is_note() {
                items.push(record.into_item()?);
            }
        }

        Ok(ItemsWithAttachments { items, attachments })
    }

    #[instrument(skip(self))]
    pub async fn collections(&self) -> Result<Vec<Collection>> {
        let url = self.library_url("/collections", &[("format", "json".to_string())]);
        let raw: Vec<ZoteroCollection> = self.get_json(url).await?;

        let collections = raw
            .into_iter()
            .map(ZoteroCollection::into_collection)
            .collect::<Result<Vec<_>>>()?;

        info!(count = collections.len(), "Fetched collections");
        Ok(collections)
    }

    #[instrument(skip(self))]
    pub async fn all_items(&self) -> Result<Vec<Item>> {
        let records = self
            .paginate("/items", &[("itemType", TOP_LEVEL_FILTER.to_string())])
            .await?;
        let items = Self::convert_items(records)?;

        info!(count = items.len(), "Fetched items");
        Ok(items)
    }

    /// Every top-level item filed in one collection
    #[instrument(skip(self))]
    pub async fn collection_items(&self, collection_key: &str) -> Result<Vec<Item>> {
        let path = Self::items_path(Some(collection_key));
        let records = self
            .paginate(&path, &[("itemType", TOP_LEVEL_FILTER.to_string())])
            .await?;
        Self::convert_items(records)
    }

    #[instrument(skip(self))]
    pub async fn items_with_attachments(
        &self,
        collection_key: Option<&str>,
    ) -> Result<ItemsWithAttachments> {
        let records = self.paginate(&Self::items_path(collection_key), &[]).await?;
        let result = Self::partition_records(records)?;

        info!(
            items = result.items.len(),
            pdfs = result.attachments.len(),
            "Fetched items with attachments"
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn attachments(&self, parent_key: &str) -> Result<Vec<Attachment>> {
        let url = self.library_url(
            &format!("/items/{}/children", parent_key),
            &[
                ("format", "json".to_string()),
                ("itemType", "attachment".to_string()),
            ],
        );
        let records: Vec<ZoteroRecord> = self.get_json(url).await?;

        records
            .into_iter()
            .filter(ZoteroRecord::is_attachment)
            .map(ZoteroRecord::into_attachment)
            .collect()
    }

    /// Single page of top-level items matching `query` on title, creator or year.
    #[instrument(skip(self))]
    pub async fn search_items(&self, query: &str) -> Result<Vec<Item>> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("itemType", TOP_LEVEL_FILTER.to_string()),
        ];
        if !query.is_empty() {
            params.push(("q", query.to_string()));
            params.push(("qmode", "titleCreatorYear".to_string()));
        }

        let records: Vec<ZoteroRecord> = self.get_json(self.library_url("/items", &params)).await?;
        Self::convert_items(records)
    }

    /// BibTeX export of one item, as returned by the server.
    #[instrument(skip(self))]
    pub async fn fetch_item_bibtex(&self, item_key: &str) -> Result<String> {
        let url = self.library_url(
            &format!("/items/{}", item_key),
            &[("format", "bibtex".to_string())],
        );
        let response = self.get(url).await?;
        Ok(response.text()?)
    }

    pub async fn ping(&self) -> bool {
        let url = self.library_url(
            "/items",
            &[("limit", "1".to_string()), ("format", "json".to_string())],
        );
        match self.get(url).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Zotero connection test failed");
                false
            }
        }
    }
}

#[async_trait]
impl CatalogProvider for ZoteroClient {
    async fn fetch_collections(&self) -> BridgeResult<Vec<Collection>> {
        Ok(self.collections().await?)
    }

    async fn fetch_all_items(&self) -> BridgeResult<Vec<Item>> {
        Ok(self.all_items().await?)
    }

    async fn fetch_items_with_attachments(
        &self,
        collection_key: Option<&str>,
    ) -> BridgeResult<ItemsWithAttachments> {
        Ok(self.items_with_attachments(collection_key).await?)
    }

    async fn fetch_attachments(&self, parent_key: &str) -> BridgeResult<Vec<Attachment>> {
        Ok(self.attachments(parent_key).await?)
    }

    async fn test_connection(&self) -> bool {
        self.ping().await
    }

    fn set_base_url(&self, base_url: &str) {
        let normalized = Self::normalize_base_url(base_url);
        info!(base_url = %normalized, "Zotero base URL updated");
        *self
            .base_url
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = normalized;
    }
}
