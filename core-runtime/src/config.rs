//! # Mirror Configuration Module
//!
//! Provides configuration management for the library mirror.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`MirrorConfig`]. Every field except the vault root has a default that
//! matches a stock Zotero desktop install. `build()` validates eagerly so a
//! bad setting fails at startup, not halfway through a sync pass.
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | `catalog_base_url` | `http://localhost:23119` |
//! | `storage_path` | `~/Zotero/storage` |
//! | `library_dir` | `Library` |
//! | `debounce` | 5000 ms |
//! | `poll_interval` | 30000 ms |
//! | `attachment_lookup` | `PerItem` |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::MirrorConfig;
//!
//! let config = MirrorConfig::builder()
//!     .vault_root("/home/me/vault")
//!     .storage_path("~/Zotero/storage")
//!     .build()?;
//! ```
//!
//! Host settings stored as JSON (camelCase keys) can be loaded with
//! [`HostSettings::from_json`] and turned into a builder.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default address of the catalog's local API
pub const DEFAULT_CATALOG_BASE_URL: &str = "http://localhost:23119";

/// Default vault-relative folder that receives the mirrored tree
pub const DEFAULT_LIBRARY_DIR: &str = "Library";

/// Quiet period after the last filesystem event before a pass starts
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5_000);

/// Fixed interval of the safety-net poll
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// How a sync pass finds each item's PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentLookup {
    /// One children request per item; the first PDF found is used.
    #[default]
    PerItem,
    /// One paginated listing of every record; the last PDF per parent wins.
    Prefetched,
}

/// Library mirror configuration.
///
/// Use [`MirrorConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Root of the catalog's HTTP API, without trailing slash
    pub catalog_base_url: String,

    /// Catalog attachment storage, `~` already expanded
    pub storage_path: PathBuf,

    /// Absolute path of the vault
    pub vault_root: PathBuf,

    /// Vault-relative folder that receives the mirrored tree
    pub library_dir: PathBuf,

    pub debounce: Duration,

    pub poll_interval: Duration,

    pub attachment_lookup: AttachmentLookup,
}

impl MirrorConfig {
    /// Creates a new builder for constructing a `MirrorConfig`.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Absolute path of the library folder.
    pub fn library_root(&self) -> PathBuf {
        self.vault_root.join(&self.library_dir)
    }

    /// Whether moving from `self` to `other` needs the watcher and poll rebuilt.
    ///
    /// Every surfaced setting feeds either the watch root, the timers or the
    /// client, so any difference counts.
    pub fn requires_restart(&self, other: &MirrorConfig) -> bool {
        self != other
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Base URL is an http(s) URL
    /// - Storage path and vault root are not empty
    /// - Library dir is relative and does not escape the vault
    /// - Both intervals are non-zero
    pub fn validate(&self) -> Result<()> {
        let url = self.catalog_base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Catalog base URL must start with http:// or https://, got '{}'",
                url
            )));
        }

        if self.storage_path.as_os_str().is_empty() {
            return Err(Error::Config("Storage path cannot be empty".to_string()));
        }

        if self.vault_root.as_os_str().is_empty() {
            return Err(Error::Config("Vault root cannot be empty".to_string()));
        }

        if self.library_dir.as_os_str().is_empty() {
            return Err(Error::Config("Library folder cannot be empty".to_string()));
        }

        let escapes = self
            .library_dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::Config(format!(
                "Library folder must be a relative path inside the vault, got '{}'",
                self.library_dir.display()
            )));
        }

        if self.debounce.is_zero() {
            return Err(Error::Config(
                "Debounce interval must be greater than 0ms".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "Poll interval must be greater than 0ms".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Only `~` and `~/...` are expanded; `~user` is returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_default();

    if path == "~" {
        return home();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home().join(rest);
    }
    PathBuf::from(path)
}

/// `~/Zotero/storage`
pub fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Zotero")
        .join("storage")
}

/// Builder for constructing [`MirrorConfig`] instances.
///
/// Call [`build()`](MirrorConfigBuilder::build) to validate and create the
/// final config.
#[derive(Debug, Default, Clone)]
pub struct MirrorConfigBuilder {
    catalog_base_url: Option<String>,
    storage_path: Option<String>,
    vault_root: Option<PathBuf>,
    library_dir: Option<PathBuf>,
    debounce: Option<Duration>,
    poll_interval: Option<Duration>,
    attachment_lookup: Option<AttachmentLookup>,
}

impl MirrorConfigBuilder {
    /// Sets the catalog API root. A trailing slash is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::MirrorConfig;
    ///
    /// let builder = MirrorConfig::builder()
    ///     .catalog_base_url("http://localhost:23119");
    /// ```
    pub fn catalog_base_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_base_url = Some(url.into());
        self
    }

    /// Sets the catalog attachment storage path.
    ///
    /// A leading `~` is expanded at build time. An empty string keeps the
    /// default.
    pub fn storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Sets the vault root (required).
    pub fn vault_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.vault_root = Some(path.into());
        self
    }

    /// Sets the vault-relative library folder.
    ///
    /// Default: `Library`
    pub fn library_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_dir = Some(path.into());
        self
    }

    /// Default: 5000 ms
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    /// Default: 30000 ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn attachment_lookup(mut self, lookup: AttachmentLookup) -> Self {
        self.attachment_lookup = Some(lookup);
        self
    }

    /// Builds the final `MirrorConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(MirrorConfig)` on success, or [`Error::Config`] if the
    /// vault root is missing or any value fails validation.
    pub fn build(self) -> Result<MirrorConfig> {
        let vault_root = self.vault_root.ok_or_else(|| {
            Error::Config("Vault root is required. Use .vault_root() to set it.".to_string())
        })?;

        let storage_path = match self.storage_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => expand_home(path),
            _ => default_storage_path(),
        };

        let library_dir = self
            .library_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR));

        let catalog_base_url = self
            .catalog_base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string());

        let config = MirrorConfig {
            catalog_base_url,
            storage_path,
            vault_root,
            library_dir,
            debounce: self.debounce.unwrap_or(DEFAULT_DEBOUNCE),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            attachment_lookup: self.attachment_lookup.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

/// Catalog settings as a host persists them.
///
/// Empty strings mean "use the default", matching how settings screens
/// store untouched fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSettings {
    pub api_base_url: String,
    pub zotero_storage_path: String,
    pub library_vault_path: String,
    pub debounce_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub attachment_lookup: Option<AttachmentLookup>,
}

impl HostSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid settings JSON: {}", e)))
    }

    /// Read and parse a JSON settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Builder pre-filled from these settings. The vault root still has to be set.
    pub fn to_builder(&self) -> MirrorConfigBuilder {
        let mut builder = MirrorConfig::builder()
            .catalog_base_url(self.api_base_url.clone())
            .storage_path(self.zotero_storage_path.clone());

        if !self.library_vault_path.trim().is_empty() {
            builder = builder.library_dir(self.library_vault_path.trim());
        }
        if let Some(ms) = self.debounce_ms {
            builder = builder.debounce(Duration::from_millis(ms));
        }
        if let Some(ms) = self.poll_interval_ms {
            builder = builder.poll_interval(Duration::from_millis(ms));
        }
        if let Some(lookup) = self.attachment_lookup {
            builder = builder.attachment_lookup(lookup);
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = MirrorConfig::builder()
            .vault_root("/vault")
            .build()
            .unwrap();

        assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_BASE_URL);
        assert_eq!(config.library_dir, PathBuf::from("Library"));
        assert_eq!(config.library_root(), PathBuf::from("/vault/Library"));
        assert_eq!(config.debounce, Duration::from_millis(5000));
        assert_eq!(config.poll_interval, Duration::from_millis(30000));
        assert_eq!(config.attachment_lookup, AttachmentLookup::PerItem);
        assert!(config.storage_path.ends_with("Zotero/storage"));
    }

    #[test]
    fn test_missing_vault_root() {
        let err = MirrorConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("Vault root is required"));
    }

    #[test]
    fn test_tilde_expansion() {
        let home = dirs::home_dir().unwrap_or_default();

        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/Zotero/storage"), home.join("Zotero/storage"));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_trailing_slash_dropped() {
        let config = MirrorConfig::builder()
            .vault_root("/vault")
            .catalog_base_url("http://127.0.0.1:23119/")
            .build()
            .unwrap();
        assert_eq!(config.catalog_base_url, "http://127.0.0.1:23119");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let base = || MirrorConfig::builder().vault_root("/vault");

        assert!(base().catalog_base_url("localhost:23119").build().is_err());
        assert!(base().library_dir("../outside").build().is_err());
        assert!(base().library_dir("/abs").build().is_err());
        assert!(base().debounce(Duration::ZERO).build().is_err());
        assert!(base().poll_interval(Duration::ZERO).build().is_err());
        assert!(base().library_dir("Papers/Zotero").build().is_ok());
    }

    #[test]
    fn test_requires_restart() {
        let a = MirrorConfig::builder().vault_root("/vault").build().unwrap();
        let b = MirrorConfig::builder()
            .vault_root("/vault")
            .storage_path("/elsewhere")
            .build()
            .unwrap();

        assert!(!a.requires_restart(&a.clone()));
        assert!(a.requires_restart(&b));
    }

    #[test]
    fn test_host_settings_json() {
        let json = r#"{
            "apiBaseUrl": "http://localhost:23119",
            "zoteroStoragePath": "",
            "libraryVaultPath": "Papers",
            "selectedCollection": "",
            "pollIntervalMs": 60000
        }"#;

        let settings = HostSettings::from_json(json).unwrap();
        let config = settings.to_builder().vault_root("/vault").build().unwrap();

        assert_eq!(config.library_dir, PathBuf::from("Papers"));
        assert_eq!(config.poll_interval, Duration::from_millis(60000));
        assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
        assert_eq!(config.storage_path, default_storage_path());
    }

    #[test]
    fn test_host_settings_empty_library_path_falls_back() {
        let settings = HostSettings::default();
        let config = settings.to_builder().vault_root("/vault").build().unwrap();
        assert_eq!(config.library_dir, PathBuf::from(DEFAULT_LIBRARY_DIR));
    }
}
