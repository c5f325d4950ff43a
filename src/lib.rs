//! Mirror a Zotero library's PDFs into a vault folder tree.
//!
//! Host applications depend on `vault-mirror` and enable the documented
//! features instead of wiring each workspace crate individually. With the
//! default `desktop-shims` feature this re-exports [`core_service`].

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
