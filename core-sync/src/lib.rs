//! # Library Sync Module
//!
//! Mirrors a bibliographic catalog into a folder tree of PDFs.
//!
//! ## Overview
//!
//! The catalog's collections become nested folders under the library root.
//! Every item's PDF is copied into each folder for a collection it belongs
//! to, under a readable `"<Author> et al. <Year>.pdf"` name. PDFs that no
//! longer correspond to a catalog item are removed, so the library is a
//! strict one-way mirror.
//!
//! ## Components
//!
//! - **Hierarchy** (`hierarchy`): Collection forest with sanitized, vault-relative folder paths
//! - **Naming** (`naming`): Deterministic filename assignment with collision numbering
//! - **Reconciler** (`reconciler`): One guarded fetch, place and prune pass
//! - **Coordinator** (`coordinator`): Storage watch, debounce and poll timers driving passes

pub mod coordinator;
pub mod error;
pub mod hierarchy;
pub mod naming;
pub mod reconciler;

pub use coordinator::{SyncCoordinator, TracingProgress};
pub use error::{Result, SyncError};
pub use hierarchy::{
    build_collection_tree, collection_paths, flatten_collection_tree, sanitize_name,
    CollectionTreeNode,
};
pub use naming::{assign_filenames, base_filename, extract_year};
pub use reconciler::{LibraryReconciler, SyncOutcome, UNSORTED_DIR};
