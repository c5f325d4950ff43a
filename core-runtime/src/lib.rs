//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the library mirror:
//! - Logging and tracing infrastructure
//! - Configuration management and host settings loading
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the validated configuration
//! shared by the sync engine and the service facade.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AttachmentLookup, HostSettings, MirrorConfig, MirrorConfigBuilder};
pub use error::{Error, Result};
