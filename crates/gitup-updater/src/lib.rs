//! # gitup-updater
//!
//! Update checks for extensions (plugins and themes) published on GitHub.
//!
//! This crate handles:
//! - Lenient version comparison of free-form tag names
//! - Listing repository tags through the GitHub REST API
//! - Picking the highest newer tag for each tracked extension
//! - A rolling, capacity-bounded log of failed checks
//!
//! ## Host integration
//!
//! The host supplies the extension inventory, persistence for the error log
//! and, if it has one, the update notification cache. Nothing runs on its
//! own: the host decides when to call [`UpdateChecker::run`].

pub mod config;
pub mod engine;
pub mod error;
pub mod error_log;
pub mod inventory;
#[cfg(test)]
mod proptests;
pub mod repository;
pub mod store;
pub mod tags;
pub mod version;

// Re-export main types for convenience
pub use config::{
    ErrorLogConfig, GitHubConfig, LoggingConfig, NetworkConfig, UpdateConfig,
    DEFAULT_LOG_CAPACITY, ERROR_LOG_KEY,
};
pub use engine::{select_update, UpdateChecker, UpdateDecision, UpdateTransient};
pub use error::{FetchError, FetchFailure, StoreError, UpdateError};
pub use error_log::{ErrorLog, ErrorLogEntry};
pub use inventory::{ExtensionInventory, ExtensionKind, ExtensionRecord, FileInventory};
pub use repository::{
    recognized_headers, register_headers, HeaderRegistrar, RepositoryKind, RepositoryRef,
};
pub use store::{JsonFileStore, MemoryOptionStore, OptionStore};
pub use tags::{parse_tags, GitHubTagClient, TagRecord, TagSource};
pub use version::{compare, is_newer, VersionKey};
