//! ServerTag Core - host tagging and audit history
//!
//! This crate provides the domain logic behind the ServerTag service:
//! - Tag normalization and `prefix:suffix` exclusivity
//! - Pure add/remove reconciliation of a host's tag set
//! - Per-request change logs rendered into grouped audit sentences
//! - History events and the `HostStore` persistence boundary
//! - Layered TOML configuration and structured logging
//!
//! The web layer, templates and concrete database clients live elsewhere.

pub mod apply;
pub mod changelog;
pub mod commands;
pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod render;

// Logging macros name schema constants through this path
pub use servertag_core_types;

// Re-export commonly used types
pub use apply::{apply, apply_with_config, apply_with_retry, ApplyOutcome, RequestMeta};
pub use changelog::ChangeLog;
pub use commands::Command;
pub use config::ServerConfig;
pub use errors::{ExError, ExErrorKind, Result, ServerTagError};
pub use model::{HistoryEvent, Host, Tag, TagSet};
pub use ops::{recent_history, HistorySearchResult, HostStore, MemoryStore, OnMissing};
