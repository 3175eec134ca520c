//! Audit diff rendering.
//!
//! Turns per-host tag changes into grouped, human-readable sentences:
//!
//! ```
//! use servertag_core::diff::{render_tag_diffs, ChangeKind};
//!
//! let changes = vec![
//!     ("cleon".to_string(), vec!["foo".to_string()]),
//!     ("swan".to_string(), vec!["foo".to_string()]),
//! ];
//! let lines = render_tag_diffs(ChangeKind::Add, &changes);
//! assert_eq!(lines, vec!["Added tag(s) 'foo' to host(s) 'cleon' and 'swan'"]);
//! ```
//!
//! Hosts whose change lists are identical (same names, same order) share
//! one sentence. Hosts with an empty change list never render a line.

pub mod model;
pub mod render;

pub use model::{ChangeGroup, ChangeKind};
pub use render::{format_list, group_changes, render_tag_diffs};
