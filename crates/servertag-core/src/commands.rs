//! Command types for every mutating host operation
//!
//! Commands are processed by [`crate::apply::apply`], which runs the matching
//! workflow and writes one history event for the whole command.

use serde::{Deserialize, Serialize};

use crate::ops::OnMissing;

/// A single mutating request against the host store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Add tags to hosts, optionally creating hosts that do not exist
    AddTags {
        hosts: Vec<String>,
        tags: Vec<String>,
        #[serde(default)]
        on_missing: OnMissing,
    },

    /// Remove tags from hosts; hosts left without tags are deleted
    RemoveTags { hosts: Vec<String>, tags: Vec<String> },

    /// Delete a host outright
    DeleteHost { host: String },
}

impl Command {
    /// Operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::AddTags { .. } => "add_tags",
            Command::RemoveTags { .. } => "remove_tags",
            Command::DeleteHost { .. } => "delete_host",
        }
    }
}
