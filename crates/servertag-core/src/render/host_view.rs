use serde::Serialize;

use crate::model::{HistoryEvent, Host, Tag};
use crate::ops::HistorySearchResult;

/// True iff `tag` is among the names added by the current request
pub fn just_added<S: AsRef<str>>(tag: &Tag, new_tag_names: &[S]) -> bool {
    new_tag_names.iter().any(|n| n.as_ref() == tag.name())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagView {
    pub name: String,
    pub exclusive: bool,
    pub just_added: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostView {
    pub hostname: String,
    /// Sorted by name
    pub tags: Vec<TagView>,
}

impl HostView {
    pub fn from_host<S: AsRef<str>>(host: &Host, new_tag_names: &[S]) -> Self {
        let tags = host
            .tags()
            .iter()
            .map(|tag| TagView {
                name: tag.name().to_string(),
                exclusive: tag.is_exclusive(),
                just_added: just_added(tag, new_tag_names),
            })
            .collect();

        Self {
            hostname: host.name().to_string(),
            tags,
        }
    }
}

/// Response body for batch operations and searches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostListView {
    pub results: Vec<HostView>,
}

impl HostListView {
    /// Views for every host still present; deleted hosts are left out
    pub fn from_hosts<S: AsRef<str>>(hosts: &[Host], new_tag_names: &[S]) -> Self {
        Self {
            results: hosts
                .iter()
                .filter(|h| !h.is_removed())
                .map(|h| HostView::from_host(h, new_tag_names))
                .collect(),
        }
    }
}

/// Response body for the history listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub events: Vec<HistoryEvent>,
    pub total: usize,
}

impl From<HistorySearchResult> for HistoryView {
    fn from(result: HistorySearchResult) -> Self {
        Self {
            events: result.hits,
            total: result.total,
        }
    }
}
