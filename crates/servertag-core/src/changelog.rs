//! Per-request accumulator of host and tag changes
//!
//! A `ChangeLog` is created once per logical request, fed by every host
//! operation in that request, and consumed exactly once by
//! [`ChangeLog::render_diffs`] to produce the lines of one history event.
//!
//! ```
//! use servertag_core::ChangeLog;
//!
//! let mut log = ChangeLog::new();
//! log.record_host_created("cleon");
//! log.record_tags_added("cleon", ["foo", "bar"]);
//! assert_eq!(
//!     log.render_diffs(),
//!     vec![
//!         "Created host 'cleon'".to_string(),
//!         "Added tag(s) 'foo' and 'bar' to host(s) 'cleon'".to_string(),
//!     ]
//! );
//! ```

use crate::diff::{render_tag_diffs, ChangeKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLog {
    hosts_created: Vec<String>,
    hosts_deleted: Vec<String>,
    /// Host name to added tag names, in first-recorded host order
    tags_added: Vec<(String, Vec<String>)>,
    tags_removed: Vec<(String, Vec<String>)>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the creation of a host (not the tags it was created with)
    pub fn record_host_created(&mut self, host_name: impl Into<String>) {
        self.hosts_created.push(host_name.into());
    }

    pub fn record_host_deleted(&mut self, host_name: impl Into<String>) {
        self.hosts_deleted.push(host_name.into());
    }

    /// Append to the tags added to `host_name` in this request
    pub fn record_tags_added<I, S>(&mut self, host_name: &str, tag_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        append_entry(&mut self.tags_added, host_name, tag_names);
    }

    /// Append to the tags removed from `host_name` in this request
    pub fn record_tags_removed<I, S>(&mut self, host_name: &str, tag_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        append_entry(&mut self.tags_removed, host_name, tag_names);
    }

    pub fn hosts_created(&self) -> &[String] {
        &self.hosts_created
    }

    pub fn hosts_deleted(&self) -> &[String] {
        &self.hosts_deleted
    }

    /// Accumulated added tag names for one host
    pub fn tags_added_to(&self, host_name: &str) -> &[String] {
        lookup(&self.tags_added, host_name)
    }

    pub fn tags_removed_from(&self, host_name: &str) -> &[String] {
        lookup(&self.tags_removed, host_name)
    }

    /// True if rendering would produce no lines
    pub fn is_empty(&self) -> bool {
        self.hosts_created.is_empty()
            && self.hosts_deleted.is_empty()
            && self.tags_added.iter().all(|(_, tags)| tags.is_empty())
            && self.tags_removed.iter().all(|(_, tags)| tags.is_empty())
    }

    /// Append every entry of `other`, accumulating per-host tag lists
    pub fn merge(&mut self, other: ChangeLog) {
        self.hosts_created.extend(other.hosts_created);
        self.hosts_deleted.extend(other.hosts_deleted);
        for (host_name, tags) in other.tags_added {
            append_entry(&mut self.tags_added, &host_name, tags);
        }
        for (host_name, tags) in other.tags_removed {
            append_entry(&mut self.tags_removed, &host_name, tags);
        }
    }

    /// Drop every entry whose host fails `keep`
    pub fn retain_hosts<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.hosts_created.retain(|h| keep(h.as_str()));
        self.hosts_deleted.retain(|h| keep(h.as_str()));
        self.tags_added.retain(|(h, _)| keep(h.as_str()));
        self.tags_removed.retain(|(h, _)| keep(h.as_str()));
    }

    /// Render every recorded change as audit sentences
    ///
    /// Order: created hosts, deleted hosts, grouped additions, grouped
    /// removals. Consumes the log.
    pub fn render_diffs(self) -> Vec<String> {
        let mut diffs: Vec<String> = self
            .hosts_created
            .iter()
            .map(|h| format!("Created host '{h}'"))
            .collect();
        diffs.extend(self.hosts_deleted.iter().map(|h| format!("Deleted host '{h}'")));
        diffs.extend(render_tag_diffs(ChangeKind::Add, &self.tags_added));
        diffs.extend(render_tag_diffs(ChangeKind::Remove, &self.tags_removed));
        diffs
    }
}

fn append_entry<I, S>(entries: &mut Vec<(String, Vec<String>)>, host_name: &str, tag_names: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names = tag_names.into_iter().map(Into::into);
    match entries.iter_mut().find(|(h, _)| h == host_name) {
        Some((_, existing)) => existing.extend(names),
        None => entries.push((host_name.to_string(), names.collect())),
    }
}

fn lookup<'a>(entries: &'a [(String, Vec<String>)], host_name: &str) -> &'a [String] {
    entries
        .iter()
        .find(|(h, _)| h == host_name)
        .map(|(_, tags)| tags.as_slice())
        .unwrap_or_default()
}
