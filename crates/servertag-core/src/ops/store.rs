use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{Result, ServerTagError};
use crate::model::{HistoryEvent, Host, Tag};

/// Persistence collaborator for hosts and history events
///
/// Writes use optimistic concurrency: every read hands back a version
/// token and a write carrying a stale token fails with `Conflict`. The
/// caller recovers by re-reading, re-applying reconciliation and saving
/// again.
pub trait HostStore {
    /// # Errors
    /// * `InvalidHostName` - If `name` is malformed
    /// * `HostNotFound` - If no host with that name is stored
    /// * `Persistence` - If the backend fails
    fn find_host_by_name(&self, name: &str) -> Result<Host>;

    /// # Errors
    /// * `Persistence` - If the backend fails
    fn find_all_hosts(&self) -> Result<Vec<Host>>;

    /// Hosts carrying every one of `tags`
    ///
    /// # Errors
    /// * `Persistence` - If the backend fails
    fn find_hosts_by_tags(&self, tags: &[Tag]) -> Result<Vec<Host>>;

    /// Insert or replace a host, returning its new version
    ///
    /// `expected_version` is `None` for a host that must not exist yet.
    ///
    /// # Errors
    /// * `Conflict` - If the stored version differs from `expected_version`
    /// * `Persistence` - If the backend fails
    fn upsert_host(&mut self, host: &Host, expected_version: Option<u64>) -> Result<u64>;

    /// # Errors
    /// * `HostNotFound` - If the host is not stored
    /// * `Conflict` - If the stored version differs from the host's version
    /// * `Persistence` - If the backend fails
    fn delete_host(&mut self, host: &Host) -> Result<()>;

    /// # Errors
    /// * `Persistence` - If the backend fails
    fn index_history_event(&mut self, event: &HistoryEvent) -> Result<()>;

    /// The `n` newest history events
    ///
    /// # Errors
    /// * `Persistence` - If the backend fails
    fn most_recent_history(&self, n: usize) -> Result<HistorySearchResult>;
}

/// A page of history events plus the total stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySearchResult {
    /// Newest first
    pub hits: Vec<HistoryEvent>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredHost {
    tag_names: Vec<String>,
    version: u64,
}

/// In-memory `HostStore`
///
/// Hosts live in a `BTreeMap`, so listings come back in name order. Not
/// thread-safe; wrap it yourself if it has to be shared.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    hosts: BTreeMap<String, StoredHost>,
    history: Vec<HistoryEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Every indexed event, oldest first
    pub fn history(&self) -> &[HistoryEvent] {
        &self.history
    }

    /// Current stored version of a host, if present
    pub fn stored_version(&self, name: &str) -> Option<u64> {
        self.hosts.get(name).map(|h| h.version)
    }

    fn hydrate(name: &str, stored: &StoredHost) -> Result<Host> {
        Host::from_stored(name, &stored.tag_names, stored.version)
    }
}

impl HostStore for MemoryStore {
    fn find_host_by_name(&self, name: &str) -> Result<Host> {
        let name = name.to_lowercase();
        Host::assert_valid_name(&name)?;

        let stored = self
            .hosts
            .get(&name)
            .ok_or_else(|| ServerTagError::HostNotFound { name: name.clone() })?;
        Self::hydrate(&name, stored)
    }

    fn find_all_hosts(&self) -> Result<Vec<Host>> {
        self.hosts
            .iter()
            .map(|(name, stored)| Self::hydrate(name, stored))
            .collect()
    }

    fn find_hosts_by_tags(&self, tags: &[Tag]) -> Result<Vec<Host>> {
        let hosts = self.find_all_hosts()?;
        Ok(hosts
            .into_iter()
            .filter(|host| tags.iter().all(|tag| host.has_tag(tag)))
            .collect())
    }

    fn upsert_host(&mut self, host: &Host, expected_version: Option<u64>) -> Result<u64> {
        let actual = self.stored_version(host.name());
        if actual != expected_version {
            return Err(ServerTagError::Conflict {
                host_name: host.name().to_string(),
                expected: expected_version,
                actual,
            });
        }

        let version = actual.map_or(1, |v| v + 1);
        self.hosts.insert(
            host.name().to_string(),
            StoredHost {
                tag_names: host.tag_names(),
                version,
            },
        );
        Ok(version)
    }

    fn delete_host(&mut self, host: &Host) -> Result<()> {
        let actual = self
            .stored_version(host.name())
            .ok_or_else(|| ServerTagError::HostNotFound {
                name: host.name().to_string(),
            })?;
        if Some(actual) != host.version() {
            return Err(ServerTagError::Conflict {
                host_name: host.name().to_string(),
                expected: host.version(),
                actual: Some(actual),
            });
        }

        self.hosts.remove(host.name());
        Ok(())
    }

    fn index_history_event(&mut self, event: &HistoryEvent) -> Result<()> {
        self.history.push(event.clone());
        Ok(())
    }

    fn most_recent_history(&self, n: usize) -> Result<HistorySearchResult> {
        // Reverse first so that, at equal timestamps, later writes sort first
        let mut hits: Vec<HistoryEvent> = self.history.iter().rev().cloned().collect();
        hits.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        hits.truncate(n);

        Ok(HistorySearchResult {
            hits,
            total: self.history.len(),
        })
    }
}
