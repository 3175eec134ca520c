use servertag_core::errors::{Result, ServerTagError};
use servertag_core::{
    Command, HistoryEvent, HistorySearchResult, Host, HostStore, MemoryStore, OnMissing,
    RequestMeta, Tag,
};

/// Store pre-populated with the given hosts and tags
#[allow(dead_code)]
pub fn seeded_store(hosts: &[(&str, &[&str])]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for &(name, tags) in hosts {
        let mut host = Host::new(name).unwrap();
        host.set_tags_by_name(tags).unwrap();
        host.save(&mut store).unwrap();
    }
    store
}

#[allow(dead_code)]
pub fn add_cmd(hosts: &[&str], tags: &[&str]) -> Command {
    Command::AddTags {
        hosts: to_strings(hosts),
        tags: to_strings(tags),
        on_missing: OnMissing::New,
    }
}

#[allow(dead_code)]
pub fn remove_cmd(hosts: &[&str], tags: &[&str]) -> Command {
    Command::RemoveTags {
        hosts: to_strings(hosts),
        tags: to_strings(tags),
    }
}

#[allow(dead_code)]
pub fn rest_meta() -> RequestMeta {
    RequestMeta::new("dan", "rest", "127.0.0.1")
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Wraps a `MemoryStore` and rejects the first `conflicts` upserts, as a
/// store does when another writer got there first
#[allow(dead_code)]
pub struct ConflictingStore {
    pub inner: MemoryStore,
    conflicts: u32,
    // Only upserts of this host conflict when set
    conflict_host: Option<String>,
    pub upsert_attempts: u32,
}

#[allow(dead_code)]
impl ConflictingStore {
    pub fn new(inner: MemoryStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts,
            conflict_host: None,
            upsert_attempts: 0,
        }
    }

    /// Reject the first `conflicts` upserts of `host_name` only
    pub fn on_host(inner: MemoryStore, host_name: &str, conflicts: u32) -> Self {
        Self {
            conflict_host: Some(host_name.to_string()),
            ..Self::new(inner, conflicts)
        }
    }

    fn should_conflict(&self, host: &Host) -> bool {
        self.conflicts > 0
            && self
                .conflict_host
                .as_deref()
                .map_or(true, |name| name == host.name())
    }
}

impl HostStore for ConflictingStore {
    fn find_host_by_name(&self, name: &str) -> Result<Host> {
        self.inner.find_host_by_name(name)
    }

    fn find_all_hosts(&self) -> Result<Vec<Host>> {
        self.inner.find_all_hosts()
    }

    fn find_hosts_by_tags(&self, tags: &[Tag]) -> Result<Vec<Host>> {
        self.inner.find_hosts_by_tags(tags)
    }

    fn upsert_host(&mut self, host: &Host, expected_version: Option<u64>) -> Result<u64> {
        self.upsert_attempts += 1;
        if self.should_conflict(host) {
            self.conflicts -= 1;
            return Err(ServerTagError::Conflict {
                host_name: host.name().to_string(),
                expected: expected_version,
                actual: expected_version.map_or(Some(1), |v| Some(v + 1)),
            });
        }
        self.inner.upsert_host(host, expected_version)
    }

    fn delete_host(&mut self, host: &Host) -> Result<()> {
        self.inner.delete_host(host)
    }

    fn index_history_event(&mut self, event: &HistoryEvent) -> Result<()> {
        self.inner.index_history_event(event)
    }

    fn most_recent_history(&self, n: usize) -> Result<HistorySearchResult> {
        self.inner.most_recent_history(n)
    }
}

/// A store whose backend is down: reads work, every write fails
#[allow(dead_code)]
pub struct BrokenStore {
    pub inner: MemoryStore,
    pub upsert_attempts: u32,
}

#[allow(dead_code)]
impl BrokenStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            upsert_attempts: 0,
        }
    }

    fn unavailable() -> ServerTagError {
        ServerTagError::Persistence {
            message: "connection refused".to_string(),
        }
    }
}

impl HostStore for BrokenStore {
    fn find_host_by_name(&self, name: &str) -> Result<Host> {
        self.inner.find_host_by_name(name)
    }

    fn find_all_hosts(&self) -> Result<Vec<Host>> {
        self.inner.find_all_hosts()
    }

    fn find_hosts_by_tags(&self, tags: &[Tag]) -> Result<Vec<Host>> {
        self.inner.find_hosts_by_tags(tags)
    }

    fn upsert_host(&mut self, _host: &Host, _expected_version: Option<u64>) -> Result<u64> {
        self.upsert_attempts += 1;
        Err(Self::unavailable())
    }

    fn delete_host(&mut self, _host: &Host) -> Result<()> {
        Err(Self::unavailable())
    }

    fn index_history_event(&mut self, _event: &HistoryEvent) -> Result<()> {
        Err(Self::unavailable())
    }

    fn most_recent_history(&self, n: usize) -> Result<HistorySearchResult> {
        self.inner.most_recent_history(n)
    }
}
