pub mod host_ops;
pub mod reconcile;
pub mod store;

pub use host_ops::{add_tags, delete_host, find_hosts, recent_history, remove_tags, OnMissing};
pub use store::{HistorySearchResult, HostStore, MemoryStore};
