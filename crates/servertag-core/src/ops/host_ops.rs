//! Host workflows with boundary logging
//!
//! Each workflow validates every host name and tag name before touching the
//! store, loads all hosts, reconciles them in memory, and only then saves.
//! Deltas reach the request's [`ChangeLog`] for saved hosts only, so after a
//! failed save part way through a batch the log still describes what was
//! written.
//!
//! ## Logging Ownership
//!
//! Workflows own lifecycle logging (`log_op_start!`, `log_op_end!`,
//! `log_op_error!`). The model and store layers only emit `tracing::debug!`.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::store::{HistorySearchResult, HostStore};
use crate::changelog::ChangeLog;
use crate::config::ServerConfig;
use crate::errors::{Result, ServerTagError};
use crate::model::tag::parse_all;
use crate::model::{Host, Tag};
use crate::{log_op_end, log_op_error, log_op_start};

/// What `add_tags` does with a host name that is not stored yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissing {
    /// Create the host
    #[default]
    New,
    /// Fail with `HostNotFound`
    Fail,
}

/// Add tags to every named host
///
/// Returns the saved hosts in request order.
///
/// # Errors
/// * `InvalidHostName` / `InvalidTagName` / `EmptyTagList` - Nothing is
///   loaded or written
/// * `HostNotFound` - A host is absent and `on_missing` is `Fail`
/// * `Conflict` - A host changed in the store since it was read; hosts
///   saved before it stay written and are recorded in `changelog`
pub fn add_tags<H: AsRef<str>, T: AsRef<str>>(
    store: &mut dyn HostStore,
    host_names: &[H],
    tag_names: &[T],
    on_missing: OnMissing,
    changelog: &mut ChangeLog,
) -> Result<Vec<Host>> {
    log_op_start!(
        "add_tags",
        host_count = host_names.len(),
        tag_count = tag_names.len()
    );
    let start = Instant::now();

    let hosts = add_tags_impl(store, host_names, tag_names, on_missing, changelog).map_err(|e| {
        log_op_error!(
            "add_tags",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "add_tags",
        duration_ms = start.elapsed().as_millis() as u64,
        host_count = hosts.len()
    );
    Ok(hosts)
}

fn add_tags_impl<H: AsRef<str>, T: AsRef<str>>(
    store: &mut dyn HostStore,
    host_names: &[H],
    tag_names: &[T],
    on_missing: OnMissing,
    changelog: &mut ChangeLog,
) -> Result<Vec<Host>> {
    let names = normalize_host_names(host_names)?;
    let tags = parse_all(tag_names)?;
    if tags.is_empty() {
        return Err(ServerTagError::EmptyTagList);
    }

    let mut pending = ChangeLog::new();
    let mut hosts = Vec::with_capacity(names.len());
    for name in &names {
        match store.find_host_by_name(name) {
            Ok(host) => hosts.push(host),
            Err(ServerTagError::HostNotFound { .. }) if on_missing == OnMissing::New => {
                hosts.push(Host::new(name)?);
                pending.record_host_created(name.as_str());
            }
            Err(e) => return Err(e),
        }
    }

    for host in &mut hosts {
        let added = host.add_tags(&tags);
        pending.record_tags_added(host.name(), added.iter().map(Tag::name));
    }

    save_all(store, &mut hosts, pending, changelog)?;
    Ok(hosts)
}

/// Remove tags from every named host
///
/// A host left with no tags is deleted. Returns the hosts in request order,
/// deleted ones flagged by [`Host::is_removed`].
///
/// # Errors
/// * `InvalidHostName` / `InvalidTagName` - Nothing is loaded or written
/// * `HostNotFound` - A named host is not stored
/// * `Conflict` - A host changed in the store since it was read; hosts
///   saved before it stay written and are recorded in `changelog`
pub fn remove_tags<H: AsRef<str>, T: AsRef<str>>(
    store: &mut dyn HostStore,
    host_names: &[H],
    tag_names: &[T],
    changelog: &mut ChangeLog,
) -> Result<Vec<Host>> {
    log_op_start!(
        "remove_tags",
        host_count = host_names.len(),
        tag_count = tag_names.len()
    );
    let start = Instant::now();

    let hosts = remove_tags_impl(store, host_names, tag_names, changelog).map_err(|e| {
        log_op_error!(
            "remove_tags",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "remove_tags",
        duration_ms = start.elapsed().as_millis() as u64,
        host_count = hosts.len()
    );
    Ok(hosts)
}

fn remove_tags_impl<H: AsRef<str>, T: AsRef<str>>(
    store: &mut dyn HostStore,
    host_names: &[H],
    tag_names: &[T],
    changelog: &mut ChangeLog,
) -> Result<Vec<Host>> {
    let names = normalize_host_names(host_names)?;
    let tags = parse_all(tag_names)?;

    let mut hosts = names
        .iter()
        .map(|name| store.find_host_by_name(name))
        .collect::<Result<Vec<_>>>()?;

    let mut pending = ChangeLog::new();
    for host in &mut hosts {
        let removed = host.remove_tags(&tags);
        pending.record_tags_removed(host.name(), removed.iter().map(Tag::name));

        if host.tags().is_empty() {
            host.mark_removed();
            pending.record_host_deleted(host.name());
        }
    }

    save_all(store, &mut hosts, pending, changelog)?;
    Ok(hosts)
}

/// Delete a host, logging every tag it carried as removed
///
/// # Errors
/// * `InvalidHostName` - Nothing is loaded or written
/// * `HostNotFound` - The host is not stored
/// * `Conflict` - The host changed in the store since it was read
pub fn delete_host(
    store: &mut dyn HostStore,
    host_name: &str,
    changelog: &mut ChangeLog,
) -> Result<Host> {
    log_op_start!("delete_host", host_name = host_name);
    let start = Instant::now();

    let host = delete_host_impl(store, host_name, changelog).map_err(|e| {
        log_op_error!(
            "delete_host",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "delete_host",
        duration_ms = start.elapsed().as_millis() as u64,
        tag_count = host.tags().len()
    );
    Ok(host)
}

fn delete_host_impl(
    store: &mut dyn HostStore,
    host_name: &str,
    changelog: &mut ChangeLog,
) -> Result<Host> {
    let name = host_name.to_lowercase();
    Host::assert_valid_name(&name)?;

    let mut host = store.find_host_by_name(&name)?;
    let mut pending = ChangeLog::new();
    pending.record_tags_removed(host.name(), host.tag_names());
    host.mark_removed();
    pending.record_host_deleted(host.name());

    host.save(store)?;
    changelog.merge(pending);
    Ok(host)
}

/// Hosts carrying every named tag; all hosts when `tag_names` is empty
///
/// # Errors
/// * `InvalidTagName` - If any tag name is malformed
pub fn find_hosts<T: AsRef<str>>(store: &dyn HostStore, tag_names: &[T]) -> Result<Vec<Host>> {
    log_op_start!("find_hosts", tag_count = tag_names.len());
    let start = Instant::now();

    let result = if tag_names.is_empty() {
        store.find_all_hosts()
    } else {
        parse_all(tag_names).and_then(|tags| store.find_hosts_by_tags(&tags))
    };

    let hosts = result.map_err(|e| {
        log_op_error!(
            "find_hosts",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "find_hosts",
        duration_ms = start.elapsed().as_millis() as u64,
        host_count = hosts.len()
    );
    Ok(hosts)
}

/// The newest history events, `config.history_page_size` of them
///
/// # Errors
/// * `Persistence` - If the store cannot be searched
pub fn recent_history(
    store: &dyn HostStore,
    config: &ServerConfig,
) -> Result<HistorySearchResult> {
    log_op_start!("recent_history", page_size = config.history_page_size);
    let start = Instant::now();

    let page = store
        .most_recent_history(config.history_page_size)
        .map_err(|e| {
            log_op_error!(
                "recent_history",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "recent_history",
        duration_ms = start.elapsed().as_millis() as u64,
        hit_count = page.hits.len()
    );
    Ok(page)
}

/// Lower-case, validate and deduplicate host names, keeping request order
fn normalize_host_names<H: AsRef<str>>(host_names: &[H]) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(host_names.len());
    for raw in host_names {
        let name = raw.as_ref().to_lowercase();
        Host::assert_valid_name(&name)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Save hosts in order, moving `pending` entries of saved hosts into
/// `changelog`
///
/// Stops at the first failed save; entries for that host and every host
/// after it are dropped.
fn save_all(
    store: &mut dyn HostStore,
    hosts: &mut [Host],
    mut pending: ChangeLog,
    changelog: &mut ChangeLog,
) -> Result<()> {
    let mut failure = None;
    for (idx, host) in hosts.iter_mut().enumerate() {
        if let Err(e) = host.save(store) {
            failure = Some((idx, e));
            break;
        }
    }

    match failure {
        None => {
            changelog.merge(pending);
            Ok(())
        }
        Some((idx, e)) => {
            let saved: Vec<&str> = hosts[..idx].iter().map(Host::name).collect();
            pending.retain_hosts(|name| saved.iter().any(|s| *s == name));
            changelog.merge(pending);
            Err(e)
        }
    }
}
