//! Request boundary: run one command and write its history event
//!
//! `apply` is the canonical entry point for host mutations. It builds one
//! [`ChangeLog`] per command, runs the matching workflow, and records a
//! [`HistoryEvent`] unless the command changed nothing. When a workflow fails
//! after some hosts were already saved, an event for those hosts is still
//! recorded before the error is returned.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use servertag_core::apply::{apply, RequestMeta};
//! use servertag_core::{Command, MemoryStore, OnMissing};
//!
//! let mut store = MemoryStore::new();
//! let cmd = Command::AddTags {
//!     hosts: vec!["cleon".to_string()],
//!     tags: vec!["env:prod".to_string()],
//!     on_missing: OnMissing::New,
//! };
//! let meta = RequestMeta::new("dan", "rest", "127.0.0.1");
//!
//! let outcome = apply(&mut store, &cmd, &meta, Utc::now()).unwrap();
//! assert_eq!(
//!     outcome.event.diffs,
//!     vec![
//!         "Created host 'cleon'".to_string(),
//!         "Added tag(s) 'env:prod' to host(s) 'cleon'".to_string(),
//!     ]
//! );
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use servertag_core_types::RequestId;

use crate::changelog::ChangeLog;
use crate::commands::Command;
use crate::config::ServerConfig;
use crate::errors::{Result, ServerTagError};
use crate::model::{HistoryEvent, Host};
use crate::ops::{host_ops, HostStore};
use crate::{log_op_end, log_op_error, log_op_start};

/// Who made a request and from where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub user: String,
    /// Origin of the request, e.g. `rest` or `web`
    pub client: String,
    pub remote_host: String,
    pub request_id: RequestId,
}

impl RequestMeta {
    /// Metadata with a freshly generated request id
    pub fn new(
        user: impl Into<String>,
        client: impl Into<String>,
        remote_host: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            client: client.into(),
            remote_host: remote_host.into(),
            request_id: RequestId::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// # Errors
    /// * `EmptyClient` - If `client` is blank
    pub fn validate(&self) -> Result<()> {
        if self.client.trim().is_empty() {
            return Err(ServerTagError::EmptyClient);
        }
        Ok(())
    }
}

/// Everything a presentation layer needs after a successful command
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Affected hosts in request order; deleted ones report `is_removed`
    pub hosts: Vec<Host>,
    pub event: HistoryEvent,
    /// Whether `event` was written (false for a no-op command)
    pub event_saved: bool,
    /// Tag names newly attached to any host, for highlighting
    pub added_tag_names: Vec<String>,
}

/// Run `cmd` against `store` and record its history event
///
/// Never retries; see [`apply_with_retry`].
///
/// # Errors
/// * `EmptyClient` - If `meta.client` is blank; nothing is read or written
/// * Any error from the workflow the command maps to. Hosts saved before the
///   failure are covered by an event of their own.
pub fn apply(
    store: &mut dyn HostStore,
    cmd: &Command,
    meta: &RequestMeta,
    now: DateTime<Utc>,
) -> Result<ApplyOutcome> {
    log_op_start!(
        "apply",
        command = cmd.op_name(),
        request_id = meta.request_id.as_str(),
        user = meta.user.as_str(),
        client = meta.client.as_str()
    );
    let start = Instant::now();

    let outcome = apply_impl(store, cmd, meta, now).map_err(|e| {
        log_op_error!(
            "apply",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = meta.request_id.as_str()
        );
        e
    })?;

    log_op_end!(
        "apply",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = meta.request_id.as_str(),
        diff_count = outcome.event.diffs.len()
    );
    Ok(outcome)
}

fn apply_impl(
    store: &mut dyn HostStore,
    cmd: &Command,
    meta: &RequestMeta,
    now: DateTime<Utc>,
) -> Result<ApplyOutcome> {
    meta.validate()?;

    let mut changelog = ChangeLog::new();
    let result = match cmd {
        Command::AddTags {
            hosts,
            tags,
            on_missing,
        } => host_ops::add_tags(store, hosts, tags, *on_missing, &mut changelog),

        Command::RemoveTags { hosts, tags } => {
            host_ops::remove_tags(store, hosts, tags, &mut changelog)
        }

        Command::DeleteHost { host } => {
            host_ops::delete_host(store, host, &mut changelog).map(|host| vec![host])
        }
    };

    let hosts = match result {
        Ok(hosts) => hosts,
        Err(e) => {
            if !changelog.is_empty() {
                record_partial(store, meta, now, changelog, &e);
            }
            return Err(e);
        }
    };

    let added_tag_names = collect_added(&hosts, &changelog);
    let event = HistoryEvent::from_change_log(
        now,
        meta.user.as_str(),
        meta.client.as_str(),
        meta.remote_host.as_str(),
        changelog,
    );
    let event_saved = event.save(store)?;

    Ok(ApplyOutcome {
        hosts,
        event,
        event_saved,
        added_tag_names,
    })
}

/// Index an event for hosts saved before `cause` stopped the workflow
///
/// A failure to index is logged; the caller returns `cause` either way.
fn record_partial(
    store: &mut dyn HostStore,
    meta: &RequestMeta,
    now: DateTime<Utc>,
    changelog: ChangeLog,
    cause: &ServerTagError,
) {
    let event = HistoryEvent::from_change_log(
        now,
        meta.user.as_str(),
        meta.client.as_str(),
        meta.remote_host.as_str(),
        changelog,
    );
    match event.save(store) {
        Ok(_) => tracing::warn!(
            request_id = meta.request_id.as_str(),
            diff_count = event.diffs.len(),
            error = %cause,
            "command failed part way, recorded history for saved hosts"
        ),
        Err(e) => tracing::error!(
            request_id = meta.request_id.as_str(),
            error = %e,
            cause = %cause,
            "failed to record history for saved hosts"
        ),
    }
}

/// Run `cmd`, re-running it from a fresh read whenever the store reports a
/// version conflict
///
/// At most `max_retries` extra attempts are made. Errors other than
/// `Conflict` are returned straight away.
///
/// # Errors
/// * `Conflict` - If every attempt conflicted
/// * Any non-retryable error from [`apply`]
pub fn apply_with_retry(
    store: &mut dyn HostStore,
    cmd: &Command,
    meta: &RequestMeta,
    now: DateTime<Utc>,
    max_retries: u32,
) -> Result<ApplyOutcome> {
    let mut attempt = 0;
    loop {
        match apply(store, cmd, meta, now) {
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    request_id = meta.request_id.as_str(),
                    attempt,
                    max_retries,
                    error = %e,
                    "retrying after version conflict"
                );
            }
            result => return result,
        }
    }
}

/// [`apply_with_retry`] with the retry budget from `config`
///
/// # Errors
/// See [`apply_with_retry`]
pub fn apply_with_config(
    store: &mut dyn HostStore,
    cmd: &Command,
    meta: &RequestMeta,
    now: DateTime<Utc>,
    config: &ServerConfig,
) -> Result<ApplyOutcome> {
    apply_with_retry(store, cmd, meta, now, config.max_conflict_retries)
}

/// Added tag names across all hosts, first occurrence order
fn collect_added(hosts: &[Host], changelog: &ChangeLog) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for host in hosts {
        for name in changelog.tags_added_to(host.name()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}
