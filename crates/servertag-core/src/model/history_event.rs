use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::changelog::ChangeLog;
use crate::errors::Result;
use crate::ops::store::HostStore;

/// Audit record of one request's changes
///
/// `datetime` is always UTC; converting to local time is the presentation
/// layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    #[serde(with = "db_datetime")]
    pub datetime: DateTime<Utc>,
    pub user: String,
    /// Origin of the request, e.g. `rest` or `web`
    pub client: String,
    pub remote_host: String,
    pub diffs: Vec<String>,
}

impl HistoryEvent {
    /// Build the event for a finished request, rendering the change log
    pub fn from_change_log<Tz: TimeZone>(
        now: DateTime<Tz>,
        user: impl Into<String>,
        client: impl Into<String>,
        remote_host: impl Into<String>,
        changelog: ChangeLog,
    ) -> Self {
        Self {
            datetime: now.with_timezone(&Utc),
            user: user.into(),
            client: client.into(),
            remote_host: remote_host.into(),
            diffs: changelog.render_diffs(),
        }
    }

    /// True if the event describes no change and must not be persisted
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Index the event, unless it has no diffs
    ///
    /// Returns whether the event was written.
    ///
    /// # Errors
    /// Propagates any error from the store
    pub fn save(&self, store: &mut dyn HostStore) -> Result<bool> {
        if self.is_empty() {
            tracing::debug!(user = %self.user, client = %self.client, "skipping empty history event");
            return Ok(false);
        }
        store.index_history_event(self)?;
        Ok(true)
    }
}

/// Seconds-precision `%Y-%m-%dT%H:%M:%S` in UTC, the stored document format
mod db_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        // Accept full RFC 3339 too, for events written by other clients
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
