use crate::errors::{Result, ServerTagError};
use crate::model::tag::{parse_all, Tag};
use crate::model::TagSet;
use crate::ops::reconcile;
use crate::ops::store::HostStore;

/// A named host and the tags currently attached to it
///
/// Hosts are loaded from a [`HostStore`] (or constructed fresh when absent),
/// mutated in memory, then saved back. A host marked removed is deleted on
/// save instead of upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    name: String,
    tags: TagSet,
    /// Version token from the last read or write; `None` if never persisted
    version: Option<u64>,
    removed: bool,
}

impl Host {
    /// Create an unpersisted host with no tags
    ///
    /// # Errors
    /// * `InvalidHostName` - If the lower-cased name does not match `[a-z0-9-]+`
    pub fn new(name: &str) -> Result<Self> {
        let host = Self {
            name: name.to_lowercase(),
            tags: TagSet::new(),
            version: None,
            removed: false,
        };
        host.validate_name()?;
        Ok(host)
    }

    /// Rebuild a host from its stored form
    ///
    /// # Errors
    /// * `InvalidHostName` - If the stored name is malformed
    /// * `InvalidTagName` - If any stored tag name is malformed
    pub fn from_stored<S: AsRef<str>>(name: &str, tag_names: &[S], version: u64) -> Result<Self> {
        let mut host = Self::new(name)?;
        host.set_tags_by_name(tag_names)?;
        host.version = Some(version);
        Ok(host)
    }

    /// Raise an error unless `name` follows the rules for host names
    ///
    /// # Errors
    /// * `InvalidHostName` - If `name` is empty or has characters outside `[a-z0-9-]`
    pub fn assert_valid_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if valid {
            Ok(())
        } else {
            Err(ServerTagError::InvalidHostName {
                name: name.to_string(),
            })
        }
    }

    /// # Errors
    /// * `InvalidHostName` - If this host's name is malformed
    pub fn validate_name(&self) -> Result<()> {
        Self::assert_valid_name(&self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tags in name order
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// True if this host has never been written to a store
    pub fn is_new(&self) -> bool {
        self.version.is_none()
    }

    /// Replace the tag set wholesale, deduplicating by name
    ///
    /// Of several exclusive tags sharing a prefix only the last is kept.
    ///
    /// # Errors
    /// * `InvalidTagName` - If any name is malformed; the tag set is unchanged
    pub fn set_tags_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let parsed = parse_all(names)?;
        self.tags = reconcile::add(&TagSet::new(), &parsed).tags;
        Ok(())
    }

    /// Add the given tags, returning those that were not already present
    ///
    /// Exclusive tags evict any existing tag with the same prefix.
    pub fn add_tags(&mut self, incoming: &[Tag]) -> Vec<Tag> {
        let outcome = reconcile::add(&self.tags, incoming);
        if !outcome.evicted.is_empty() {
            tracing::debug!(
                host_name = %self.name,
                evicted = ?outcome.evicted.iter().map(Tag::name).collect::<Vec<_>>(),
                "exclusive tags evicted"
            );
        }
        self.tags = outcome.tags;
        outcome.added
    }

    /// Remove the given tags, returning those that were present
    pub fn remove_tags(&mut self, to_remove: &[Tag]) -> Vec<Tag> {
        let outcome = reconcile::remove(&self.tags, to_remove);
        self.tags = outcome.tags;
        outcome.removed
    }

    /// Parse and add the named tags
    ///
    /// # Errors
    /// * `InvalidTagName` - If any name is malformed; no tag is applied
    pub fn add_tags_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Tag>> {
        let incoming = parse_all(names)?;
        Ok(self.add_tags(&incoming))
    }

    /// Parse and remove the named tags
    ///
    /// # Errors
    /// * `InvalidTagName` - If any name is malformed; no tag is removed
    pub fn remove_tags_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Tag>> {
        let to_remove = parse_all(names)?;
        Ok(self.remove_tags(&to_remove))
    }

    /// Flag the host so that `save` deletes it
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Persist the host: delete if marked removed, otherwise upsert
    ///
    /// An upsert passes this host's version as the expected version and
    /// records the version the store hands back.
    ///
    /// # Errors
    /// * `InvalidHostName` - If the name is malformed
    /// * `Conflict` - If the stored version advanced since this host was read
    pub fn save(&mut self, store: &mut dyn HostStore) -> Result<()> {
        self.validate_name()?;

        if self.removed {
            store.delete_host(self)
        } else {
            let version = store.upsert_host(self, self.version)?;
            self.version = Some(version);
            Ok(())
        }
    }
}
