//! Tag-set reconciliation
//!
//! Pure functions that merge a batch of additions or removals into a host's
//! current tag set. Neither function mutates its input: each returns the
//! new set plus the delta, so re-running against freshly reloaded state
//! after a storage conflict is always safe.

use std::collections::{HashMap, HashSet};

use crate::model::{Tag, TagSet};

/// Result of [`add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// The reconciled tag set
    pub tags: TagSet,
    /// Incoming tags that were not already present, in incoming order
    pub added: Vec<Tag>,
    /// Exclusive tags displaced by an incoming tag with the same prefix
    pub evicted: Vec<Tag>,
}

/// Result of [`remove`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub tags: TagSet,
    /// Requested tags that were actually present, in request order
    pub removed: Vec<Tag>,
}

/// Merge `incoming` into `current`, enforcing one exclusive tag per prefix
///
/// An incoming exclusive tag evicts any current exclusive tag with the same
/// prefix. When `incoming` itself holds several exclusive tags with one
/// prefix, the last of them wins and the earlier ones are ignored.
pub fn add(current: &TagSet, incoming: &[Tag]) -> AddOutcome {
    let incoming = collapse_incoming(incoming);
    let incoming_names: HashSet<&str> = incoming.iter().map(Tag::name).collect();
    let new_prefixes: HashSet<&str> = incoming.iter().filter_map(Tag::prefix).collect();

    let mut tags = TagSet::new();
    let mut evicted = Vec::new();
    for tag in current {
        let displaced = tag
            .prefix()
            .is_some_and(|p| new_prefixes.contains(p) && !incoming_names.contains(tag.name()));
        if displaced {
            evicted.push(tag.clone());
        } else {
            tags.insert(tag.clone());
        }
    }

    let added: Vec<Tag> = incoming
        .iter()
        .filter(|tag| !tags.contains(*tag))
        .cloned()
        .collect();
    tags.extend(incoming.iter().cloned());

    AddOutcome {
        tags,
        added,
        evicted,
    }
}

/// Remove every tag in `to_remove` from `current`
pub fn remove(current: &TagSet, to_remove: &[Tag]) -> RemoveOutcome {
    let mut seen = HashSet::new();
    let mut removed = Vec::new();
    for tag in to_remove {
        if current.contains(tag) && seen.insert(tag.name()) {
            removed.push(tag.clone());
        }
    }

    let tags = current
        .iter()
        .filter(|tag| !seen.contains(tag.name()))
        .cloned()
        .collect();

    RemoveOutcome { tags, removed }
}

/// Drop duplicate names and all but the last exclusive tag per prefix
fn collapse_incoming(incoming: &[Tag]) -> Vec<Tag> {
    let mut last_for_prefix: HashMap<&str, usize> = HashMap::new();
    for (idx, tag) in incoming.iter().enumerate() {
        if let Some(prefix) = tag.prefix() {
            last_for_prefix.insert(prefix, idx);
        }
    }

    let mut seen = HashSet::new();
    let mut collapsed = Vec::with_capacity(incoming.len());
    for (idx, tag) in incoming.iter().enumerate() {
        let wins = tag
            .prefix()
            .map_or(true, |prefix| last_for_prefix.get(prefix) == Some(&idx));
        if wins && seen.insert(tag.name()) {
            collapsed.push(tag.clone());
        }
    }
    collapsed
}
