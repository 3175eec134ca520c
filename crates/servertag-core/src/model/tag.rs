use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServerTagError};

/// A normalized label attached to a host
///
/// Tags of the form `prefix:suffix` are exclusive: a host carries at most
/// one exclusive tag per prefix. Equality, hashing and ordering look only
/// at `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    name: String,
    exclusive: bool,
    prefix: Option<String>,
    suffix: Option<String>,
}

impl Tag {
    /// Parse and normalize a raw tag name
    ///
    /// The name is exclusive when some `:` has non-empty text on both sides;
    /// it splits at the first such `:`. A leading `:` never qualifies, so
    /// `:a:b` has prefix `:a` and suffix `b`.
    ///
    /// # Errors
    /// * `InvalidTagName` - If `raw` is empty or contains characters outside `[A-Za-z0-9\-_:]`
    pub fn parse(raw: &str) -> Result<Self> {
        Self::assert_valid_name(raw)?;

        let name = raw.to_lowercase();
        let (prefix, suffix) = match split_exclusive(&name) {
            Some((p, s)) => (Some(p.to_string()), Some(s.to_string())),
            None => (None, None),
        };

        Ok(Self {
            exclusive: prefix.is_some(),
            name,
            prefix,
            suffix,
        })
    }

    /// Check a raw name against the tag grammar without building a Tag
    ///
    /// # Errors
    /// * `InvalidTagName` - If the name does not match the grammar
    pub fn assert_valid_name(raw: &str) -> Result<()> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
        if valid {
            Ok(())
        } else {
            Err(ServerTagError::InvalidTagName {
                name: raw.to_string(),
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Prefix of an exclusive tag (`env` for `env:prod`)
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

/// First `:` with non-empty text on both sides
fn split_exclusive(name: &str) -> Option<(&str, &str)> {
    name.match_indices(':')
        .map(|(idx, _)| (&name[..idx], &name[idx + 1..]))
        .find(|(prefix, suffix)| !prefix.is_empty() && !suffix.is_empty())
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for Tag {
    type Err = ServerTagError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = ServerTagError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.name
    }
}

/// Parse every name, failing on the first malformed one
///
/// # Errors
/// * `InvalidTagName` - If any name is malformed; nothing is returned in that case
pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Tag>> {
    names.iter().map(|n| Tag::parse(n.as_ref())).collect()
}
