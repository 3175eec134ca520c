pub mod history_event;
pub mod host;
pub mod tag;

use std::collections::BTreeSet;

pub use history_event::HistoryEvent;
pub use host::Host;
pub use tag::Tag;

/// A host's tags, unique by name and iterated in name order
pub type TagSet = BTreeSet<Tag>;
