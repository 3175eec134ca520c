//! Plain-data views handed to the presentation layer

pub mod host_view;

pub use host_view::{just_added, HistoryView, HostListView, HostView, TagView};
