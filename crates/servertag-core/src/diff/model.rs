use serde::Serialize;

/// Direction of a tag change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Remove,
}

impl ChangeKind {
    /// Render the sentence for one group of identical changes
    pub fn sentence(&self, tags: &str, hosts: &str) -> String {
        match self {
            ChangeKind::Add => format!("Added tag(s) {tags} to host(s) {hosts}"),
            ChangeKind::Remove => format!("Removed tag(s) {tags} from host(s) {hosts}"),
        }
    }
}

/// Hosts that received exactly the same ordered list of tag changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeGroup {
    pub tag_names: Vec<String>,
    pub host_names: Vec<String>,
}
