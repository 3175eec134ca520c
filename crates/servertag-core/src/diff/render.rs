use crate::diff::model::{ChangeGroup, ChangeKind};

/// Quote and join items: `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i.as_ref())).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Group hosts by their exact tag-name sequence
///
/// Groups come out in the order their sequence was first seen; hosts keep
/// their input order within a group. Empty sequences are dropped.
pub fn group_changes(changes: &[(String, Vec<String>)]) -> Vec<ChangeGroup> {
    let mut groups: Vec<ChangeGroup> = Vec::new();

    for (host_name, tag_names) in changes {
        if tag_names.is_empty() {
            continue;
        }

        match groups.iter_mut().find(|g| &g.tag_names == tag_names) {
            Some(group) => group.host_names.push(host_name.clone()),
            None => groups.push(ChangeGroup {
                tag_names: tag_names.clone(),
                host_names: vec![host_name.clone()],
            }),
        }
    }

    groups
}

/// Render one sentence per group of identical changes
pub fn render_tag_diffs(kind: ChangeKind, changes: &[(String, Vec<String>)]) -> Vec<String> {
    group_changes(changes)
        .iter()
        .map(|g| kind.sentence(&format_list(&g.tag_names), &format_list(&g.host_names)))
        .collect()
}
