//! Property checks for tag reconciliation

use std::collections::HashSet;

use proptest::prelude::*;
use servertag_core::model::tag::parse_all;
use servertag_core::ops::reconcile;
use servertag_core::{Host, HostStore, MemoryStore, Tag, TagSet};

fn tag_name() -> impl Strategy<Value = String> {
    "[a-cA-C]{1,2}(:[a-cA-C]{1,2})?"
}

fn batch() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(tag_name(), 0..6)
}

fn exclusive_prefixes_unique(tags: &TagSet) -> bool {
    let mut seen = HashSet::new();
    tags.iter().filter_map(Tag::prefix).all(|p| seen.insert(p))
}

proptest! {
    #[test]
    fn prop_at_most_one_exclusive_tag_per_prefix(batches in prop::collection::vec(batch(), 1..5)) {
        let mut tags = TagSet::new();
        for names in &batches {
            let incoming = parse_all(names).unwrap();
            tags = reconcile::add(&tags, &incoming).tags;
            prop_assert!(exclusive_prefixes_unique(&tags), "duplicate prefix in {:?}", tags);
        }
    }

    #[test]
    fn prop_stored_host_keeps_one_exclusive_tag_per_prefix(
        start in batch(),
        batches in prop::collection::vec(batch(), 0..4),
    ) {
        let mut host = Host::from_stored("seed", &start, 1).unwrap();
        prop_assert!(exclusive_prefixes_unique(host.tags()), "duplicate prefix in {:?}", host.tags());

        for names in &batches {
            host.add_tags_by_name(names).unwrap();
            prop_assert!(exclusive_prefixes_unique(host.tags()), "duplicate prefix in {:?}", host.tags());
        }
    }

    #[test]
    fn prop_set_tags_keeps_one_exclusive_tag_per_prefix(names in batch()) {
        let mut host = Host::new("seed").unwrap();
        host.set_tags_by_name(&names).unwrap();
        prop_assert!(exclusive_prefixes_unique(host.tags()), "duplicate prefix in {:?}", host.tags());
    }

    #[test]
    fn prop_saved_host_reloads_with_one_exclusive_tag_per_prefix(
        start in batch(),
        names in batch(),
    ) {
        let mut store = MemoryStore::new();
        let mut host = Host::new("seed").unwrap();
        host.set_tags_by_name(&start).unwrap();
        host.add_tags_by_name(&names).unwrap();
        host.save(&mut store).unwrap();

        let reloaded = store.find_host_by_name("seed").unwrap();
        prop_assert!(exclusive_prefixes_unique(reloaded.tags()));
        prop_assert_eq!(reloaded.tag_names(), host.tag_names());
    }

    #[test]
    fn prop_second_add_is_a_no_op(start in batch(), names in batch()) {
        let current: TagSet = parse_all(&start).unwrap().into_iter().collect();
        let incoming = parse_all(&names).unwrap();

        let first = reconcile::add(&current, &incoming);
        let second = reconcile::add(&first.tags, &incoming);

        prop_assert!(second.added.is_empty());
        prop_assert!(second.evicted.is_empty());
        prop_assert_eq!(second.tags, first.tags);
    }

    #[test]
    fn prop_added_tags_end_up_present(start in batch(), names in batch()) {
        let current: TagSet = parse_all(&start).unwrap().into_iter().collect();
        let out = reconcile::add(&current, &parse_all(&names).unwrap());

        for tag in &out.added {
            prop_assert!(out.tags.contains(tag));
            prop_assert!(!current.contains(tag));
        }
    }

    #[test]
    fn prop_remove_clears_and_is_idempotent(start in batch(), names in batch()) {
        let current: TagSet = parse_all(&start).unwrap().into_iter().collect();
        let to_remove = parse_all(&names).unwrap();

        let first = reconcile::remove(&current, &to_remove);
        for tag in &to_remove {
            prop_assert!(!first.tags.contains(tag));
        }

        let second = reconcile::remove(&first.tags, &to_remove);
        prop_assert!(second.removed.is_empty());
        prop_assert_eq!(second.tags, first.tags);
    }

    #[test]
    fn prop_parse_ignores_case(name in tag_name()) {
        let upper = Tag::parse(&name.to_uppercase()).unwrap();
        let lower = Tag::parse(&name.to_lowercase()).unwrap();
        prop_assert_eq!(upper.name(), lower.name());
        prop_assert_eq!(upper.prefix(), lower.prefix());
    }
}
