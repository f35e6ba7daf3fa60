//! Property tests for ring invariants.

use lfring::hasher::SipHasher;
use lfring::{HashRing, RingHasher};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn node_ids() -> impl Strategy<Value = Vec<String>> {
    btree_set("[a-z]{1,6}", 1..8).prop_map(|set| set.into_iter().collect())
}

fn build(rf: usize, vnc: usize, nodes: &[String]) -> HashRing {
    let ring = HashRing::new(Arc::new(SipHasher), rf, vnc).unwrap();
    ring.insert(nodes.iter().cloned()).unwrap();
    ring
}

fn names(ring: &HashRing) -> Vec<Vec<u8>> {
    ring.iter().map(|vn| vn.name().to_vec()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replica_owner_bounds(
        nodes in node_ids(),
        rf in 1usize..6,
        vnc in 1usize..12,
        keys in vec(any::<Vec<u8>>(), 1..20),
    ) {
        let ring = build(rf, vnc, &nodes);
        for key in &keys {
            let owners = ring.nodes_for_key(key).unwrap();
            prop_assert!(owners.len() <= rf);
            prop_assert_eq!(owners.len(), rf.min(nodes.len()));
            let unique: HashSet<_> = owners.iter().collect();
            prop_assert_eq!(unique.len(), owners.len());
        }
    }

    #[test]
    fn lookup_matches_linear_scan(
        nodes in node_ids(),
        vnc in 1usize..12,
        keys in vec(any::<Vec<u8>>(), 1..20),
    ) {
        let ring = build(1, vnc, &nodes);
        let all: Vec<_> = ring.iter().collect();
        prop_assert!(all.windows(2).all(|w| w[0].name() < w[1].name()));
        for key in &keys {
            let position = SipHasher.hash(key);
            let expected = all
                .iter()
                .find(|vn| vn.name() >= position.as_slice())
                .unwrap_or(&all[0]);
            prop_assert_eq!(&ring.virtual_node_for_key(key).unwrap(), expected);
        }
    }

    #[test]
    fn insert_remove_round_trip(
        nodes in node_ids(),
        extra in node_ids(),
        vnc in 1usize..12,
    ) {
        let extra: Vec<String> = extra.into_iter().filter(|n| !nodes.contains(n)).collect();
        prop_assume!(!extra.is_empty());
        let ring = build(2, vnc, &nodes);
        let before = names(&ring);

        ring.insert(extra.iter().cloned()).unwrap();
        let during = names(&ring);
        prop_assert!(during.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(during.len(), (nodes.len() + extra.len()) * vnc);

        ring.remove(extra.iter().cloned()).unwrap();
        prop_assert_eq!(names(&ring), before);
    }

    #[test]
    fn clone_is_equal_then_independent(
        nodes in node_ids(),
        vnc in 1usize..8,
    ) {
        let original = build(3, vnc, &nodes);
        let copy = original.clone();
        prop_assert_eq!(original.to_string(), copy.to_string());

        copy.insert(["intruder-1"]).unwrap();
        prop_assert_eq!(original.size(), nodes.len());
        prop_assert_eq!(copy.size(), nodes.len() + 1);
    }
}
