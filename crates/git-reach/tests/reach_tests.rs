//! Ancestry, subset, containment and branch-position queries.

use std::sync::Arc;

use git_hash::ObjectId;
use git_reach::{
    AheadBehindCount, CommitFlags, CommitGraphBuilder, CommitGraphProvider, CommitNode,
    ContainsCache, FlagStore, GenerationMode, GraphError, MemoryGraph, ReachConfig, Reachability,
};

const MODES: [GenerationMode; 3] = [
    GenerationMode::None,
    GenerationMode::TopologicalLevels,
    GenerationMode::CorrectedCommitDates,
];

fn oid(n: u64) -> ObjectId {
    ObjectId::from_index(n)
}

/// Two branches off a shared trunk, merged back together, plus a stray root:
///
///   1 - 2 - 3 - 4 ------ 8
///        \              /
///         5 - 6 - 7 ---
///   9
fn history(mode: GenerationMode) -> MemoryGraph {
    let mut b = CommitGraphBuilder::new();
    b.add_commit(oid(1), [], 100)
        .add_commit(oid(2), [oid(1)], 200)
        .add_commit(oid(3), [oid(2)], 300)
        .add_commit(oid(4), [oid(3)], 400)
        .add_commit(oid(5), [oid(2)], 250)
        .add_commit(oid(6), [oid(5)], 350)
        .add_commit(oid(7), [oid(6)], 450)
        .add_commit(oid(8), [oid(4), oid(7)], 500)
        .add_commit(oid(9), [], 150);
    b.build(mode).unwrap()
}

#[test]
fn ancestry_matches_history() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);

        assert!(engine.in_merge_bases(&oid(1), &oid(8)).unwrap(), "{mode:?}");
        assert!(engine.in_merge_bases(&oid(6), &oid(8)).unwrap(), "{mode:?}");
        assert!(engine.in_merge_bases(&oid(4), &oid(4)).unwrap(), "{mode:?}");
        assert!(!engine.in_merge_bases(&oid(6), &oid(4)).unwrap(), "{mode:?}");
        assert!(!engine.in_merge_bases(&oid(8), &oid(1)).unwrap(), "{mode:?}");
        assert!(!engine.in_merge_bases(&oid(9), &oid(8)).unwrap(), "{mode:?}");

        assert!(engine.is_descendant_of(&oid(7), &[oid(3), oid(5)]).unwrap(), "{mode:?}");
        assert!(!engine.is_descendant_of(&oid(7), &[oid(3), oid(9)]).unwrap(), "{mode:?}");
    }
}

#[test]
fn ancestry_is_transitive_along_chain() {
    let graph = history(GenerationMode::TopologicalLevels);
    let engine = Reachability::new(&graph);
    let chain = [oid(1), oid(2), oid(5), oid(6), oid(7), oid(8)];
    for (i, older) in chain.iter().enumerate() {
        for newer in &chain[i..] {
            assert!(engine.in_merge_bases(older, newer).unwrap(), "{older} -> {newer}");
        }
    }
}

#[test]
fn can_all_from_reach_requires_every_source() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);
        assert!(engine.can_all_from_reach(&[oid(4), oid(7)], &[oid(2)], false).unwrap(), "{mode:?}");
        assert!(!engine.can_all_from_reach(&[oid(4), oid(7)], &[oid(5)], false).unwrap(), "{mode:?}");
        assert!(engine.can_all_from_reach(&[oid(4), oid(7)], &[oid(3), oid(6)], true).unwrap(), "{mode:?}");
        assert!(engine.can_all_from_reach(&[], &[oid(3)], false).unwrap(), "{mode:?}");
    }
}

#[test]
fn can_all_from_reach_date_cutoff_tolerates_skew() {
    for mode in MODES {
        let mut b = CommitGraphBuilder::new();
        b.add_commit(oid(1), [], 40)
            .add_commit(oid(2), [oid(1)], 37)
            .add_commit(oid(3), [oid(2)], 150);
        let graph = b.build(mode).unwrap();
        let engine = Reachability::new(&graph);
        assert!(engine.can_all_from_reach(&[oid(3)], &[oid(1)], true).unwrap(), "{mode:?}");
        assert!(!engine.can_all_from_reach(&[oid(1)], &[oid(3)], true).unwrap(), "{mode:?}");
    }
}

#[test]
fn reachable_subset_keeps_reachable_targets() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);
        let found = engine.get_reachable_subset(&[oid(4)], &[oid(2), oid(9)]).unwrap();
        assert_eq!(found, vec![oid(2)], "{mode:?}");

        let mut found = engine
            .get_reachable_subset(&[oid(4), oid(7)], &[oid(6), oid(3), oid(8)])
            .unwrap();
        found.sort();
        let mut expected = vec![oid(3), oid(6)];
        expected.sort();
        assert_eq!(found, expected, "{mode:?}");
    }
}

#[test]
fn reachable_subset_with_flag_cleans_scratch_bits() {
    let graph = history(GenerationMode::TopologicalLevels);
    let engine = Reachability::new(&graph);
    let mut flags = FlagStore::new();
    let found = engine
        .get_reachable_subset_with_flag(&mut flags, &[oid(8)], &[oid(1)], CommitFlags::SEEN)
        .unwrap();
    assert_eq!(found, vec![oid(1)]);
    let marked: Vec<_> = flags.marked().collect();
    assert_eq!(marked, vec![(&oid(1), CommitFlags::SEEN)]);
}

#[test]
fn contains_checks_with_shared_cache() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);
        let want = [oid(6)];
        let mut cache = ContainsCache::new();
        let candidates = [oid(8), oid(7), oid(4), oid(6), oid(9)];
        let answers: Vec<bool> = candidates
            .iter()
            .map(|c| engine.commit_contains(c, &want, &mut cache).unwrap())
            .collect();
        assert_eq!(answers, vec![true, true, false, true, false], "{mode:?}");
    }
}

#[test]
fn ahead_behind_for_diverged_branches() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);
        let commits = [oid(4), oid(7), oid(8)];
        let mut counts = [AheadBehindCount::new(0, 1), AheadBehindCount::new(2, 0)];
        engine.ahead_behind(&commits, &mut counts).unwrap();
        assert_eq!((counts[0].ahead, counts[0].behind), (2, 3), "{mode:?}");
        assert_eq!((counts[1].ahead, counts[1].behind), (4, 0), "{mode:?}");
    }
}

#[test]
fn tips_and_branch_base() {
    for mode in MODES {
        let graph = history(mode);
        let engine = Reachability::new(&graph);
        let found = engine
            .tips_reachable_from_bases(&[oid(4)], &[oid(7), oid(3), oid(1), oid(9)])
            .unwrap();
        assert_eq!(found, vec![false, true, true, false], "{mode:?}");

        assert_eq!(engine.branch_base_for_tip(&oid(7), &[oid(9), oid(4)]).unwrap(), Some(1), "{mode:?}");
    }
}

#[test]
fn ref_newer_checks_fast_forward() {
    let graph = history(GenerationMode::TopologicalLevels);
    let engine = Reachability::new(&graph);
    assert!(engine.ref_newer(&oid(8), &oid(4)).unwrap());
    assert!(!engine.ref_newer(&oid(4), &oid(7)).unwrap());
}

/// Provider that fails for one commit, for exercising the lenient mode.
struct Holey {
    inner: MemoryGraph,
    hole: ObjectId,
}

impl CommitGraphProvider for Holey {
    fn resolve(&self, id: &ObjectId) -> Result<Arc<CommitNode>, GraphError> {
        if *id == self.hole {
            return Err(GraphError::Corrupt {
                id: *id,
                reason: "truncated object".into(),
            });
        }
        self.inner.resolve(id)
    }
}

#[test]
fn ignore_missing_commits_answers_false() {
    let graph = Holey {
        inner: history(GenerationMode::TopologicalLevels),
        hole: oid(2),
    };

    let strict = Reachability::new(&graph);
    assert!(strict.in_merge_bases_many(&oid(1), &[oid(8)]).is_err());

    let config = ReachConfig {
        ignore_missing_commits: true,
        ..ReachConfig::default()
    };
    let lenient = Reachability::with_config(&graph, config);
    assert!(!lenient.in_merge_bases_many(&oid(1), &[oid(8)]).unwrap());
    assert!(lenient.in_merge_bases_many(&oid(4), &[oid(8)]).unwrap());
}
