//! Ancestry checks and batch reachability.

use git_hash::ObjectId;
use git_utils::collections::PriorityQueue;

use crate::engine::Reachability;
use crate::flags::{CommitFlags, FlagStore};
use crate::graph::{CommitGraphProvider, GENERATION_NUMBER_INFINITY, GENERATION_NUMBER_ZERO};
use crate::paint::{cmp_generation_ascending, compare_by_gen_then_date};
use crate::ReachError;

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// Is `commit` a descendant of (or equal to) one of `with_commit`?
    ///
    /// An empty `with_commit` list is trivially satisfied.
    pub fn is_descendant_of(&self, commit: &ObjectId, with_commit: &[ObjectId]) -> Result<bool, ReachError> {
        if with_commit.is_empty() {
            return Ok(true);
        }

        if self.generation_numbers_enabled() {
            return self.can_all_from_reach(std::slice::from_ref(commit), with_commit, false);
        }

        for other in with_commit {
            if self.in_merge_bases_many(other, std::slice::from_ref(commit))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Is `commit` an ancestor of (or equal to) `reference`?
    pub fn in_merge_bases(&self, commit: &ObjectId, reference: &ObjectId) -> Result<bool, ReachError> {
        self.is_descendant_of(reference, std::slice::from_ref(commit))
    }

    /// Is `commit` an ancestor of (or equal to) any of `references`?
    ///
    /// A single painter walk floored at `commit`'s own generation. With
    /// `ignore_missing_commits` configured, an unloadable commit answers
    /// `false` instead of failing.
    pub fn in_merge_bases_many(&self, commit: &ObjectId, references: &[ObjectId]) -> Result<bool, ReachError> {
        let ignore_missing = self.config().ignore_missing_commits;
        let lenient = |err: ReachError| if ignore_missing { Ok(false) } else { Err(err) };

        let node = match self.resolve(commit) {
            Ok(node) => node,
            Err(err) => return lenient(err),
        };
        let refs = match self.resolve_all(references) {
            Ok(refs) => refs,
            Err(err) => return lenient(err),
        };

        let max_generation = refs
            .iter()
            .map(|r| self.generation(r))
            .fold(GENERATION_NUMBER_ZERO, u64::max);
        let generation = self.generation(&node);
        if generation > max_generation {
            return Ok(false);
        }

        let mut flags = FlagStore::new();
        self.paint_down_to_common(&mut flags, &node, &refs, generation, ignore_missing)?;
        Ok(flags.intersects(commit, CommitFlags::PARENT2))
    }

    /// Is `new` a fast-forward of `old`?
    pub fn ref_newer(&self, new: &ObjectId, old: &ObjectId) -> Result<bool, ReachError> {
        self.is_descendant_of(new, std::slice::from_ref(old))
    }

    /// Can every commit in `from` reach some commit in `to`?
    ///
    /// Floors are derived from both sets. With `cutoff_by_min_date` the walk
    /// also stops below the oldest corrected commit date among the inputs;
    /// the cutoff is dropped when the graph has no corrected dates.
    pub fn can_all_from_reach(
        &self,
        from: &[ObjectId],
        to: &[ObjectId],
        cutoff_by_min_date: bool,
    ) -> Result<bool, ReachError> {
        let from_nodes = self.resolve_all(from)?;
        let to_nodes = self.resolve_all(to)?;

        let mut min_commit_date = match (cutoff_by_min_date, from_nodes.first()) {
            (true, Some(first)) => self.cutoff_date(first),
            _ => i64::MIN,
        };
        let mut min_generation = GENERATION_NUMBER_INFINITY;
        for node in from_nodes.iter().chain(&to_nodes) {
            min_commit_date = min_commit_date.min(self.cutoff_date(node));
            min_generation = min_generation.min(self.generation(node));
        }

        let mut flags = FlagStore::new();
        for node in &to_nodes {
            flags.insert(node.id, CommitFlags::PARENT2);
        }

        self.can_all_from_reach_with_flag(
            &mut flags,
            from,
            CommitFlags::PARENT2,
            CommitFlags::PARENT1,
            min_commit_date,
            min_generation,
        )
    }

    /// Multi-source reachability against commits pre-marked with `with_flag`.
    ///
    /// Each commit in `from` is explored depth-first until it reaches a commit
    /// carrying `with_flag` (success) or drops below the date or generation
    /// floor (failure). Returns true only if every source succeeds. Sources
    /// already carrying `assign_flag` are skipped. On return `assign_flag` and
    /// RESULT are cleared; `with_flag` is left for the caller.
    ///
    /// `min_commit_date` is compared against each commit's corrected commit
    /// date, never its raw date, since raw dates can decrease from parent to
    /// child. Without corrected dates the date floor is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `with_flag` and `assign_flag` overlap, or if either overlaps
    /// RESULT, which the walk uses internally.
    pub fn can_all_from_reach_with_flag(
        &self,
        flags: &mut FlagStore,
        from: &[ObjectId],
        with_flag: CommitFlags,
        assign_flag: CommitFlags,
        min_commit_date: i64,
        min_generation: u64,
    ) -> Result<bool, ReachError> {
        assert!(
            !with_flag.intersects(assign_flag | CommitFlags::RESULT)
                && !assign_flag.intersects(CommitFlags::RESULT),
            "reachability flags {with_flag:?} and {assign_flag:?} must be disjoint from each other and RESULT"
        );

        let min_commit_date = if self.corrected_commit_dates_enabled() {
            min_commit_date
        } else {
            i64::MIN
        };

        let result = self.reach_with_flag_walk(flags, from, with_flag, assign_flag, min_commit_date, min_generation);
        flags.clear(CommitFlags::RESULT | assign_flag);
        result
    }

    fn reach_with_flag_walk(
        &self,
        flags: &mut FlagStore,
        from: &[ObjectId],
        with_flag: CommitFlags,
        assign_flag: CommitFlags,
        min_commit_date: i64,
        min_generation: u64,
    ) -> Result<bool, ReachError> {
        let reached = with_flag | CommitFlags::RESULT;

        let mut list = Vec::with_capacity(from.len());
        for id in from {
            if flags.intersects(id, assign_flag) {
                continue;
            }
            let node = self.resolve(id)?;
            if self.generation(&node) < min_generation {
                return Ok(false);
            }
            list.push(node);
        }

        list.sort_by(|a, b| {
            cmp_generation_ascending((self.generation(a), a.date), (self.generation(b), b.date))
        });

        for start in &list {
            flags.insert(start.id, assign_flag);
            let mut stack = vec![start.clone()];

            while let Some(top) = stack.last().cloned() {
                if flags.intersects(&top.id, reached) {
                    stack.pop();
                    if let Some(below) = stack.last() {
                        flags.insert(below.id, CommitFlags::RESULT);
                    }
                    continue;
                }

                let mut descended = false;
                for parent in &top.parents {
                    if flags.intersects(parent, reached) {
                        flags.insert(top.id, CommitFlags::RESULT);
                    }
                    if flags.intersects(parent, assign_flag) {
                        continue;
                    }
                    flags.insert(*parent, assign_flag);

                    let node = self.resolve(parent)?;
                    if self.cutoff_date(&node) < min_commit_date || self.generation(&node) < min_generation {
                        continue;
                    }
                    stack.push(node);
                    descended = true;
                    break;
                }

                if !descended {
                    stack.pop();
                }
            }

            if !flags.intersects(&start.id, reached) {
                tracing::trace!(commit = %start.id, "source cannot reach target set");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// The members of `to` reachable from at least one member of `from`.
    pub fn get_reachable_subset(&self, from: &[ObjectId], to: &[ObjectId]) -> Result<Vec<ObjectId>, ReachError> {
        let mut flags = FlagStore::new();
        let found = self.get_reachable_subset_with_flag(&mut flags, from, to, CommitFlags::RESULT)?;
        Ok(found)
    }

    /// [`get_reachable_subset`](Self::get_reachable_subset), additionally
    /// marking each found commit with `reachable_flag` in `flags`.
    ///
    /// The walk is a generation-ordered frontier from `from` that stops once
    /// every member of `to` is found, and never descends below the lowest
    /// generation in `to`. Most recently found commits come first.
    ///
    /// # Panics
    ///
    /// Panics if `reachable_flag` overlaps PARENT1 or PARENT2, which the walk
    /// uses internally.
    pub fn get_reachable_subset_with_flag(
        &self,
        flags: &mut FlagStore,
        from: &[ObjectId],
        to: &[ObjectId],
        reachable_flag: CommitFlags,
    ) -> Result<Vec<ObjectId>, ReachError> {
        let scratch = CommitFlags::PARENT1 | CommitFlags::PARENT2;
        assert!(
            !reachable_flag.intersects(scratch),
            "reachable flag {reachable_flag:?} collides with the walk's own marks"
        );
        flags.assert_unmarked(from.iter().chain(to), scratch);

        let result = self.reachable_subset_walk(flags, from, to, reachable_flag);
        flags.clear(scratch);
        result
    }

    fn reachable_subset_walk(
        &self,
        flags: &mut FlagStore,
        from: &[ObjectId],
        to: &[ObjectId],
        reachable_flag: CommitFlags,
    ) -> Result<Vec<ObjectId>, ReachError> {
        let mut min_generation = GENERATION_NUMBER_INFINITY;
        let mut num_to_find = 0usize;
        for id in to {
            let node = self.resolve(id)?;
            min_generation = min_generation.min(self.generation(&node));
            if !flags.intersects(id, CommitFlags::PARENT1) {
                flags.insert(*id, CommitFlags::PARENT1);
                num_to_find += 1;
            }
        }

        let mut queue = PriorityQueue::new(compare_by_gen_then_date);
        for id in from {
            if !flags.intersects(id, CommitFlags::PARENT2) {
                flags.insert(*id, CommitFlags::PARENT2);
                queue.put(self.walk_entry(self.resolve(id)?));
            }
        }

        let mut found = Vec::new();
        while num_to_find > 0 {
            let Some(entry) = queue.get() else {
                break;
            };
            let current = entry.node;

            if flags.intersects(&current.id, CommitFlags::PARENT1) {
                flags.remove(&current.id, CommitFlags::PARENT1);
                flags.insert(current.id, reachable_flag);
                found.insert(0, current.id);
                num_to_find -= 1;
            }

            for parent in &current.parents {
                let node = self.resolve(parent)?;
                if self.generation(&node) < min_generation {
                    continue;
                }
                if flags.intersects(parent, CommitFlags::PARENT2) {
                    continue;
                }
                flags.insert(*parent, CommitFlags::PARENT2);
                queue.put(self.walk_entry(node));
            }
        }

        tracing::debug!(wanted = to.len(), found = found.len(), "reachable subset");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommitGraphBuilder, GenerationMode, MemoryGraph};
    use crate::ReachConfig;

    fn oid(n: u64) -> ObjectId {
        ObjectId::from_index(n)
    }

    /// 1 <- 2 <- 3, plus an unrelated root 9.
    fn chain(mode: GenerationMode) -> MemoryGraph {
        let mut b = CommitGraphBuilder::new();
        b.add_commit(oid(1), [], 10)
            .add_commit(oid(2), [oid(1)], 20)
            .add_commit(oid(3), [oid(2)], 30)
            .add_commit(oid(9), [], 25);
        b.build(mode).unwrap()
    }

    #[test]
    fn descendant_with_and_without_generations() {
        for mode in [GenerationMode::TopologicalLevels, GenerationMode::None] {
            let graph = chain(mode);
            let engine = Reachability::new(&graph);
            assert!(engine.is_descendant_of(&oid(3), &[oid(1)]).unwrap(), "{mode:?}");
            assert!(!engine.is_descendant_of(&oid(1), &[oid(3)]).unwrap(), "{mode:?}");
            assert!(engine.is_descendant_of(&oid(2), &[oid(9), oid(2)]).unwrap(), "{mode:?}");
            assert!(!engine.is_descendant_of(&oid(3), &[oid(9)]).unwrap(), "{mode:?}");
            assert!(engine.is_descendant_of(&oid(3), &[]).unwrap(), "{mode:?}");
        }
    }

    #[test]
    fn in_merge_bases_many_generation_shortcut() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        assert!(!engine.in_merge_bases_many(&oid(3), &[oid(1), oid(9)]).unwrap());
        assert!(engine.in_merge_bases_many(&oid(1), &[oid(9), oid(3)]).unwrap());
        assert!(!engine.in_merge_bases_many(&oid(1), &[]).unwrap());
    }

    #[test]
    fn in_merge_bases_many_lenient_on_missing() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let strict = Reachability::new(&graph);
        assert!(strict.in_merge_bases_many(&oid(1), &[oid(50)]).is_err());

        let config = ReachConfig {
            ignore_missing_commits: true,
            ..ReachConfig::default()
        };
        let lenient = Reachability::with_config(&graph, config);
        assert!(!lenient.in_merge_bases_many(&oid(1), &[oid(50)]).unwrap());
        assert!(!lenient.in_merge_bases_many(&oid(50), &[oid(3)]).unwrap());
    }

    #[test]
    fn reach_with_flag_leaves_target_marks() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut flags = FlagStore::new();
        flags.insert(oid(1), CommitFlags::PARENT2);

        let ok = engine
            .can_all_from_reach_with_flag(&mut flags, &[oid(3), oid(2)], CommitFlags::PARENT2, CommitFlags::ASSIGN, 0, 0)
            .unwrap();
        assert!(ok);
        assert_eq!(flags.get(&oid(1)), CommitFlags::PARENT2);
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn reach_with_flag_fails_for_unrelated_source() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut flags = FlagStore::new();
        flags.insert(oid(2), CommitFlags::PARENT2);

        let ok = engine
            .can_all_from_reach_with_flag(&mut flags, &[oid(3), oid(9)], CommitFlags::PARENT2, CommitFlags::ASSIGN, 0, 0)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn generation_floor_rejects_low_source() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut flags = FlagStore::new();
        flags.insert(oid(2), CommitFlags::PARENT2);
        // Source 1 has generation 1, below the floor of 2.
        let ok = engine
            .can_all_from_reach_with_flag(&mut flags, &[oid(1)], CommitFlags::PARENT2, CommitFlags::ASSIGN, 0, 2)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn date_cutoff_uses_corrected_dates() {
        // 2 claims to be older than its parent; its corrected date is 41.
        let mut b = CommitGraphBuilder::new();
        b.add_commit(oid(1), [], 40)
            .add_commit(oid(2), [oid(1)], 37)
            .add_commit(oid(3), [oid(2)], 150);
        let graph = b.build(GenerationMode::CorrectedCommitDates).unwrap();
        let engine = Reachability::new(&graph);

        assert!(engine.can_all_from_reach(&[oid(3)], &[oid(1)], true).unwrap());

        let mut flags = FlagStore::new();
        flags.insert(oid(1), CommitFlags::PARENT2);
        let ok = engine
            .can_all_from_reach_with_flag(&mut flags, &[oid(3)], CommitFlags::PARENT2, CommitFlags::ASSIGN, 40, 0)
            .unwrap();
        assert!(ok);
    }

    #[test]
    #[should_panic(expected = "must be disjoint")]
    fn overlapping_flags_panic() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut flags = FlagStore::new();
        let _ = engine.can_all_from_reach_with_flag(
            &mut flags,
            &[oid(3)],
            CommitFlags::PARENT2,
            CommitFlags::PARENT2,
            0,
            0,
        );
    }

    #[test]
    fn reachable_subset_marks_found() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut flags = FlagStore::new();
        let found = engine
            .get_reachable_subset_with_flag(&mut flags, &[oid(3)], &[oid(1), oid(9), oid(2)], CommitFlags::SEEN)
            .unwrap();
        assert_eq!(found, vec![oid(1), oid(2)]);
        assert!(flags.contains(&oid(1), CommitFlags::SEEN));
        assert!(flags.contains(&oid(2), CommitFlags::SEEN));
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn ref_newer_is_fast_forward() {
        let graph = chain(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        assert!(engine.ref_newer(&oid(3), &oid(2)).unwrap());
        assert!(!engine.ref_newer(&oid(2), &oid(3)).unwrap());
        assert!(engine.ref_newer(&oid(2), &oid(2)).unwrap());
    }
}
