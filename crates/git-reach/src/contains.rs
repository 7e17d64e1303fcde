//! Memoized containment checks for filtering many refs against one set.

use std::collections::HashMap;
use std::sync::Arc;

use git_hash::ObjectId;

use crate::engine::Reachability;
use crate::graph::{CommitGraphProvider, CommitNode, GENERATION_NUMBER_INFINITY};
use crate::ReachError;

/// Memoized answer for one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainsResult {
    #[default]
    Unknown,
    No,
    Yes,
}

/// Answers remembered across [`Reachability::commit_contains`] calls.
///
/// A cache is only valid for one `want` set; start a fresh one when the set
/// changes.
#[derive(Debug, Default)]
pub struct ContainsCache {
    answers: HashMap<ObjectId, ContainsResult>,
}

impl ContainsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> ContainsResult {
        self.answers.get(id).copied().unwrap_or_default()
    }

    fn set(&mut self, id: ObjectId, answer: ContainsResult) {
        self.answers.insert(id, answer);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

struct Frame {
    node: Arc<CommitNode>,
    next_parent: usize,
}

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// Does `candidate` contain (is it a descendant of) any commit in `want`?
    ///
    /// Depth-first with every visited commit's answer stored in `cache`, so
    /// checking many candidates that share history against one `want` set
    /// walks each commit once. Commits below the lowest generation in `want`
    /// are answered "no" without walking further.
    pub fn commit_contains(
        &self,
        candidate: &ObjectId,
        want: &[ObjectId],
        cache: &mut ContainsCache,
    ) -> Result<bool, ReachError> {
        let mut cutoff = GENERATION_NUMBER_INFINITY;
        for id in want {
            cutoff = cutoff.min(self.generation(&*self.resolve(id)?));
        }

        let start = self.resolve(candidate)?;
        let result = self.contains_test(&start, want, cache, cutoff);
        if result != ContainsResult::Unknown {
            return Ok(result == ContainsResult::Yes);
        }

        let mut stack = vec![Frame {
            node: Arc::clone(&start),
            next_parent: 0,
        }];
        while let Some(frame) = stack.last_mut() {
            let Some(parent_id) = frame.node.parents.get(frame.next_parent).copied() else {
                cache.set(frame.node.id, ContainsResult::No);
                stack.pop();
                continue;
            };

            // A parent popped off the stack is cached, so this is decisive.
            let parent = self.resolve(&parent_id)?;
            match self.contains_test(&parent, want, cache, cutoff) {
                ContainsResult::Yes => {
                    cache.set(frame.node.id, ContainsResult::Yes);
                    stack.pop();
                }
                ContainsResult::No => frame.next_parent += 1,
                ContainsResult::Unknown => stack.push(Frame {
                    node: parent,
                    next_parent: 0,
                }),
            }
        }

        Ok(self.contains_test(&start, want, cache, cutoff) == ContainsResult::Yes)
    }

    /// Decide `candidate` without walking, if possible.
    fn contains_test(
        &self,
        candidate: &CommitNode,
        want: &[ObjectId],
        cache: &mut ContainsCache,
        cutoff: u64,
    ) -> ContainsResult {
        let cached = cache.get(&candidate.id);
        if cached != ContainsResult::Unknown {
            return cached;
        }

        if want.contains(&candidate.id) {
            cache.set(candidate.id, ContainsResult::Yes);
            return ContainsResult::Yes;
        }

        if self.generation(candidate) < cutoff {
            return ContainsResult::No;
        }
        ContainsResult::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommitGraphBuilder, GenerationMode, MemoryGraph};

    fn oid(n: u64) -> ObjectId {
        ObjectId::from_index(n)
    }

    /// 1 <- 2 <- 3 <- 4, and a side branch 2 <- 5.
    fn graph(mode: GenerationMode) -> MemoryGraph {
        let mut b = CommitGraphBuilder::new();
        b.add_commit(oid(1), [], 10)
            .add_commit(oid(2), [oid(1)], 20)
            .add_commit(oid(3), [oid(2)], 30)
            .add_commit(oid(4), [oid(3)], 40)
            .add_commit(oid(5), [oid(2)], 50);
        b.build(mode).unwrap()
    }

    #[test]
    fn contains_descendants_only() {
        for mode in [GenerationMode::TopologicalLevels, GenerationMode::None] {
            let graph = graph(mode);
            let engine = Reachability::new(&graph);
            let mut cache = ContainsCache::new();
            let want = [oid(3)];
            assert!(engine.commit_contains(&oid(4), &want, &mut cache).unwrap(), "{mode:?}");
            assert!(engine.commit_contains(&oid(3), &want, &mut cache).unwrap(), "{mode:?}");
            assert!(!engine.commit_contains(&oid(5), &want, &mut cache).unwrap(), "{mode:?}");
            assert!(!engine.commit_contains(&oid(1), &want, &mut cache).unwrap(), "{mode:?}");
        }
    }

    #[test]
    fn cache_records_walked_commits() {
        let graph = graph(GenerationMode::None);
        let engine = Reachability::new(&graph);
        let mut cache = ContainsCache::new();
        assert!(!engine.commit_contains(&oid(4), &[oid(5)], &mut cache).unwrap());
        for n in 1..=4 {
            assert_eq!(cache.get(&oid(n)), ContainsResult::No, "commit {n}");
        }
        assert_eq!(cache.get(&oid(5)), ContainsResult::Unknown);
    }

    #[test]
    fn cutoff_skips_old_history() {
        let graph = graph(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut cache = ContainsCache::new();
        assert!(!engine.commit_contains(&oid(4), &[oid(5)], &mut cache).unwrap());
        // Generation 2 is below the floor of 3 and never cached.
        assert_eq!(cache.get(&oid(2)), ContainsResult::Unknown);
        assert_eq!(cache.get(&oid(3)), ContainsResult::No);
    }

    #[test]
    fn empty_want_is_never_contained() {
        let graph = graph(GenerationMode::TopologicalLevels);
        let engine = Reachability::new(&graph);
        let mut cache = ContainsCache::new();
        assert!(!engine.commit_contains(&oid(4), &[], &mut cache).unwrap());
    }
}
