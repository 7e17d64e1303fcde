//! Paint-down-to-common: the walk underneath every merge-base query.
//!
//! Commits reachable from "one" are painted PARENT1, commits reachable from
//! any of the "others" are painted PARENT2. A commit carrying both colors is
//! a common ancestor; everything below it is painted STALE so it is walked
//! for bookkeeping but never reported.

use std::cmp::Ordering;
use std::sync::Arc;

use git_utils::collections::PriorityQueue;

use crate::engine::Reachability;
use crate::flags::{CommitFlags, FlagStore};
use crate::graph::{CommitGraphProvider, CommitNode, GENERATION_NUMBER_INFINITY};
use crate::ReachError;

/// A queued commit with the generation it was ordered by.
#[derive(Clone)]
pub(crate) struct WalkEntry {
    pub(crate) node: Arc<CommitNode>,
    pub(crate) generation: u64,
}

/// Highest generation first, then newest commit date.
pub(crate) fn compare_by_gen_then_date(a: &WalkEntry, b: &WalkEntry) -> Ordering {
    b.generation
        .cmp(&a.generation)
        .then_with(|| b.node.date.cmp(&a.node.date))
}

/// Newest commit date first.
pub(crate) fn compare_by_date(a: &WalkEntry, b: &WalkEntry) -> Ordering {
    b.node.date.cmp(&a.node.date)
}

/// Ascending generation, then ascending date; used to sort candidate arrays.
pub(crate) fn cmp_generation_ascending(a: (u64, i64), b: (u64, i64)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

/// Insert `node` before the first entry with an older date.
///
/// Entries with equal dates keep their insertion order.
pub(crate) fn insert_by_date(list: &mut Vec<Arc<CommitNode>>, node: Arc<CommitNode>) {
    let pos = list
        .iter()
        .position(|c| c.date < node.date)
        .unwrap_or(list.len());
    list.insert(pos, node);
}

pub(crate) fn queue_has_nonstale(queue: &PriorityQueue<WalkEntry>, flags: &FlagStore) -> bool {
    queue
        .iter()
        .any(|entry| !flags.intersects(&entry.node.id, CommitFlags::STALE))
}

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    pub(crate) fn walk_entry(&self, node: Arc<CommitNode>) -> WalkEntry {
        let generation = self.generation(&node);
        WalkEntry { node, generation }
    }

    /// Find the commits reachable from both `one` and at least one of `twos`.
    ///
    /// Results come back newest first. Flags stay in `flags` for the caller to
    /// inspect and clear. With `ignore_missing`, an unloadable ancestor ends
    /// the walk with an empty result instead of an error.
    pub(crate) fn paint_down_to_common(
        &self,
        flags: &mut FlagStore,
        one: &Arc<CommitNode>,
        twos: &[Arc<CommitNode>],
        min_generation: u64,
        ignore_missing: bool,
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        let mut result = Vec::new();

        flags.insert(one.id, CommitFlags::PARENT1);
        if twos.is_empty() {
            result.push(Arc::clone(one));
            return Ok(result);
        }

        let mut queue = if min_generation == 0 && !self.corrected_commit_dates_enabled() {
            PriorityQueue::new(compare_by_date)
        } else {
            PriorityQueue::new(compare_by_gen_then_date)
        };

        queue.put(self.walk_entry(Arc::clone(one)));
        for two in twos {
            flags.insert(two.id, CommitFlags::PARENT2);
            queue.put(self.walk_entry(Arc::clone(two)));
        }

        let mut last_gen = GENERATION_NUMBER_INFINITY;
        while queue_has_nonstale(&queue, flags) {
            let Some(WalkEntry { node: commit, generation }) = queue.get() else {
                break;
            };

            if min_generation > 0 {
                assert!(
                    generation <= last_gen,
                    "bad generation skip {generation} > {last_gen} at {}",
                    commit.id
                );
            }
            last_gen = generation;

            if generation < min_generation {
                tracing::trace!(commit = %commit.id, generation, min_generation, "below generation floor");
                break;
            }

            let mut propagate =
                flags.get(&commit.id) & (CommitFlags::PARENT1 | CommitFlags::PARENT2 | CommitFlags::STALE);
            if propagate == CommitFlags::PARENT1 | CommitFlags::PARENT2 {
                if !flags.contains(&commit.id, CommitFlags::RESULT) {
                    flags.insert(commit.id, CommitFlags::RESULT);
                    tracing::trace!(commit = %commit.id, "common ancestor");
                    insert_by_date(&mut result, Arc::clone(&commit));
                }
                propagate |= CommitFlags::STALE;
            }

            for parent in &commit.parents {
                if flags.contains(parent, propagate) {
                    continue;
                }
                let node = match self.resolve(parent) {
                    Ok(node) => node,
                    Err(_) if ignore_missing => return Ok(Vec::new()),
                    Err(err) => return Err(err),
                };
                flags.insert(*parent, propagate);
                queue.put(self.walk_entry(node));
            }
        }

        Ok(result)
    }
}
