//! Ahead/behind counts for many tip/base pairs in one walk.

use std::collections::HashMap;
use std::sync::Arc;

use git_hash::ObjectId;
use git_utils::collections::PriorityQueue;

use crate::engine::Reachability;
use crate::flags::{CommitFlags, FlagStore};
use crate::graph::{CommitGraphProvider, CommitNode};
use crate::paint::{compare_by_gen_then_date, queue_has_nonstale, WalkEntry};
use crate::ReachError;

/// One requested comparison, indexing into the `commits` slice passed to
/// [`Reachability::ahead_behind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AheadBehindCount {
    pub tip_index: usize,
    pub base_index: usize,
    /// Commits reachable from the tip but not the base.
    pub ahead: u32,
    /// Commits reachable from the base but not the tip.
    pub behind: u32,
}

impl AheadBehindCount {
    pub fn new(tip_index: usize, base_index: usize) -> Self {
        Self {
            tip_index,
            base_index,
            ..Self::default()
        }
    }
}

struct BitSet(Vec<u64>);

impl BitSet {
    fn new(width: usize) -> Self {
        Self(vec![0; width.div_ceil(64)])
    }

    fn set(&mut self, i: usize) {
        self.0[i / 64] |= 1u64 << (i % 64);
    }

    fn get(&self, i: usize) -> bool {
        self.0[i / 64] & (1u64 << (i % 64)) != 0
    }

    fn or(&mut self, other: &BitSet) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= b;
        }
    }

    fn count(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// Fill in `ahead` and `behind` for every entry of `counts`.
    ///
    /// Each commit on the walk carries a bitset of which `commits` reach it.
    /// A commit reached by every input can no longer change any count, so
    /// the walk ends once only such commits are queued.
    ///
    /// # Panics
    ///
    /// Panics if a count refers to an index outside `commits`.
    pub fn ahead_behind(&self, commits: &[ObjectId], counts: &mut [AheadBehindCount]) -> Result<(), ReachError> {
        for count in counts.iter_mut() {
            assert!(
                count.tip_index < commits.len() && count.base_index < commits.len(),
                "ahead/behind index out of range for {} commits",
                commits.len()
            );
            count.ahead = 0;
            count.behind = 0;
        }
        if commits.is_empty() || counts.is_empty() {
            return Ok(());
        }

        let nodes = self.resolve_all(commits)?;
        let overlay = self.ensure_generations(&nodes)?;
        let entry = |node: Arc<CommitNode>| {
            let generation = self.overlaid_generation(&overlay, &node);
            WalkEntry { node, generation }
        };

        let width = commits.len();
        let mut bits: HashMap<ObjectId, BitSet> = HashMap::new();
        let mut flags = FlagStore::new();
        let mut queue = PriorityQueue::new(compare_by_gen_then_date);

        for (i, node) in nodes.iter().enumerate() {
            bits.entry(node.id).or_insert_with(|| BitSet::new(width)).set(i);
            if !flags.intersects(&node.id, CommitFlags::PARENT2) {
                flags.insert(node.id, CommitFlags::PARENT2);
                queue.put(entry(Arc::clone(node)));
            }
        }

        let mut walked = 0usize;
        while queue_has_nonstale(&queue, &flags) {
            let Some(WalkEntry { node: c, .. }) = queue.get() else {
                break;
            };
            walked += 1;
            let bits_c = bits.remove(&c.id).unwrap_or_else(|| BitSet::new(width));

            for count in counts.iter_mut() {
                let from_tip = bits_c.get(count.tip_index);
                let from_base = bits_c.get(count.base_index);
                if from_tip != from_base {
                    if from_base {
                        count.behind += 1;
                    } else {
                        count.ahead += 1;
                    }
                }
            }

            for parent in &c.parents {
                let node = self.resolve(parent)?;
                let bits_p = bits.entry(*parent).or_insert_with(|| BitSet::new(width));
                bits_p.or(&bits_c);

                if bits_p.count() == width {
                    flags.insert(*parent, CommitFlags::STALE);
                }
                if !flags.intersects(parent, CommitFlags::PARENT2) {
                    flags.insert(*parent, CommitFlags::PARENT2);
                    queue.put(entry(node));
                }
            }
        }

        tracing::debug!(commits = width, pairs = counts.len(), walked, "ahead/behind");
        Ok(())
    }
}
