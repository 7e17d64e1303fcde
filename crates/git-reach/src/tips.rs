//! Tip/base queries used to describe where branches stand.

use std::collections::HashMap;
use std::sync::Arc;

use git_hash::ObjectId;
use git_utils::collections::PriorityQueue;

use crate::engine::Reachability;
use crate::flags::{CommitFlags, FlagStore};
use crate::graph::{CommitGraphProvider, CommitNode, GENERATION_NUMBER_INFINITY};
use crate::paint::{compare_by_gen_then_date, WalkEntry};
use crate::ReachError;

/// Which starting point claimed a commit during the branch-base walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Best {
    Tip,
    Base(usize),
}

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// For each of `tips`, whether it is reachable from some commit in `bases`.
    ///
    /// A depth-first search from the bases that never descends below the
    /// lowest generation among the tips not yet found, and ends as soon as
    /// every tip is found.
    pub fn tips_reachable_from_bases(&self, bases: &[ObjectId], tips: &[ObjectId]) -> Result<Vec<bool>, ReachError> {
        let mut found = vec![false; tips.len()];
        if bases.is_empty() || tips.is_empty() {
            return Ok(found);
        }

        let mut sorted: Vec<(usize, ObjectId, u64)> = Vec::with_capacity(tips.len());
        for (i, id) in tips.iter().enumerate() {
            let node = self.resolve(id)?;
            sorted.push((i, *id, self.generation(&node)));
        }
        sorted.sort_by_key(|&(_, _, generation)| generation);

        let mut min_index = 0;
        let mut min_generation = sorted[0].2;
        let mut flags = FlagStore::new();

        let mut stack: Vec<Arc<CommitNode>> = Vec::with_capacity(bases.len());
        for id in bases.iter().rev() {
            stack.push(self.resolve(id)?);
        }

        'walk: while let Some(c) = stack.last().cloned() {
            let c_gen = self.generation(&c);

            for j in min_index..sorted.len() {
                let (index, id, generation) = sorted[j];
                if c_gen < generation {
                    break;
                }
                if id != c.id {
                    continue;
                }
                found[index] = true;

                if j == min_index {
                    let mut k = j + 1;
                    while k < sorted.len() && found[sorted[k].0] {
                        k += 1;
                    }
                    if k >= sorted.len() {
                        break 'walk;
                    }
                    min_index = k;
                    min_generation = sorted[k].2;
                }
            }

            let mut explored_all_parents = true;
            for parent in &c.parents {
                if flags.intersects(parent, CommitFlags::SEEN) {
                    continue;
                }
                let node = self.resolve(parent)?;
                if self.generation(&node) < min_generation {
                    continue;
                }
                flags.insert(*parent, CommitFlags::SEEN);
                explored_all_parents = false;
                stack.push(node);
                break;
            }

            if explored_all_parents {
                stack.pop();
            }
        }

        Ok(found)
    }

    /// Pick the base that `tip`'s first-parent history meets first.
    ///
    /// Walks first parents only, from `tip` and all of `bases` together. The
    /// answer is the lowest base index whose first-parent chain joins the
    /// tip's chain at the newest point. Returns `None` when no base meets it
    /// or `bases` is empty.
    pub fn branch_base_for_tip(&self, tip: &ObjectId, bases: &[ObjectId]) -> Result<Option<usize>, ReachError> {
        if bases.is_empty() {
            return Ok(None);
        }

        let tip_node = self.resolve(tip)?;
        let base_nodes = self.resolve_all(bases)?;

        let missing_generation = std::iter::once(&tip_node)
            .chain(&base_nodes)
            .any(|c| self.generation(c) == GENERATION_NUMBER_INFINITY);
        let overlay = if missing_generation {
            let mut all = base_nodes.clone();
            all.push(Arc::clone(&tip_node));
            self.ensure_generations(&all)?
        } else {
            HashMap::new()
        };
        let entry = |node: Arc<CommitNode>| {
            let generation = self.overlaid_generation(&overlay, &node);
            WalkEntry { node, generation }
        };

        let mut best: HashMap<ObjectId, Best> = HashMap::new();
        let mut queue = PriorityQueue::new(compare_by_gen_then_date);

        best.insert(tip_node.id, Best::Tip);
        queue.put(entry(Arc::clone(&tip_node)));

        for (i, node) in base_nodes.into_iter().enumerate() {
            match best.get(&node.id) {
                Some(Best::Tip) => return Ok(Some(i)),
                Some(Best::Base(_)) => continue,
                None => {
                    best.insert(node.id, Best::Base(i));
                    queue.put(entry(node));
                }
            }
        }

        let mut best_index: Option<usize> = None;
        let mut branch_point: Option<ObjectId> = None;

        while let Some(WalkEntry { node: c, .. }) = queue.get() {
            if branch_point == Some(c.id) {
                break;
            }
            let Some(first_parent) = c.parents.first() else {
                continue;
            };
            let Some(best_for_c) = best.get(&c.id).copied() else {
                continue;
            };

            let parent = self.resolve(first_parent)?;
            let best_for_p = match best.get(first_parent).copied() {
                None => {
                    best.insert(parent.id, best_for_c);
                    queue.put(entry(parent));
                    continue;
                }
                Some(best_for_p) => best_for_p,
            };

            let base = match (best_for_c, best_for_p) {
                (Best::Base(c_idx), Best::Base(p_idx)) => {
                    if c_idx < p_idx {
                        best.insert(parent.id, best_for_c);
                    }
                    continue;
                }
                (Best::Tip, Best::Base(idx)) | (Best::Base(idx), Best::Tip) => idx,
                (Best::Tip, Best::Tip) => {
                    // Both sides already came from the tip; nothing to learn.
                    branch_point = Some(parent.id);
                    continue;
                }
            };

            best_index = Some(best_index.map_or(base, |current| current.min(base)));
            best.insert(parent.id, Best::Tip);
            branch_point = Some(parent.id);
        }

        tracing::debug!(tip = %tip, bases = bases.len(), ?best_index, "branch base");
        Ok(best_index)
    }
}
