//! Redundancy reduction: drop candidates that are ancestors of other
//! candidates.

use std::collections::HashSet;
use std::sync::Arc;

use git_hash::ObjectId;

use crate::engine::{Reachability, RedundancyStrategy};
use crate::flags::{CommitFlags, FlagStore};
use crate::graph::{CommitGraphProvider, CommitNode, GENERATION_NUMBER_INFINITY};
use crate::paint::cmp_generation_ascending;
use crate::ReachError;

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// Reduce `heads` to the commits that are not ancestors of another head.
    ///
    /// Duplicates are dropped first; survivors keep their input order.
    pub fn reduce_heads(&self, heads: &[ObjectId]) -> Result<Vec<ObjectId>, ReachError> {
        self.reduce_heads_using(heads, self.redundancy_strategy())
    }

    /// [`reduce_heads`](Self::reduce_heads) with an explicit strategy.
    ///
    /// Both strategies return the same survivors on any graph whose
    /// generation numbers never decrease from parent to child.
    pub fn reduce_heads_using(
        &self,
        heads: &[ObjectId],
        strategy: RedundancyStrategy,
    ) -> Result<Vec<ObjectId>, ReachError> {
        let mut seen = HashSet::with_capacity(heads.len());
        let unique: Vec<ObjectId> = heads.iter().copied().filter(|id| seen.insert(*id)).collect();

        let candidates = self.resolve_all(&unique)?;
        let survivors = self.remove_redundant(candidates, strategy)?;
        Ok(survivors.into_iter().map(|c| c.id).collect())
    }

    /// Keep the candidates that are independent of each other.
    ///
    /// The generation-based sweep is only sound when at least one candidate
    /// has a real generation; otherwise the painter-based walk is used.
    pub(crate) fn remove_redundant(
        &self,
        candidates: Vec<Arc<CommitNode>>,
        strategy: RedundancyStrategy,
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        if candidates.len() <= 1 {
            return Ok(candidates);
        }

        let use_generations = strategy == RedundancyStrategy::WithGenerations
            && candidates
                .iter()
                .any(|c| self.generation(c) < GENERATION_NUMBER_INFINITY);

        if use_generations {
            self.remove_redundant_with_gen(candidates)
        } else {
            self.remove_redundant_no_gen(candidates)
        }
    }

    /// One painter walk per candidate against all candidates not yet known
    /// to be redundant, bounded by the lowest generation among them.
    fn remove_redundant_no_gen(
        &self,
        array: Vec<Arc<CommitNode>>,
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        let cnt = array.len();
        let mut redundant = vec![false; cnt];
        let mut flags = FlagStore::new();

        for i in 0..cnt {
            if redundant[i] {
                continue;
            }

            let mut min_generation = self.generation(&array[i]);
            let mut work = Vec::with_capacity(cnt - 1);
            let mut filled_index = Vec::with_capacity(cnt - 1);
            for j in 0..cnt {
                if i == j || redundant[j] {
                    continue;
                }
                filled_index.push(j);
                work.push(Arc::clone(&array[j]));
                min_generation = min_generation.min(self.generation(&array[j]));
            }

            self.paint_down_to_common(&mut flags, &array[i], &work, min_generation, false)?;

            if flags.intersects(&array[i].id, CommitFlags::PARENT2) {
                redundant[i] = true;
            }
            for (k, other) in work.iter().enumerate() {
                if flags.intersects(&other.id, CommitFlags::PARENT1) {
                    redundant[filled_index[k]] = true;
                }
            }
            flags.clear(CommitFlags::PAINT);
        }

        Ok(array
            .into_iter()
            .zip(redundant)
            .filter(|(_, redundant)| !redundant)
            .map(|(c, _)| c)
            .collect())
    }

    /// Single sweep from the candidates' parents, highest generation first.
    ///
    /// Every candidate is marked RESULT. Reaching a RESULT commit from some
    /// other candidate's parents proves it redundant. The floor rises each
    /// time the lowest-generation unresolved candidate is found, and the
    /// sweep stops once at most one candidate can still be independent.
    fn remove_redundant_with_gen(
        &self,
        array: Vec<Arc<CommitNode>>,
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        let cnt = array.len();
        let mut flags = FlagStore::new();
        let key = |c: &Arc<CommitNode>| (self.generation(c), c.date);

        let mut sorted = array.clone();
        sorted.sort_by(|a, b| cmp_generation_ascending(key(a), key(b)));
        let mut min_gen_pos = 0;
        let mut min_generation = self.generation(&sorted[0]);

        let mut walk_start: Vec<Arc<CommitNode>> = Vec::new();
        for commit in &array {
            flags.insert(commit.id, CommitFlags::RESULT);
            for parent in &commit.parents {
                if !flags.intersects(parent, CommitFlags::STALE) {
                    flags.insert(*parent, CommitFlags::STALE);
                    walk_start.push(self.resolve(parent)?);
                }
            }
        }

        walk_start.sort_by(|a, b| cmp_generation_ascending(key(a), key(b)));

        // Unmark for now so the sweep can walk through them.
        for start in &walk_start {
            flags.remove(&start.id, CommitFlags::STALE);
        }

        let mut count_still_independent = cnt;
        for start in walk_start.iter().rev() {
            if count_still_independent <= 1 {
                break;
            }

            flags.insert(start.id, CommitFlags::STALE);
            let mut stack = vec![Arc::clone(start)];

            while let Some(c) = stack.last().cloned() {
                if flags.intersects(&c.id, CommitFlags::RESULT) {
                    flags.remove(&c.id, CommitFlags::RESULT);
                    count_still_independent -= 1;
                    if count_still_independent <= 1 {
                        tracing::debug!("redundancy sweep resolved early");
                        break;
                    }
                    if c.id == sorted[min_gen_pos].id {
                        while min_gen_pos < cnt - 1
                            && flags.intersects(&sorted[min_gen_pos].id, CommitFlags::STALE)
                        {
                            min_gen_pos += 1;
                        }
                        min_generation = self.generation(&sorted[min_gen_pos]);
                    }
                }

                if self.generation(&c) < min_generation {
                    stack.pop();
                    continue;
                }

                let mut descended = false;
                for parent in &c.parents {
                    if !flags.intersects(parent, CommitFlags::STALE) {
                        flags.insert(*parent, CommitFlags::STALE);
                        stack.push(self.resolve(parent)?);
                        descended = true;
                        break;
                    }
                }

                // All parents visited already.
                if !descended {
                    stack.pop();
                }
            }
        }

        Ok(array
            .into_iter()
            .filter(|c| !flags.intersects(&c.id, CommitFlags::STALE))
            .collect())
    }
}
