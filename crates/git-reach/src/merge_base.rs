//! Merge-base computation on top of the painter.

use std::sync::Arc;

use git_hash::ObjectId;

use crate::engine::Reachability;
use crate::flags::{CommitFlags, FlagStore, PendingCleanup};
use crate::graph::{CommitGraphProvider, CommitNode};
use crate::paint::insert_by_date;
use crate::ReachError;

fn ids(list: &[Arc<CommitNode>]) -> Vec<ObjectId> {
    list.iter().map(|c| c.id).collect()
}

impl<G: CommitGraphProvider + ?Sized> Reachability<'_, G> {
    /// All merge bases of `one` and `two`, newest first.
    ///
    /// Returns the lowest common ancestors: commits reachable from both that
    /// are not ancestors of any other common ancestor.
    pub fn merge_bases(&self, one: &ObjectId, two: &ObjectId) -> Result<Vec<ObjectId>, ReachError> {
        self.merge_bases_many(one, std::slice::from_ref(two))
    }

    /// The single best merge base of two commits.
    pub fn merge_base_one(&self, one: &ObjectId, two: &ObjectId) -> Result<Option<ObjectId>, ReachError> {
        let bases = self.merge_bases(one, two)?;
        Ok(bases.into_iter().next())
    }

    /// Merge bases of `one` against the union of `others`, newest first.
    pub fn merge_bases_many(&self, one: &ObjectId, others: &[ObjectId]) -> Result<Vec<ObjectId>, ReachError> {
        let mut flags = FlagStore::new();
        let bases = self.merge_bases_many_0(&mut flags, one, others, true)?;
        Ok(ids(&bases))
    }

    /// Like [`merge_bases_many`](Self::merge_bases_many), but leaves the
    /// painted flags in `flags` so the caller can inspect them or chain more
    /// work before releasing them through the returned token.
    ///
    /// # Panics
    ///
    /// Panics if any input commit already carries painter flags in `flags`.
    pub fn merge_bases_many_dirty(
        &self,
        flags: &mut FlagStore,
        one: &ObjectId,
        others: &[ObjectId],
    ) -> Result<(Vec<ObjectId>, PendingCleanup), ReachError> {
        flags.assert_unmarked(std::iter::once(one).chain(others), CommitFlags::PAINT);
        let bases = self.merge_bases_many_0(flags, one, others, false)?;
        Ok((ids(&bases), PendingCleanup::new(CommitFlags::PAINT)))
    }

    /// Merge bases across more than two tips, folded pairwise.
    ///
    /// Starting from the first tip, each further tip is merged against every
    /// base found so far and the results are unioned in first-seen order.
    /// The accumulated set holds no duplicates but is not reduced; pass it
    /// through [`reduce_heads`](Self::reduce_heads) when a minimal set is
    /// needed.
    pub fn octopus_merge_bases(&self, tips: &[ObjectId]) -> Result<Vec<ObjectId>, ReachError> {
        let Some((first, rest)) = tips.split_first() else {
            return Ok(Vec::new());
        };

        let mut result = vec![*first];
        for tip in rest {
            let mut next = Vec::new();
            for base in &result {
                for id in self.merge_bases(tip, base)? {
                    if !next.contains(&id) {
                        next.push(id);
                    }
                }
            }
            result = next;
        }
        tracing::debug!(tips = tips.len(), bases = result.len(), "octopus merge bases");
        Ok(result)
    }

    /// Run the painter and keep only non-stale common ancestors.
    fn merge_bases_many_raw(
        &self,
        flags: &mut FlagStore,
        one: &Arc<CommitNode>,
        twos: &[Arc<CommitNode>],
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        let list = self.paint_down_to_common(flags, one, twos, 0, false)?;

        let mut result = Vec::new();
        for commit in list {
            if !flags.intersects(&commit.id, CommitFlags::STALE) {
                insert_by_date(&mut result, commit);
            }
        }
        Ok(result)
    }

    fn merge_bases_many_0(
        &self,
        flags: &mut FlagStore,
        one: &ObjectId,
        others: &[ObjectId],
        cleanup: bool,
    ) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        // Unpainted on purpose: nothing to clean up on this path.
        if others.contains(one) {
            return Ok(vec![self.resolve(one)?]);
        }

        let one_node = self.resolve(one)?;
        let twos = self.resolve_all(others)?;
        tracing::debug!(one = %one, others = others.len(), "computing merge bases");

        let result = self.merge_bases_many_raw(flags, &one_node, &twos)?;
        if result.len() <= 1 {
            if cleanup {
                flags.clear(CommitFlags::PAINT);
            }
            return Ok(result);
        }

        // Reduction runs its own walks and needs a clean slate.
        flags.clear(CommitFlags::PAINT);

        let count = result.len();
        let reduced = self.remove_redundant(result, self.redundancy_strategy())?;
        if reduced.len() < count {
            tracing::debug!(before = count, after = reduced.len(), "dropped redundant merge bases");
        }

        let mut sorted = Vec::with_capacity(reduced.len());
        for commit in reduced {
            insert_by_date(&mut sorted, commit);
        }
        Ok(sorted)
    }
}
