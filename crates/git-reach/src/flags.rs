//! Per-call commit marking.
//!
//! Walks paint commits with a handful of bits. Instead of storing those bits
//! on shared commit objects, every call owns a [`FlagStore`], so a leaked bit
//! can never bleed into an unrelated query.

use std::collections::HashMap;

use git_hash::ObjectId;

bitflags::bitflags! {
    /// Transient marking bits attached to a commit during one walk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommitFlags: u8 {
        /// Reachable from the "one" side of a merge-base walk.
        const PARENT1 = 1 << 0;
        /// Reachable from the "others" side of a merge-base walk.
        const PARENT2 = 1 << 1;
        /// Ancestor of an already-found common ancestor.
        const STALE = 1 << 2;
        /// Recorded as a result.
        const RESULT = 1 << 3;
        /// Scratch bit for callers of `can_all_from_reach_with_flag`.
        const ASSIGN = 1 << 4;
        /// Visited by a depth-first tip search.
        const SEEN = 1 << 5;

        /// Every bit a merge-base walk may leave behind.
        const PAINT = Self::PARENT1.bits()
            | Self::PARENT2.bits()
            | Self::STALE.bits()
            | Self::RESULT.bits();
    }
}

/// Flag bits for the commits touched by one call.
#[derive(Debug, Default, Clone)]
pub struct FlagStore {
    flags: HashMap<ObjectId, CommitFlags>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bits of `id` (empty if never touched).
    pub fn get(&self, id: &ObjectId) -> CommitFlags {
        self.flags.get(id).copied().unwrap_or_default()
    }

    /// Whether `id` carries any bit of `mask`.
    pub fn intersects(&self, id: &ObjectId, mask: CommitFlags) -> bool {
        self.get(id).intersects(mask)
    }

    /// Whether `id` carries every bit of `mask`.
    pub fn contains(&self, id: &ObjectId, mask: CommitFlags) -> bool {
        self.get(id).contains(mask)
    }

    /// Set the bits of `mask` on `id`.
    pub fn insert(&mut self, id: ObjectId, mask: CommitFlags) {
        *self.flags.entry(id).or_default() |= mask;
    }

    /// Clear the bits of `mask` on `id`.
    pub fn remove(&mut self, id: &ObjectId, mask: CommitFlags) {
        if let Some(bits) = self.flags.get_mut(id) {
            bits.remove(mask);
            if bits.is_empty() {
                self.flags.remove(id);
            }
        }
    }

    /// Set or clear `mask` on `id`.
    pub fn set(&mut self, id: ObjectId, mask: CommitFlags, value: bool) {
        if value {
            self.insert(id, mask);
        } else {
            self.remove(&id, mask);
        }
    }

    /// Clear `mask` on every commit in the store.
    pub fn clear(&mut self, mask: CommitFlags) {
        self.flags.retain(|_, bits| {
            bits.remove(mask);
            !bits.is_empty()
        });
    }

    /// Clear `mask` on the listed commits only.
    pub fn clear_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a ObjectId>, mask: CommitFlags) {
        for id in ids {
            self.remove(id, mask);
        }
    }

    /// Whether no commit carries any bit.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of commits currently carrying at least one bit.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Commits currently carrying at least one bit (unordered).
    pub fn marked(&self) -> impl Iterator<Item = (&ObjectId, CommitFlags)> {
        self.flags.iter().map(|(id, bits)| (id, *bits))
    }

    /// Panic if any of `ids` still carries a bit of `mask`.
    ///
    /// Starting a walk on top of leftover marks silently corrupts its result,
    /// so this is treated as a programming error.
    pub(crate) fn assert_unmarked<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ObjectId>,
        mask: CommitFlags,
    ) {
        for id in ids {
            let bits = self.get(id) & mask;
            assert!(
                bits.is_empty(),
                "commit {id} still carries {bits:?} from an earlier walk"
            );
        }
    }
}

/// Marks left behind by a walk that skipped its cleanup step.
///
/// Returned by [`Reachability::merge_bases_many_dirty`]. The caller may run
/// further queries against the same [`FlagStore`] and then release the marks
/// once with [`PendingCleanup::clear`].
///
/// [`Reachability::merge_bases_many_dirty`]: crate::Reachability::merge_bases_many_dirty
#[must_use = "painted flags stay set until `PendingCleanup::clear` is called"]
#[derive(Debug)]
pub struct PendingCleanup {
    mask: CommitFlags,
}

impl PendingCleanup {
    pub(crate) fn new(mask: CommitFlags) -> Self {
        Self { mask }
    }

    /// Bits this token will clear.
    pub fn mask(&self) -> CommitFlags {
        self.mask
    }

    /// Release the marks.
    pub fn clear(self, flags: &mut FlagStore) {
        flags.clear(self.mask);
    }
}
