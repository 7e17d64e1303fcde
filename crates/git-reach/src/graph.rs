//! Commit graph access: the provider boundary and an in-memory graph.
//!
//! The engine only ever asks one question of storage: "what are this commit's
//! parents, date, and generation?". [`CommitGraphProvider`] is that question.
//! [`MemoryGraph`] answers it from a table built with [`CommitGraphBuilder`],
//! computing generation numbers the same way a commit-graph writer does.

use std::collections::HashMap;
use std::sync::Arc;

use git_hash::ObjectId;

use crate::{GraphError, ReachError};

/// Generation value meaning "unknown": sorts above every real generation.
pub const GENERATION_NUMBER_INFINITY: u64 = (1 << 63) - 1;

/// Generation value of a commit that has not been assigned one yet.
pub const GENERATION_NUMBER_ZERO: u64 = 0;

/// Immutable commit metadata needed for traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    pub id: ObjectId,
    pub parents: Vec<ObjectId>,
    /// Committer timestamp (seconds since epoch).
    pub date: i64,
    /// Generation number, or [`GENERATION_NUMBER_INFINITY`] when unknown.
    pub generation: u64,
}

impl CommitNode {
    /// Whether this commit carries a real generation number.
    pub fn has_generation(&self) -> bool {
        self.generation != GENERATION_NUMBER_INFINITY
    }
}

/// Source of commit metadata.
///
/// Resolution is synchronous. Failures are reported as-is; the engine never
/// retries them.
pub trait CommitGraphProvider {
    /// Load the commit with the given id.
    fn resolve(&self, id: &ObjectId) -> Result<Arc<CommitNode>, GraphError>;

    /// Whether generation numbers from this provider can be trusted as a
    /// lower bound for pruning.
    fn has_generation_numbers(&self) -> bool {
        true
    }

    /// Whether generation numbers are corrected commit dates, which makes
    /// pure date ordering and date floors safe in the presence of clock skew.
    fn corrected_commit_dates(&self) -> bool {
        false
    }
}

impl<P: CommitGraphProvider + ?Sized> CommitGraphProvider for Arc<P> {
    fn resolve(&self, id: &ObjectId) -> Result<Arc<CommitNode>, GraphError> {
        (**self).resolve(id)
    }

    fn has_generation_numbers(&self) -> bool {
        (**self).has_generation_numbers()
    }

    fn corrected_commit_dates(&self) -> bool {
        (**self).corrected_commit_dates()
    }
}

/// How [`CommitGraphBuilder::build`] assigns generation numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// Leave every generation at [`GENERATION_NUMBER_INFINITY`].
    None,
    /// Topological level: roots are 1, every other commit is one more than
    /// its highest parent.
    #[default]
    TopologicalLevels,
    /// Corrected commit date: the commit date, raised to one past the highest
    /// parent's corrected date when the clock went backwards.
    CorrectedCommitDates,
}

/// A commit queued for inclusion in a [`MemoryGraph`].
struct CommitEntry {
    oid: ObjectId,
    parent_oids: Vec<ObjectId>,
    commit_time: i64,
}

/// Collects commits and turns them into a [`MemoryGraph`].
#[derive(Default)]
pub struct CommitGraphBuilder {
    commits: Vec<CommitEntry>,
}

impl CommitGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit. Parents do not have to be added first, or at all:
    /// a parent missing from the graph surfaces when a walk reaches it.
    pub fn add_commit(
        &mut self,
        oid: ObjectId,
        parents: impl IntoIterator<Item = ObjectId>,
        commit_time: i64,
    ) -> &mut Self {
        self.commits.push(CommitEntry {
            oid,
            parent_oids: parents.into_iter().collect(),
            commit_time,
        });
        self
    }

    /// Number of commits added so far.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Compute generation numbers and freeze the graph.
    pub fn build(self, mode: GenerationMode) -> Result<MemoryGraph, ReachError> {
        let mut oid_to_idx: HashMap<ObjectId, usize> = HashMap::with_capacity(self.commits.len());
        for (i, c) in self.commits.iter().enumerate() {
            if oid_to_idx.insert(c.oid, i).is_some() {
                return Err(ReachError::InvalidCommitGraph(format!(
                    "duplicate commit {}",
                    c.oid
                )));
            }
        }

        let generations = match mode {
            GenerationMode::None => vec![GENERATION_NUMBER_INFINITY; self.commits.len()],
            _ => self.compute_generations(&oid_to_idx, mode)?,
        };

        let nodes = self
            .commits
            .into_iter()
            .zip(generations)
            .map(|(c, generation)| {
                let node = CommitNode {
                    id: c.oid,
                    parents: c.parent_oids,
                    date: c.commit_time,
                    generation,
                };
                (c.oid, Arc::new(node))
            })
            .collect();

        Ok(MemoryGraph { nodes, mode })
    }

    /// Compute generations bottom-up with an explicit stack, so deep
    /// histories cannot overflow the call stack.
    fn compute_generations(
        &self,
        oid_to_idx: &HashMap<ObjectId, usize>,
        mode: GenerationMode,
    ) -> Result<Vec<u64>, ReachError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Visit {
            New,
            Open,
            Done,
        }

        let n = self.commits.len();
        let parent_indices: Vec<Vec<usize>> = self
            .commits
            .iter()
            .map(|c| {
                c.parent_oids
                    .iter()
                    .filter_map(|p| oid_to_idx.get(p).copied())
                    .collect()
            })
            .collect();

        let mut generations = vec![GENERATION_NUMBER_ZERO; n];
        let mut state = vec![Visit::New; n];
        let mut stack: Vec<(usize, bool)> = Vec::new();

        for start in 0..n {
            if state[start] != Visit::New {
                continue;
            }
            stack.push((start, false));
            while let Some((idx, finish)) = stack.pop() {
                if finish {
                    let mut max_parent = GENERATION_NUMBER_ZERO;
                    for &p in &parent_indices[idx] {
                        if state[p] != Visit::Done {
                            return Err(ReachError::InvalidCommitGraph(format!(
                                "cycle through commit {}",
                                self.commits[idx].oid
                            )));
                        }
                        max_parent = max_parent.max(generations[p]);
                    }
                    generations[idx] = match mode {
                        GenerationMode::CorrectedCommitDates => {
                            let date = u64::try_from(self.commits[idx].commit_time).unwrap_or(0);
                            date.max(max_parent + 1)
                        }
                        _ => max_parent + 1,
                    };
                    state[idx] = Visit::Done;
                } else if state[idx] == Visit::New {
                    state[idx] = Visit::Open;
                    stack.push((idx, true));
                    for &p in &parent_indices[idx] {
                        if state[p] == Visit::New {
                            stack.push((p, false));
                        }
                    }
                }
            }
        }

        Ok(generations)
    }
}

/// A fully loaded commit graph held in memory.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    nodes: HashMap<ObjectId, Arc<CommitNode>>,
    mode: GenerationMode,
}

impl MemoryGraph {
    /// Look up a commit without going through the provider error path.
    pub fn get(&self, id: &ObjectId) -> Option<&Arc<CommitNode>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every commit id in the graph (unordered).
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.nodes.keys()
    }

    pub fn generation_mode(&self) -> GenerationMode {
        self.mode
    }

    /// Overwrite one commit's generation number.
    ///
    /// Returns `false` if the commit is not in the graph.
    pub fn set_generation(&mut self, id: &ObjectId, generation: u64) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                Arc::make_mut(node).generation = generation;
                true
            }
            None => false,
        }
    }
}

impl CommitGraphProvider for MemoryGraph {
    fn resolve(&self, id: &ObjectId) -> Result<Arc<CommitNode>, GraphError> {
        self.nodes.get(id).cloned().ok_or(GraphError::NotFound(*id))
    }

    fn has_generation_numbers(&self) -> bool {
        self.mode != GenerationMode::None
    }

    fn corrected_commit_dates(&self) -> bool {
        self.mode == GenerationMode::CorrectedCommitDates
    }
}
