//! The query engine: a commit graph plus the policy for using it.

use std::collections::HashMap;
use std::sync::Arc;

use git_hash::ObjectId;

use crate::graph::{CommitGraphProvider, CommitNode, GENERATION_NUMBER_INFINITY};
use crate::{ReachConfig, ReachError};

/// Algorithm used to drop candidates that are ancestors of other candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedundancyStrategy {
    /// One painter walk per candidate. Always correct, quadratic in walks.
    WithoutGenerations,
    /// A single depth-first sweep bounded by generation numbers.
    WithGenerations,
}

/// Reachability queries over one commit graph.
///
/// The engine holds no per-query state and can be shared freely; every
/// query allocates its own flag store.
pub struct Reachability<'g, G: CommitGraphProvider + ?Sized> {
    graph: &'g G,
    config: ReachConfig,
    generations: bool,
    strategy: RedundancyStrategy,
}

impl<'g, G: CommitGraphProvider + ?Sized> Reachability<'g, G> {
    /// Create an engine with the default configuration.
    pub fn new(graph: &'g G) -> Self {
        Self::with_config(graph, ReachConfig::default())
    }

    /// Create an engine, fixing the generation-number policy for its lifetime.
    pub fn with_config(graph: &'g G, config: ReachConfig) -> Self {
        let generations = config.use_generation_numbers && graph.has_generation_numbers();
        let strategy = if generations {
            RedundancyStrategy::WithGenerations
        } else {
            RedundancyStrategy::WithoutGenerations
        };
        tracing::debug!(generations, ?strategy, "reachability engine ready");
        Self {
            graph,
            config,
            generations,
            strategy,
        }
    }

    pub fn config(&self) -> &ReachConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g G {
        self.graph
    }

    /// Whether generation numbers are used for ordering and pruning.
    pub fn generation_numbers_enabled(&self) -> bool {
        self.generations
    }

    /// Whether generations are corrected commit dates, making date order safe.
    pub(crate) fn corrected_commit_dates_enabled(&self) -> bool {
        self.generations && self.graph.corrected_commit_dates()
    }

    /// Redundancy strategy chosen at construction.
    pub fn redundancy_strategy(&self) -> RedundancyStrategy {
        self.strategy
    }

    /// Load a commit, turning provider failures into a fatal inconsistency.
    pub(crate) fn resolve(&self, id: &ObjectId) -> Result<Arc<CommitNode>, ReachError> {
        self.graph
            .resolve(id)
            .map_err(|source| ReachError::GraphInconsistency { id: *id, source })
    }

    pub(crate) fn resolve_all(&self, ids: &[ObjectId]) -> Result<Vec<Arc<CommitNode>>, ReachError> {
        ids.iter().map(|id| self.resolve(id)).collect()
    }

    /// Generation used for ordering: infinite when generations are disabled.
    pub(crate) fn generation(&self, node: &CommitNode) -> u64 {
        if self.generations {
            node.generation
        } else {
            GENERATION_NUMBER_INFINITY
        }
    }

    /// Date used by date cutoffs: the corrected commit date when the graph
    /// has them, otherwise the raw commit date.
    pub(crate) fn cutoff_date(&self, node: &CommitNode) -> i64 {
        if self.corrected_commit_dates_enabled() {
            i64::try_from(node.generation).unwrap_or(i64::MAX)
        } else {
            node.date
        }
    }

    /// Make sure every ancestor of `tips` has a usable generation.
    ///
    /// Walks that depend on visiting children before parents cannot rely on
    /// dates. When the provider has no generation for some commit, topological
    /// levels are computed on the fly for it and its unnumbered ancestors;
    /// the returned map overlays [`Reachability::generation`].
    pub(crate) fn ensure_generations(
        &self,
        tips: &[Arc<CommitNode>],
    ) -> Result<HashMap<ObjectId, u64>, ReachError> {
        let mut computed: HashMap<ObjectId, u64> = HashMap::new();

        for tip in tips {
            if self.known_generation(tip, &computed).is_some() {
                continue;
            }

            let mut stack = vec![Arc::clone(tip)];
            while let Some(current) = stack.last().cloned() {
                if computed.contains_key(&current.id) {
                    stack.pop();
                    continue;
                }

                let mut max_parent = 0;
                let mut all_parents_computed = true;
                for parent in &current.parents {
                    let node = self.resolve(parent)?;
                    match self.known_generation(&node, &computed) {
                        Some(generation) => max_parent = max_parent.max(generation),
                        None => {
                            all_parents_computed = false;
                            stack.push(node);
                            break;
                        }
                    }
                }

                if all_parents_computed {
                    computed.insert(current.id, max_parent + 1);
                    stack.pop();
                }
            }
        }

        if !computed.is_empty() {
            tracing::debug!(count = computed.len(), "computed missing generation numbers");
        }
        Ok(computed)
    }

    fn known_generation(&self, node: &CommitNode, computed: &HashMap<ObjectId, u64>) -> Option<u64> {
        let generation = self.generation(node);
        if generation != GENERATION_NUMBER_INFINITY {
            return Some(generation);
        }
        computed.get(&node.id).copied()
    }

    /// Generation from `overlay` if present, otherwise the provider's.
    pub(crate) fn overlaid_generation(&self, overlay: &HashMap<ObjectId, u64>, node: &CommitNode) -> u64 {
        overlay
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| self.generation(node))
    }
}
