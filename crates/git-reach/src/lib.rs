//! Commit reachability: merge-base computation, redundancy reduction, and
//! ancestry queries over a commit DAG.
//!
//! Every query is a bounded backward walk from a handful of commits. Walks are
//! ordered by generation number (then commit date) so that they can stop as
//! soon as nothing below a generation floor can change the answer.
//!
//! Commit data comes from a [`CommitGraphProvider`]. Per-commit marking bits
//! live in a [`FlagStore`] owned by one call, so concurrent queries over the
//! same graph never see each other's state.

mod ahead_behind;
mod config;
mod contains;
mod engine;
mod flags;
mod graph;
mod merge_base;
mod paint;
mod reach;
mod reduce;
mod tips;

pub use ahead_behind::AheadBehindCount;
pub use config::ReachConfig;
pub use contains::{ContainsCache, ContainsResult};
pub use engine::{Reachability, RedundancyStrategy};
pub use flags::{CommitFlags, FlagStore, PendingCleanup};
pub use graph::{
    CommitGraphBuilder, CommitGraphProvider, CommitNode, GenerationMode, MemoryGraph,
    GENERATION_NUMBER_INFINITY, GENERATION_NUMBER_ZERO,
};

use git_hash::ObjectId;

/// Failures reported by a [`CommitGraphProvider`].
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("commit not found: {0}")]
    NotFound(ObjectId),

    #[error("corrupt commit {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },
}

/// Errors produced by reachability queries.
#[derive(Debug, thiserror::Error)]
pub enum ReachError {
    /// A commit on the walk could not be loaded. No partial result is kept.
    #[error("could not parse commit {id}")]
    GraphInconsistency {
        id: ObjectId,
        #[source]
        source: GraphError,
    },

    #[error("invalid commit-graph: {0}")]
    InvalidCommitGraph(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
