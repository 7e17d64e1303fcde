//! Containers shared by graph traversals.

pub mod prio_queue;

pub use prio_queue::PriorityQueue;
