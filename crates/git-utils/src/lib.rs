//! Foundation utilities shared by the reachability crates.

pub mod collections;
