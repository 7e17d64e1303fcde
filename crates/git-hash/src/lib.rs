//! Commit identity for the reachability engine.
//!
//! Commits are identified by the 20-byte digest of their content. This crate
//! only carries that identity around: parsing it from and rendering it to hex.
//! Computing digests belongs to the object database, not here.

mod error;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;
