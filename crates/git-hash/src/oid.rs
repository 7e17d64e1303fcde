use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// A commit identifier: the raw 20-byte digest of the commit object.
///
/// Ids are plain values. Two handles to the same commit compare equal and
/// hash identically, which is what lets per-call state be keyed by id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    /// Digest length in bytes.
    pub const LEN: usize = 20;

    /// The null id (all zeros).
    pub const NULL: Self = Self([0u8; Self::LEN]);

    /// Create an id from raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse a full 40-character hex id.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        let mut bytes = [0u8; Self::LEN];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Build a synthetic id whose trailing bytes hold `n` (big-endian).
    ///
    /// For fixtures and generated graphs only; the result names no real
    /// object. Available in this crate's tests and behind the `test-support`
    /// feature.
    #[cfg(any(test, feature = "test-support"))]
    pub const fn from_index(n: u64) -> Self {
        let mut bytes = [0u8; Self::LEN];
        let be = n.to_be_bytes();
        let mut i = 0;
        while i < be.len() {
            bytes[Self::LEN - be.len() + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
