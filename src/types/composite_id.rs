//! Composite identifiers for trained markersets and labeled markers
//!
//! Assets and markers are identified by a single 32-bit value that packs the
//! parent (model) id into the high word and the member id into the low word.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-bit id packing `(parent, member)` as high/low 16-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeId(pub i32);

impl CompositeId {
    /// Pack a parent and member id.
    pub fn new(parent: u16, member: u16) -> Self {
        Self(encode_id(parent, member))
    }

    /// Parent (model / asset) id from the high word.
    pub fn parent(self) -> u16 {
        decode_id(self.0).0
    }

    /// Member (marker / bone) id from the low word.
    pub fn member(self) -> u16 {
        decode_id(self.0).1
    }

    /// Raw value as carried in frames.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for CompositeId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parent(), self.member())
    }
}

/// Split a raw composite id into `(high, low)`.
///
/// The split is done on the unsigned bit pattern so ids with the top bit set
/// decode to the same halves they were built from.
pub fn decode_id(id: i32) -> (u16, u16) {
    let bits = id as u32;
    ((bits >> 16) as u16, (bits & 0xFFFF) as u16)
}

/// Pack `(high, low)` into a raw composite id.
pub fn encode_id(high: u16, low: u16) -> i32 {
    (((high as u32) << 16) | low as u32) as i32
}
