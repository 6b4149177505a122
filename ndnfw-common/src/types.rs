//! Identifier types shared between the forwarder and its faces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a face.
///
/// Ids up to [`FaceId::RESERVED_MAX`] are reserved for internal use; the
/// face table hands out dynamic ids above that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct FaceId(pub u32);

impl FaceId {
    /// "No such face".
    pub const INVALID: FaceId = FaceId(u32::MAX);

    /// Provenance of Data served out of the content store.
    pub const CONTENT_STORE: FaceId = FaceId(254);

    /// Highest reserved id.
    pub const RESERVED_MAX: FaceId = FaceId(255);

    /// Returns true unless this is the [`FaceId::INVALID`] sentinel.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Returns true for ids in the reserved range.
    pub fn is_reserved(self) -> bool {
        self <= Self::RESERVED_MAX
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FaceId::INVALID => write!(f, "FaceId(invalid)"),
            FaceId::CONTENT_STORE => write!(f, "FaceId(contentstore)"),
            FaceId(id) => write!(f, "FaceId({})", id),
        }
    }
}
