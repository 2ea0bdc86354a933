//! Entities that make up the vault's data model.

use serde::{Deserialize, Serialize};

/// Id of a resource. `-1` ([`NO_RESOURCE`]) is the sentinel for "no resource".
pub type ResourceId = i64;

/// Sentinel `ResourceId` meaning "no resource".
pub const NO_RESOURCE: ResourceId = -1;

/// A user authentication credential (login username/password pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Opaque bearer token string, minted by the Token Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(pub String);

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tagged variant of what a [`Resource`] points to. Stable on-wire integer
/// encoding: `Piece = 1`, `Blob = 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResourceKind {
    Piece = 1,
    Blob = 2,
}

impl ResourceKind {
    /// Decode the on-wire integer tag, rejecting anything else.
    pub fn from_i32(tag: i32) -> Option<Self> {
        match tag {
            1 => Some(ResourceKind::Piece),
            2 => Some(ResourceKind::Blob),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A resource as returned by `List`: just enough to enumerate and address it,
/// never the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    /// Server-opaque metadata string, typically short client-side JSON.
    pub meta: String,
}

/// A small, in-memory authenticated payload.
#[derive(Debug, Clone)]
pub struct Piece {
    pub meta: String,
    pub content: Vec<u8>,
}

/// A large payload streamed to/from a content-addressed file. `content` is
/// left generic in `gophkeeper-crypto`/`gophkeeper-db`, where the concrete
/// reader type (a file wrapped in a cipher stream) is known; this crate only
/// carries the metadata half.
#[derive(Debug, Clone)]
pub struct Blob {
    pub meta: String,
}
