//! Domain types and error taxonomy shared across the gophkeeper vault engine.

pub mod error;
pub mod model;

pub use error::GophkeeperError;
pub use model::{
    Blob, Credential, Piece, Resource, ResourceId, ResourceKind, Token, NO_RESOURCE,
};
