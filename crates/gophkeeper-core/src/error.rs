//! The vault engine's error taxonomy.
//!
//! Kinds, not identifiers: callers match on the variant, never on the message
//! text. The HTTP boundary (`gophkeeper-server::error`) is the only place
//! that turns a kind into a status code.

use thiserror::Error;

/// Result type used throughout the vault engine.
pub type GophkeeperResult<T> = Result<T, GophkeeperError>;

/// Errors the vault engine can surface to a caller.
///
/// Deliberately collapses distinguishable internal causes (wrong password,
/// unknown username, expired token, bad AEAD tag) into [`GophkeeperError::BadCredential`]
/// so that no endpoint becomes an oracle for account or resource existence.
#[derive(Debug, Error)]
pub enum GophkeeperError {
    /// Wrong username/password, invalid/expired token, or failed AEAD/MAC check.
    #[error("bad credential")]
    BadCredential,

    /// Registration collided with an existing username.
    #[error("identity already exists")]
    IdentityDuplicate,

    /// Resource id missing, or owned by another identity (indistinguishable).
    #[error("resource not found")]
    ResourceNotFound,

    /// The client observed a response shape it cannot parse. Never produced
    /// by the server; kept here only because it is part of the taxonomy that
    /// client stubs built on this crate need to match against.
    #[error("incompatible api response")]
    IncompatibleAPI,

    /// Any other failure: I/O, database, crypto misuse, cancellation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GophkeeperError {
    /// Wrap an arbitrary error as [`GophkeeperError::Internal`], keeping the
    /// original detail for server-side logs only.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        GophkeeperError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for GophkeeperError {
    fn from(err: std::io::Error) -> Self {
        GophkeeperError::internal(err)
    }
}
