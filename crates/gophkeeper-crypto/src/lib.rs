//! Key derivation, authenticated/streaming codecs, and token minting for the
//! gophkeeper identity vault engine.

pub mod blob;
pub mod kdf;
pub mod piece;
pub mod token;

pub use kdf::derive_key;
pub use token::TokenService;
