//! Request handlers.

pub mod blob;
pub mod health;
pub mod login;
pub mod piece;
pub mod register;
pub mod vault;
