//! Shared server state.

use std::sync::Arc;

use gophkeeper_crypto::TokenService;
use gophkeeper_db::{CredentialStore, ResourceRegistry};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub registry: Arc<ResourceRegistry>,
    pub tokens: Arc<TokenService>,
}
