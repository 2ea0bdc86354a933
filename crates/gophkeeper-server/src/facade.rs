//! Identity facade: a per-request object carrying a verified `username` and
//! exposing `store/restore/delete/list`, each delegating to the registry
//! with `owner = username`. The single choke point enforcing that a request
//! can only act on resources it owns.

use std::io::Read;
use std::sync::Arc;

use gophkeeper_core::{GophkeeperError, Piece, Resource, ResourceId};
use gophkeeper_crypto::blob::BlobReader;
use gophkeeper_db::ResourceRegistry;

#[derive(Clone)]
pub struct IdentityFacade {
    pub username: String,
    registry: Arc<ResourceRegistry>,
}

impl IdentityFacade {
    pub fn new(username: String, registry: Arc<ResourceRegistry>) -> Self {
        Self { username, registry }
    }

    pub fn store_piece(
        &self,
        meta: &str,
        plaintext: &[u8],
        password: &str,
    ) -> Result<ResourceId, GophkeeperError> {
        self.registry
            .store_piece(&self.username, meta, plaintext, password)
    }

    pub fn restore_piece(
        &self,
        rid: ResourceId,
        password: &str,
    ) -> Result<Piece, GophkeeperError> {
        self.registry.restore_piece(&self.username, rid, password)
    }

    pub fn store_blob(
        &self,
        meta: &str,
        reader: impl Read,
        password: &str,
    ) -> Result<ResourceId, GophkeeperError> {
        self.registry
            .store_blob(&self.username, meta, reader, password)
    }

    pub fn restore_blob(
        &self,
        rid: ResourceId,
        password: &str,
    ) -> Result<(String, BlobReader), GophkeeperError> {
        self.registry.restore_blob(&self.username, rid, password)
    }

    pub fn delete(&self, rid: ResourceId) -> Result<(), GophkeeperError> {
        self.registry.delete(&self.username, rid)
    }

    pub fn list(&self) -> Result<Vec<Resource>, GophkeeperError> {
        self.registry.list(&self.username)
    }
}
