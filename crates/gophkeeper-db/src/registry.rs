//! Resource registry: serializes creation and deletion of resources with
//! their payload rows and (for blobs) their files.

use std::path::PathBuf;
use std::sync::Arc;

use gophkeeper_core::{GophkeeperError, Resource, ResourceId, ResourceKind};
use gophkeeper_crypto::{blob, piece};
use rusqlite::OptionalExtension;

use crate::credentials::CredentialStore;
use crate::database::Database;

/// Maps resource ids to `(owner, kind, metadata, backing-row-id)` and
/// coordinates creation/deletion across the piece/blob codecs and the
/// filesystem.
pub struct ResourceRegistry {
    db: Arc<Database>,
    credentials: Arc<CredentialStore>,
    blobs_dir: PathBuf,
}

impl ResourceRegistry {
    pub fn new(db: Arc<Database>, credentials: Arc<CredentialStore>, blobs_dir: PathBuf) -> Self {
        Self {
            db,
            credentials,
            blobs_dir,
        }
    }

    /// Encrypts and stores a small payload, returning its new resource id.
    pub fn store_piece(
        &self,
        owner: &str,
        meta: &str,
        plaintext: &[u8],
        password: &str,
    ) -> Result<ResourceId, GophkeeperError> {
        let sealed = piece::encrypt(plaintext, password)?;

        let mut conn = self.db.conn.lock().expect("db mutex poisoned");
        let tx = conn.transaction().map_err(GophkeeperError::internal)?;

        let piece_id: i64 = tx
            .query_row(
                "INSERT INTO pieces(content, salt, iv) VALUES (?1, ?2, ?3) RETURNING id",
                (&sealed.ciphertext, &sealed.salt[..], &sealed.iv[..]),
                |row| row.get(0),
            )
            .map_err(GophkeeperError::internal)?;

        let rid: ResourceId = tx
            .query_row(
                "INSERT INTO resources(owner, type, meta, resource) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                (owner, ResourceKind::Piece.as_i32(), meta, piece_id),
                |row| row.get(0),
            )
            .map_err(GophkeeperError::internal)?;

        tx.commit().map_err(GophkeeperError::internal)?;
        Ok(rid)
    }

    /// Decrypts and returns a previously stored piece owned by `owner`.
    pub fn restore_piece(
        &self,
        owner: &str,
        rid: ResourceId,
        password: &str,
    ) -> Result<gophkeeper_core::Piece, GophkeeperError> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");

        let (meta, piece_id): (String, i64) = conn
            .query_row(
                "SELECT meta, resource FROM resources WHERE id = ?1 AND owner = ?2 AND type = ?3",
                (rid, owner, ResourceKind::Piece.as_i32()),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(GophkeeperError::internal)?
            .ok_or(GophkeeperError::ResourceNotFound)?;

        let (content, salt, iv): (Vec<u8>, Vec<u8>, Vec<u8>) = conn
            .query_row(
                "SELECT content, salt, iv FROM pieces WHERE id = ?1",
                [piece_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(GophkeeperError::internal)?;
        drop(conn);

        let content = piece::decrypt(&content, &salt, &iv, password)?;
        Ok(gophkeeper_core::Piece { meta, content })
    }

    /// Stream-encrypts and stores a large payload: write-file-first,
    /// commit-second, compensate-on-failure.
    pub fn store_blob(
        &self,
        owner: &str,
        meta: &str,
        reader: impl std::io::Read,
        password: &str,
    ) -> Result<ResourceId, GophkeeperError> {
        self.credentials.verify_password(owner, password)?;

        let sealed = blob::encrypt_to_dir(reader, &self.blobs_dir, password)?;

        let result = (|| {
            let mut conn = self.db.conn.lock().expect("db mutex poisoned");
            let tx = conn.transaction().map_err(GophkeeperError::internal)?;

            let location = sealed.location.to_string_lossy().to_string();
            let blob_id: i64 = tx
                .query_row(
                    "INSERT INTO blobs(location, salt, iv, mac) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                    (&location, &sealed.salt[..], &sealed.iv[..], &sealed.mac[..]),
                    |row| row.get(0),
                )
                .map_err(GophkeeperError::internal)?;

            let rid: ResourceId = tx
                .query_row(
                    "INSERT INTO resources(owner, type, meta, resource) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                    (owner, ResourceKind::Blob.as_i32(), meta, blob_id),
                    |row| row.get(0),
                )
                .map_err(GophkeeperError::internal)?;

            tx.commit().map_err(GophkeeperError::internal)?;
            Ok(rid)
        })();

        if result.is_err() {
            tracing::warn!(location = %sealed.location.display(), "commit failed, removing orphaned blob file");
            let _ = std::fs::remove_file(&sealed.location);
        }
        result
    }

    /// Opens a decrypting reader over a previously stored blob. The vault
    /// password must verify before the reader is handed back.
    pub fn restore_blob(
        &self,
        owner: &str,
        rid: ResourceId,
        password: &str,
    ) -> Result<(String, blob::BlobReader), GophkeeperError> {
        let (meta, blob_id): (String, i64) = {
            let conn = self.db.conn.lock().expect("db mutex poisoned");
            conn.query_row(
                "SELECT meta, resource FROM resources WHERE id = ?1 AND owner = ?2 AND type = ?3",
                (rid, owner, ResourceKind::Blob.as_i32()),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(GophkeeperError::internal)?
            .ok_or(GophkeeperError::ResourceNotFound)?
        };

        let (location, salt, iv, mac): (String, Vec<u8>, Vec<u8>, Vec<u8>) = {
            let conn = self.db.conn.lock().expect("db mutex poisoned");
            conn.query_row(
                "SELECT location, salt, iv, mac FROM blobs WHERE id = ?1",
                [blob_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(GophkeeperError::internal)?
        };

        self.credentials.verify_password(owner, password)?;

        let reader = blob::decrypt_from_path(
            std::path::Path::new(&location),
            &salt,
            &iv,
            &mac,
            password,
        )?;
        Ok((meta, reader))
    }

    /// Deletes a resource owned by `owner`. Commits only if filesystem
    /// removal (for blobs) succeeded; otherwise rolls back so row and file
    /// stay consistent.
    pub fn delete(&self, owner: &str, rid: ResourceId) -> Result<(), GophkeeperError> {
        let mut conn = self.db.conn.lock().expect("db mutex poisoned");
        let tx = conn.transaction().map_err(GophkeeperError::internal)?;

        let (kind_tag, backing_id): (i32, i64) = tx
            .query_row(
                "DELETE FROM resources WHERE id = ?1 AND owner = ?2 RETURNING type, resource",
                (rid, owner),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(GophkeeperError::internal)?
            .ok_or(GophkeeperError::ResourceNotFound)?;

        let kind = ResourceKind::from_i32(kind_tag)
            .ok_or_else(|| GophkeeperError::internal("corrupt resource kind tag"))?;

        match kind {
            ResourceKind::Piece => {
                tx.execute("DELETE FROM pieces WHERE id = ?1", [backing_id])
                    .map_err(GophkeeperError::internal)?;
                tx.commit().map_err(GophkeeperError::internal)?;
            }
            ResourceKind::Blob => {
                let location: String = tx
                    .query_row(
                        "DELETE FROM blobs WHERE id = ?1 RETURNING location",
                        [backing_id],
                        |row| row.get(0),
                    )
                    .map_err(GophkeeperError::internal)?;

                match std::fs::remove_file(&location) {
                    Ok(()) => tx.commit().map_err(GophkeeperError::internal)?,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        // Already gone; treat as removed and still commit.
                        tx.commit().map_err(GophkeeperError::internal)?
                    }
                    Err(err) => {
                        tracing::warn!(location, %err, "failed to remove blob file, rolling back delete");
                        tx.rollback().map_err(GophkeeperError::internal)?;
                        return Err(GophkeeperError::internal(err));
                    }
                }
            }
        }

        Ok(())
    }

    /// Lists every resource owned by `owner`, a single query over
    /// `resources` with payload rows untouched. No ordering guarantee
    /// beyond the underlying index.
    pub fn list(&self, owner: &str) -> Result<Vec<Resource>, GophkeeperError> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT id, type, meta FROM resources WHERE owner = ?1")
            .map_err(GophkeeperError::internal)?;

        let rows = stmt
            .query_map([owner], |row| {
                let id: ResourceId = row.get(0)?;
                let kind_tag: i32 = row.get(1)?;
                let meta: String = row.get(2)?;
                Ok((id, kind_tag, meta))
            })
            .map_err(GophkeeperError::internal)?;

        let mut resources = Vec::new();
        for row in rows {
            let (id, kind_tag, meta) = row.map_err(GophkeeperError::internal)?;
            let kind = ResourceKind::from_i32(kind_tag)
                .ok_or_else(|| GophkeeperError::internal("corrupt resource kind tag"))?;
            resources.push(Resource { id, kind, meta });
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn registry() -> (ResourceRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let credentials = Arc::new(CredentialStore::new(Arc::clone(&db), 1, 1));
        credentials
            .register(&gophkeeper_core::Credential {
                username: "alice".into(),
                password: "hunter2hunter2".into(),
            })
            .unwrap();
        credentials
            .register(&gophkeeper_core::Credential {
                username: "bob".into(),
                password: "bobbobbobbob".into(),
            })
            .unwrap();
        let registry = ResourceRegistry::new(db, credentials, dir.path().to_path_buf());
        (registry, dir)
    }

    #[test]
    fn piece_round_trip() {
        let (reg, _dir) = registry();
        let rid = reg
            .store_piece("alice", "note", b"secret", "hunter2hunter2")
            .unwrap();
        let piece = reg.restore_piece("alice", rid, "hunter2hunter2").unwrap();
        assert_eq!(piece.meta, "note");
        assert_eq!(piece.content, b"secret");
    }

    #[test]
    fn piece_wrong_vault_password_is_bad_credential() {
        let (reg, _dir) = registry();
        let rid = reg
            .store_piece("alice", "note", b"secret", "vaultpw")
            .unwrap();
        let err = reg.restore_piece("alice", rid, "wrong").unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn blob_round_trip() {
        let (reg, _dir) = registry();
        let content = vec![7u8; 500_000];
        let rid = reg
            .store_blob("alice", "photo.jpg", Cursor::new(content.clone()), "vaultpw")
            .unwrap();
        let (meta, mut r) = reg.restore_blob("alice", rid, "vaultpw").unwrap();
        assert_eq!(meta, "photo.jpg");
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut r, &mut out).unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn cross_owner_isolation() {
        let (reg, _dir) = registry();
        let rid = reg
            .store_piece("alice", "note", b"secret", "hunter2hunter2")
            .unwrap();

        let err = reg.restore_piece("bob", rid, "hunter2hunter2").unwrap_err();
        assert!(matches!(err, GophkeeperError::ResourceNotFound));

        let err = reg.delete("bob", rid).unwrap_err();
        assert!(matches!(err, GophkeeperError::ResourceNotFound));

        let bobs_list = reg.list("bob").unwrap();
        assert!(bobs_list.is_empty());
    }

    #[test]
    fn delete_removes_blob_file() {
        let (reg, dir) = registry();
        let rid = reg
            .store_blob("alice", "m", Cursor::new(b"hello".to_vec()), "vaultpw")
            .unwrap();

        let entries_before: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries_before.len(), 1);

        reg.delete("alice", rid).unwrap();

        let entries_after: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries_after.is_empty());

        let err = reg.restore_blob("alice", rid, "vaultpw").unwrap_err();
        assert!(matches!(err, GophkeeperError::ResourceNotFound));
    }

    #[test]
    fn list_reflects_store_and_delete() {
        let (reg, _dir) = registry();
        assert!(reg.list("alice").unwrap().is_empty());

        let rid = reg
            .store_piece("alice", "note", b"secret", "hunter2hunter2")
            .unwrap();
        let listed = reg.list("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, rid);
        assert_eq!(listed[0].meta, "note");
        assert!(matches!(listed[0].kind, ResourceKind::Piece));

        reg.delete("alice", rid).unwrap();
        assert!(reg.list("alice").unwrap().is_empty());
    }

    #[test]
    fn store_blob_removes_orphan_file_when_commit_fails() {
        let (reg, dir) = registry();

        // Drop the backing table out from under the registry so the
        // post-write transaction fails after the file has already been
        // written to disk.
        reg.db
            .conn
            .lock()
            .unwrap()
            .execute("DROP TABLE blobs", [])
            .unwrap();

        let err = reg
            .store_blob("alice", "m", Cursor::new(b"hello".to_vec()), "vaultpw")
            .unwrap_err();
        assert!(matches!(err, GophkeeperError::Internal(_)));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty(), "orphaned blob file was not removed");
    }

    #[test]
    fn distinct_stores_get_distinct_ids() {
        let (reg, _dir) = registry();
        let a = reg
            .store_piece("alice", "a", b"one", "hunter2hunter2")
            .unwrap();
        let b = reg
            .store_piece("alice", "b", b"two", "hunter2hunter2")
            .unwrap();
        assert_ne!(a, b);
    }
}
