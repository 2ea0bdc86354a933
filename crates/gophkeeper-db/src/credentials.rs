//! Credential store: registers and authenticates identities.

use base64::Engine;
use gophkeeper_core::{Credential, GophkeeperError};
use rusqlite::ErrorCode;
use std::sync::Arc;

use crate::database::Database;

const BASE64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::STANDARD;

/// bcrypt cost used for new password hashes. Part of the format; existing
/// rows keep whatever cost they were hashed at.
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Registers and authenticates identities.
pub struct CredentialStore {
    db: Arc<Database>,
    username_min_length: usize,
    password_min_length: usize,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, username_min_length: usize, password_min_length: usize) -> Self {
        Self {
            db,
            username_min_length,
            password_min_length,
        }
    }

    /// Register a new identity. Validates length thresholds, hashes the
    /// password with bcrypt, and persists `(username, base64(hash))`.
    /// Duplicate usernames are detected as a unique-constraint violation and
    /// mapped to [`GophkeeperError::IdentityDuplicate`].
    pub fn register(&self, credential: &Credential) -> Result<(), GophkeeperError> {
        if credential.username.len() < self.username_min_length {
            return Err(GophkeeperError::BadCredential);
        }
        if credential.password.len() < self.password_min_length {
            return Err(GophkeeperError::BadCredential);
        }

        let hash = bcrypt::hash(&credential.password, BCRYPT_COST)
            .map_err(GophkeeperError::internal)?;
        let encoded = BASE64.encode(hash.as_bytes());

        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let result = conn.execute(
            "INSERT INTO identities(username, password) VALUES (?1, ?2)",
            (&credential.username, &encoded),
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(GophkeeperError::IdentityDuplicate)
            }
            Err(err) => Err(GophkeeperError::internal(err)),
        }
    }

    /// Verify `password` against the stored hash for `username`.
    ///
    /// A missing identity is reported as [`GophkeeperError::BadCredential`],
    /// indistinguishable from a wrong password.
    pub fn verify_password(&self, username: &str, password: &str) -> Result<(), GophkeeperError> {
        let encoded: String = {
            let conn = self.db.conn.lock().expect("db mutex poisoned");
            conn.query_row(
                "SELECT password FROM identities WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => GophkeeperError::BadCredential,
                other => GophkeeperError::internal(other),
            })?
        };

        let decoded = BASE64
            .decode(encoded)
            .map_err(GophkeeperError::internal)?;
        let hash = String::from_utf8(decoded).map_err(GophkeeperError::internal)?;

        match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(GophkeeperError::BadCredential),
            Err(err) => Err(GophkeeperError::internal(err)),
        }
    }

    /// True if `username` is already registered. Used by the auth middleware
    /// to reject a token whose subject no longer refers to a live identity.
    pub fn exists(&self, username: &str) -> Result<bool, GophkeeperError> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT 1 FROM identities WHERE username = ?1",
            [username],
            |_| Ok(()),
        )
        .map(|_| true)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(GophkeeperError::internal(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(Database::open_in_memory().unwrap()), 1, 1)
    }

    #[test]
    fn register_then_verify_succeeds() {
        let store = store();
        let cred = Credential {
            username: "alice".into(),
            password: "hunter2hunter2".into(),
        };
        store.register(&cred).unwrap();
        store.verify_password("alice", "hunter2hunter2").unwrap();
    }

    #[test]
    fn wrong_password_is_bad_credential() {
        let store = store();
        let cred = Credential {
            username: "alice".into(),
            password: "hunter2hunter2".into(),
        };
        store.register(&cred).unwrap();
        let err = store.verify_password("alice", "wrong").unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn unknown_username_is_bad_credential() {
        let store = store();
        let err = store.verify_password("nobody", "whatever").unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn duplicate_registration_is_identity_duplicate() {
        let store = store();
        let cred = Credential {
            username: "alice".into(),
            password: "hunter2hunter2".into(),
        };
        store.register(&cred).unwrap();
        let err = store.register(&cred).unwrap_err();
        assert!(matches!(err, GophkeeperError::IdentityDuplicate));
    }

    #[test]
    fn length_gating_rejects_short_credentials() {
        let store = CredentialStore::new(Arc::new(Database::open_in_memory().unwrap()), 4, 8);
        let err = store
            .register(&Credential {
                username: "ab".into(),
                password: "longenoughpassword".into(),
            })
            .unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));

        let err = store
            .register(&Credential {
                username: "abcd".into(),
                password: "short".into(),
            })
            .unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }
}
