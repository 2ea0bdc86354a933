//! Piece codec: authenticated encryption of small in-memory payloads via
//! AES-256-GCM.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use gophkeeper_core::GophkeeperError;
use rand::RngCore;

use crate::kdf::{derive_key, SALT_LEN};

/// Length in bytes of a piece IV (GCM nonce).
pub const IV_LEN: usize = 12;

/// Ciphertext plus the salt and IV it was sealed under.
pub struct SealedPiece {
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
}

/// Encrypt `plaintext` under a key derived from `password` and a fresh salt.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<SealedPiece, GophkeeperError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| GophkeeperError::internal(format!("seal piece: {e}")))?;

    Ok(SealedPiece {
        ciphertext,
        salt,
        iv,
    })
}

/// Decrypt `ciphertext` sealed under `salt`/`iv` with `password`.
///
/// A GCM tag failure maps to [`GophkeeperError::BadCredential`] (observable
/// as "wrong vault password"); any other failure is
/// [`GophkeeperError::Internal`].
pub fn decrypt(
    ciphertext: &[u8],
    salt: &[u8],
    iv: &[u8],
    password: &str,
) -> Result<Vec<u8>, GophkeeperError> {
    if iv.len() != IV_LEN {
        return Err(GophkeeperError::internal("malformed piece iv length"));
    }
    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| GophkeeperError::BadCredential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let sealed = encrypt(b"top secret note", "hunter2hunter2").unwrap();
        let plain = decrypt(&sealed.ciphertext, &sealed.salt, &sealed.iv, "hunter2hunter2").unwrap();
        assert_eq!(plain, b"top secret note");
    }

    #[test]
    fn wrong_password_is_bad_credential() {
        let sealed = encrypt(b"top secret note", "hunter2hunter2").unwrap();
        let err = decrypt(&sealed.ciphertext, &sealed.salt, &sealed.iv, "wrong password").unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn tampered_ciphertext_is_bad_credential() {
        let mut sealed = encrypt(b"top secret note", "hunter2hunter2").unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0xff;
        let err = decrypt(&sealed.ciphertext, &sealed.salt, &sealed.iv, "hunter2hunter2").unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }
}
