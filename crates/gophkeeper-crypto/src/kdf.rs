//! Key derivation.
//!
//! `derive_key(password, salt) = PBKDF2-HMAC-SHA256(password, salt, iterations
//! = 4096, dkLen = 32)`. These constants are part of the on-disk format;
//! changing them invalidates existing resources.

use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of a per-resource salt.
pub const SALT_LEN: usize = 8;

/// PBKDF2 iteration count. Part of the on-disk format; do not change without
/// a migration path.
pub const ITERATIONS: u32 = 4096;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A derived key held in a buffer zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(pub [u8; KEY_LEN]);

impl AsRef<[u8]> for DerivedKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Derive a 32-byte key from a password and salt via PBKDF2-HMAC-SHA256.
pub fn derive_key(password: &str, salt: &[u8]) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut key);
    DerivedKey(key)
}

/// Derive a second, independent key from the same password and salt by
/// appending a one-byte domain-separation suffix to the salt. Used to split
/// the blob codec's confidentiality key from its MAC key without a second
/// CSPRNG salt.
pub fn derive_key_domain(password: &str, salt: &[u8], domain: u8) -> DerivedKey {
    let mut salted = Vec::with_capacity(salt.len() + 1);
    salted.extend_from_slice(salt);
    salted.push(domain);
    let key = derive_key(password, &salted);
    salted.zeroize();
    key
}
