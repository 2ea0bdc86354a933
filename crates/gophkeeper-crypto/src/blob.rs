//! Streaming blob codec: encrypt-then-MAC over large payloads.
//!
//! Confidentiality is AES-256-CTR. Integrity is HMAC-SHA256 over
//! `iv || ciphertext`, computed with a key
//! independently derived from the same password/salt (see
//! [`crate::kdf::derive_key_domain`]) so a single password/salt pair still
//! yields one CSPRNG salt on disk.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use gophkeeper_core::GophkeeperError;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::kdf::{derive_key, derive_key_domain, SALT_LEN};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a blob IV (AES block size).
pub const IV_LEN: usize = 16;

/// Length in bytes of the integrity tag.
pub const MAC_LEN: usize = 32;

/// Domain-separation byte for the MAC key, distinct from the CTR key.
const MAC_KEY_DOMAIN: u8 = 0x01;

const CHUNK_SIZE: usize = 64 * 1024;

/// Where a newly encrypted blob was written, and the material needed to
/// decrypt it again.
pub struct SealedBlob {
    pub location: PathBuf,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub mac: [u8; MAC_LEN],
}

/// Stream-encrypt `reader` into a fresh file under `dir`, named with a fresh
/// UUIDv4. On any I/O failure the partial file is removed and
/// [`GophkeeperError::Internal`] is returned.
pub fn encrypt_to_dir(
    mut reader: impl Read,
    dir: &Path,
    password: &str,
) -> Result<SealedBlob, GophkeeperError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let location = dir.join(uuid::Uuid::new_v4().to_string());

    match try_encrypt(&mut reader, &location, &salt, &iv, password) {
        Ok(mac) => Ok(SealedBlob {
            location,
            salt,
            iv,
            mac,
        }),
        Err(err) => {
            let _ = std::fs::remove_file(&location);
            Err(err)
        }
    }
}

fn try_encrypt(
    reader: &mut impl Read,
    location: &Path,
    salt: &[u8],
    iv: &[u8],
    password: &str,
) -> Result<[u8; MAC_LEN], GophkeeperError> {
    let key = derive_key(password, salt);
    let mac_key = derive_key_domain(password, salt, MAC_KEY_DOMAIN);

    let mut cipher = Aes256Ctr::new(key.as_ref().into(), iv.into());
    let mut mac =
        HmacSha256::new_from_slice(mac_key.as_ref()).expect("hmac accepts any key length");
    mac.update(iv);

    let mut file = File::create(location)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let chunk = &mut buf[..n];
        cipher.apply_keystream(chunk);
        mac.update(chunk);
        file.write_all(chunk)?;
    }
    file.flush()?;

    Ok(mac.finalize().into_bytes().into())
}

/// Open `location`, verify its MAC, and return a reader that lazily yields
/// plaintext as it is read. Verification streams the file once without
/// buffering it fully in memory; the file is reopened (cheap: just a fresh
/// file descriptor) for the lazy decrypt pass. The caller owns the reader
/// and must close it; closing it closes the underlying file.
pub fn decrypt_from_path(
    location: &Path,
    salt: &[u8],
    iv: &[u8],
    mac_tag: &[u8],
    password: &str,
) -> Result<BlobReader, GophkeeperError> {
    verify_mac(location, iv, mac_tag, &derive_key_domain(password, salt, MAC_KEY_DOMAIN))?;

    let key = derive_key(password, salt);
    let cipher = Aes256Ctr::new(key.as_ref().into(), iv.into());
    let file = File::open(location)?;
    Ok(BlobReader { file, cipher })
}

fn verify_mac(
    location: &Path,
    iv: &[u8],
    expected: &[u8],
    mac_key: &crate::kdf::DerivedKey,
) -> Result<(), GophkeeperError> {
    let mut mac =
        HmacSha256::new_from_slice(mac_key.as_ref()).expect("hmac accepts any key length");
    mac.update(iv);

    let mut file = File::open(location)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        mac.update(&buf[..n]);
    }
    mac.verify_slice(expected).map_err(|_| GophkeeperError::BadCredential)
}

/// A lazily-decrypting reader over an open blob file. Dropping it drops the
/// underlying `File`, closing it.
pub struct BlobReader {
    file: File,
    cipher: Aes256Ctr,
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![0x42u8; 200_000];
        let sealed = encrypt_to_dir(Cursor::new(content.clone()), dir.path(), "pw").unwrap();

        let mut reader =
            decrypt_from_path(&sealed.location, &sealed.salt, &sealed.iv, &sealed.mac, "pw").unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn wrong_password_is_bad_credential() {
        let dir = tempfile::tempdir().unwrap();
        let sealed = encrypt_to_dir(Cursor::new(b"hello world".to_vec()), dir.path(), "pw").unwrap();

        let err =
            decrypt_from_path(&sealed.location, &sealed.salt, &sealed.iv, &sealed.mac, "nope")
                .unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn tampered_ciphertext_fails_mac() {
        let dir = tempfile::tempdir().unwrap();
        let sealed = encrypt_to_dir(Cursor::new(b"hello world".to_vec()), dir.path(), "pw").unwrap();

        let mut bytes = std::fs::read(&sealed.location).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&sealed.location, bytes).unwrap();

        let err =
            decrypt_from_path(&sealed.location, &sealed.salt, &sealed.iv, &sealed.mac, "pw")
                .unwrap_err();
        assert!(matches!(err, GophkeeperError::BadCredential));
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }
        let err = encrypt_to_dir(FailingReader, dir.path(), "pw").unwrap_err();
        assert!(matches!(err, GophkeeperError::Internal(_)));
        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        assert!(entries.next().is_none(), "partial file must be removed");
    }
}
