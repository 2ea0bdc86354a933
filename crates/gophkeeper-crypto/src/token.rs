//! Token service: mints and verifies short-lived bearer tokens
//! binding a subject (username) and expiry, signed with HS256 over a
//! process-wide secret. The service never consults any store; expiry is
//! purely time-based.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gophkeeper_core::GophkeeperError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// The process-wide MAC secret, zeroized on drop. Never logged.
#[derive(Zeroize, ZeroizeOnDrop)]
struct Secret(Vec<u8>);

/// Mints and verifies bearer tokens. Holds no state beyond the immutable
/// secret and default lifespan; safe to share across requests.
pub struct TokenService {
    secret: Secret,
    default_lifespan: Duration,
}

impl TokenService {
    /// Build a service from a raw (not base64-encoded) secret and the
    /// default token lifespan.
    pub fn new(secret: Vec<u8>, default_lifespan: Duration) -> Self {
        Self {
            secret: Secret(secret),
            default_lifespan,
        }
    }

    /// Mint a token carrying `{subject, expires_at = now + lifespan}` signed
    /// with HS256.
    pub fn mint(&self, subject: &str) -> Result<gophkeeper_core::Token, GophkeeperError> {
        self.mint_with_lifespan(subject, self.default_lifespan)
    }

    /// Mint a token with an explicit lifespan, bypassing the configured
    /// default. Exposed mainly so tests can mint already-expired tokens.
    pub fn mint_with_lifespan(
        &self,
        subject: &str,
        lifespan: Duration,
    ) -> Result<gophkeeper_core::Token, GophkeeperError> {
        let exp = now_unix().saturating_add(lifespan.as_secs());
        let claims = Claims {
            sub: subject.to_string(),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret.0),
        )
        .map_err(GophkeeperError::internal)?;
        Ok(gophkeeper_core::Token(token))
    }

    /// Verify a token's signature and expiry, returning its subject.
    ///
    /// Any parse or signature failure, or an expired token, collapses to
    /// [`GophkeeperError::BadCredential`].
    pub fn verify(&self, token: &str) -> Result<String, GophkeeperError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret.0),
            &validation,
        )
        .map_err(|_| GophkeeperError::BadCredential)?;

        if data.claims.exp <= now_unix() {
            return Err(GophkeeperError::BadCredential);
        }
        Ok(data.claims.sub)
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs()
}
