use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::data::Record;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign claims: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Verify(#[source] jsonwebtoken::errors::Error),
}

/// Signs a claims map into an opaque bearer credential, and verifies such
/// credentials back into their claims. Deterministic for a given claims map
/// and secret. Everything else in the system treats the output as an opaque
/// string.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
}

impl TokenIssuer {
    pub fn new<S: AsRef<[u8]>>(secret: S) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Sign a claims map into an HS256 token.
    pub fn sign(&self, claims: &Record) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(TokenError::Sign)
    }

    /// Verify a token's signature and recover its claims. Tokens carry no
    /// expiry claim; a credential issued at process start is good for the
    /// life of the process.
    pub fn verify(&self, token: &str) -> Result<Record, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Record>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(TokenError::Verify)?;
        Ok(data.claims)
    }
}
