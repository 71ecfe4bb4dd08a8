//! Bearer token verification.
//!
//! Tokens are issued by the identity service; this crate only checks the
//! HS512 signature and expiry and reads the `id` claim.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use stratum_core::config::AuthConfig;
use stratum_core::error::AppError;

/// Claims this service reads from a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: String,
    /// Expiry as a Unix timestamp.
    pub exp: u64,
}

/// Validates bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication(format!("Token validation failed: {e}")),
            }
        })?;

        if data.claims.id.is_empty() {
            return Err(AppError::authentication("Token carries no user id"));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token(secret: &str, id: &str, exp: u64) -> String {
        encode(
            &Header::new(Algorithm::HS512),
            &Claims { id: id.into(), exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap() + 3600
    }

    #[test]
    fn accepts_a_valid_token() {
        let config = AuthConfig::default();
        let verifier = TokenVerifier::new(&config);
        let claims = verifier
            .verify(&token(&config.jwt_secret, "u1", far_future()))
            .unwrap();
        assert_eq!(claims.id, "u1");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let config = AuthConfig::default();
        let verifier = TokenVerifier::new(&config);

        let forged = verifier.verify(&token("other", "u1", far_future()));
        assert!(forged.is_err());

        let expired = verifier.verify(&token(&config.jwt_secret, "u1", 1_000));
        assert_eq!(
            expired.unwrap_err().kind,
            stratum_core::error::ErrorKind::Authentication
        );
    }
}
