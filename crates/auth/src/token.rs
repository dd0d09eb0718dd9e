use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// The signed-in principal carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub sub: Uuid,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    address: String,
    iat: i64,
    exp: i64,
}

/// HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    pub fn sign(&self, user: &AuthUser) -> Result<String> {
        self.sign_at(user, Utc::now())
    }

    pub fn sign_at(&self, user: &AuthUser, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.sub,
            address: user.address.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// `None` for anything that is not a live token signed with our secret.
    pub fn verify(&self, token: &str) -> Option<AuthUser> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(AuthUser {
                sub: data.claims.sub,
                address: data.claims.address,
            }),
            Err(err) => {
                debug!(error = %err, "rejected session token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(secret), 60 * 60 * 24 * 3)
    }

    fn user() -> AuthUser {
        AuthUser {
            sub: Uuid::now_v7(),
            address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
        }
    }

    #[test]
    fn signed_tokens_verify() {
        let issuer = issuer("secret");
        let user = user();
        let token = issuer.sign(&user).unwrap();
        assert_eq!(issuer.verify(&token), Some(user));
    }

    #[test]
    fn wrong_secret_or_garbage_is_rejected() {
        let token = issuer("secret").sign(&user()).unwrap();
        assert_eq!(issuer("other").verify(&token), None);
        assert_eq!(issuer("secret").verify("not.a.jwt"), None);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = issuer("secret");
        let token = issuer
            .sign_at(&user(), Utc::now() - Duration::days(4))
            .unwrap();
        assert_eq!(issuer.verify(&token), None);
    }
}
