//! JWT Token Handler
//! Mission: Issue and verify bearer tokens carrying an identity snapshot

use crate::auth::models::{AuthenticatedIdentity, Claims};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Signs and verifies bearer tokens with a server-held secret.
///
/// Tokens are time-boxed and never revoked server-side: there is no token
/// store or blacklist, expiry is the only lifecycle event.
pub struct JwtHandler {
    secret: String,
    expiration_hours: i64,
}

impl JwtHandler {
    /// Create a handler with the default 24-hour token lifetime
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration_hours: 24,
        }
    }

    /// Create a handler with a custom token lifetime (tests use negative
    /// values to mint already-expired tokens)
    pub fn with_expiration_hours(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
        }
    }

    /// Sign a token embedding the identity snapshot as claims
    pub fn issue(&self, identity: &AuthenticatedIdentity) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid expiry timestamp")?
            .timestamp() as usize;

        let claims = Claims {
            sub: identity.user.id.to_string(),
            role: identity.user.role,
            account: identity.user.account.clone(),
            name: identity.user.name.clone(),
            following_ids: identity.following_ids.clone(),
            follower_ids: identity.follower_ids.clone(),
            exp: expiration,
        };

        debug!(
            "Issuing token for {} ({}), expires in {}h",
            identity.user.account, identity.user.id, self.expiration_hours
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .context("Invalid or expired token")?;

        debug!("Verified token for {}", decoded.claims.account);

        Ok(decoded.claims)
    }
}
