// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 session token issuance and verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, Claims, Identity};
use crate::storage::UserId;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Fixed session lifetime (30 minutes). There is no refresh.
pub const SESSION_TTL_SECS: i64 = 30 * 60;

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `user_id` expiring 30 minutes from now.
    pub fn issue(&self, user_id: UserId, login: &str) -> Result<String, AuthError> {
        self.issue_at(user_id, login, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        login: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        self.sign(&Claims {
            user_id,
            login: login.to_string(),
            exp: issued_at.timestamp() + SESSION_TTL_SECS,
        })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("failed to sign token: {e}")))
    }

    /// Verify signature and expiry, returning the caller identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        Ok(Identity::from(token_data.claims))
    }
}
