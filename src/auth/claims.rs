// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the per-call caller identity.

use serde::{Deserialize, Serialize};

use crate::storage::UserId;

/// Claims carried in a signed session token.
///
/// Wire names are `id`, `login` and `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    #[serde(rename = "id")]
    pub user_id: UserId,
    /// User login
    pub login: String,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

/// Verified caller identity.
///
/// Lives in the request extensions for exactly one call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub login: String,
    pub expires_at: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            login: claims.login,
            expires_at: claims.exp,
        }
    }
}
