// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and reply bodies of the REST API. All types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for JSON handling and OpenAPI documentation.
//!
//! ## Reply Envelope
//!
//! Every handler answers HTTP 200 with a [`Reply`]: either `{"ok": ...}` or
//! `{"error": "..."}`. Business failures travel inside the reply; only gate
//! rejections and transport faults use HTTP error statuses.
//!
//! Binary payloads (record content, upload chunks) are standard base64 in JSON.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::Outcome;
use crate::storage::RecordId;

// =============================================================================
// Reply Envelope
// =============================================================================

/// Tagged result of a business operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Reply<T> {
    /// Operation succeeded.
    Ok(T),
    /// Operation failed; the message is safe to show to the user.
    Error(String),
}

impl<T> Reply<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Error(message) => Err(message),
        }
    }
}

impl<T> From<Outcome<T>> for Reply<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Ok(value) => Reply::Ok(value),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

// =============================================================================
// Identity Service
// =============================================================================

/// Credentials for registration and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

/// Session token issued on register or login. Valid for 30 minutes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

// =============================================================================
// Storage Service
// =============================================================================

/// Decrypted record content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecordContent {
    pub name: String,
    pub kind: String,
    /// Plaintext, base64-encoded
    #[serde(with = "b64")]
    #[schema(value_type = String, format = Byte)]
    pub data: Vec<u8>,
}

/// Result of a completed upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WriteResponse {
    /// Identifier assigned to the new record
    pub id: RecordId,
}

/// Result of a delete. Deleting a missing record is not an error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeleteResponse {
    /// Rows removed (0 or 1)
    pub deleted: u64,
}

/// Serde adapter for standard base64 byte fields.
pub mod b64 {
    use base64ct::{Base64, Encoding};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(|_| D::Error::custom("invalid base64"))
    }
}
