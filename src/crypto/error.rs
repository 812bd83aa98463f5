// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crypto engine errors.
//!
//! Variants are kept distinct so the server log can tell a malformed
//! ciphertext from a tampered one. The API boundary folds all of them into a
//! single "failed decrypt data" reply.

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The system random source failed.
    #[error("random generation failed")]
    Random,

    /// The cipher rejected the key (wrong length after normalization).
    #[error("cipher setup failed: key is {0} bytes, expected 16")]
    KeySetup(usize),

    /// Sealing failed inside the cipher.
    #[error("encryption failed")]
    Seal,

    /// Encoded value does not contain exactly one `*` separator.
    #[error("malformed ciphertext: expected exactly one '*' separator")]
    MissingSeparator,

    /// One of the two base64 halves could not be decoded.
    #[error("malformed ciphertext: invalid base64 in {0}")]
    Base64(&'static str),

    /// The decoded nonce has the wrong length for the cipher.
    #[error("malformed ciphertext: nonce is {0} bytes")]
    InvalidNonce(usize),

    /// Tag verification failed: tampered data or wrong key.
    #[error("authentication failed")]
    Authentication,

    /// Master key is too short to be accepted at startup.
    #[error("master key must be at least {min} bytes, got {actual}")]
    WeakMasterKey { min: usize, actual: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
