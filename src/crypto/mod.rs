// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Crypto Engine
//!
//! Envelope encryption for stored records.
//!
//! Every record is sealed under a fresh 16-byte record key, and that record
//! key is itself sealed under the server master key:
//!
//! ```text
//! master key ──seal──▶ wrapped_key   (stored)
//! record key ──seal──▶ cipher_value  (stored)
//! ```
//!
//! Both outputs use the same text encoding:
//! `base64(nonce) + "*" + base64(ciphertext || tag)`.
//!
//! The engine is stateless: keys are always supplied by the caller and no
//! key, plaintext or intermediate buffer is ever logged.

pub mod aead;
pub mod envelope;
pub mod error;

pub use aead::{normalize_key, open, seal, KEY_LEN};
pub use envelope::{unwrap_and_decrypt, wrap_and_encrypt, Envelope, MasterKey};
pub use error::{CryptoError, CryptoResult};
