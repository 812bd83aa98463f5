// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope encryption: per-record keys wrapped under the master key.

use ring::rand::SystemRandom;
use zeroize::Zeroizing;

use super::aead::{self, fill_random, KEY_LEN};
use super::error::{CryptoError, CryptoResult};

/// Server master key. Immutable for the lifetime of the process.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<Vec<u8>>);

impl MasterKey {
    /// Accept a master key of at least [`KEY_LEN`] bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> CryptoResult<Self> {
        let bytes = bytes.into();
        if bytes.len() < KEY_LEN {
            return Err(CryptoError::WeakMasterKey {
                min: KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// The two stored halves of an encrypted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Payload sealed under the record key.
    pub cipher_value: String,
    /// Record key sealed under the master key.
    pub wrapped_key: String,
}

/// Seal `plaintext` under a fresh record key and wrap that key.
pub fn wrap_and_encrypt(master_key: &[u8], plaintext: &[u8]) -> CryptoResult<Envelope> {
    let mut record_key = Zeroizing::new([0u8; KEY_LEN]);
    fill_random(&SystemRandom::new(), &mut record_key[..])?;

    let wrapped_key = aead::seal(master_key, &record_key[..])?;
    let cipher_value = aead::seal(&record_key[..], plaintext)?;

    Ok(Envelope {
        cipher_value,
        wrapped_key,
    })
}

/// Unwrap the record key with `master_key`, then open `cipher_value`.
pub fn unwrap_and_decrypt(
    master_key: &[u8],
    wrapped_key: &str,
    cipher_value: &str,
) -> CryptoResult<Vec<u8>> {
    let record_key = Zeroizing::new(aead::open(master_key, wrapped_key)?);
    aead::open(&record_key[..], cipher_value)
}
