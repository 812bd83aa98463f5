// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated encryption primitive (AES-128-GCM).
//!
//! Key size: 16 bytes. Nonce: 12 bytes (random per call). Tag: 16 bytes.
//!
//! Encoded format:
//!   `base64(nonce) + "*" + base64(ciphertext || tag)`

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use super::error::{CryptoError, CryptoResult};

/// Key length used for both the master key and record keys.
pub const KEY_LEN: usize = 16;

/// Separator between the encoded nonce and the encoded ciphertext.
const SEPARATOR: char = '*';

/// Truncate keys longer than [`KEY_LEN`]; shorter keys pass through as-is.
///
/// A short key is not padded, so it fails cipher setup instead of being
/// silently stretched.
pub fn normalize_key(key: &[u8]) -> &[u8] {
    if key.len() > KEY_LEN {
        &key[..KEY_LEN]
    } else {
        key
    }
}

fn cipher_for(key: &[u8]) -> CryptoResult<LessSafeKey> {
    let key = normalize_key(key);
    let unbound = UnboundKey::new(&AES_128_GCM, key).map_err(|_| CryptoError::KeySetup(key.len()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Fill a buffer from the system random source.
pub(crate) fn fill_random(rng: &SystemRandom, buf: &mut [u8]) -> CryptoResult<()> {
    rng.fill(buf).map_err(|_| CryptoError::Random)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal(key: &[u8], plaintext: &[u8]) -> CryptoResult<String> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    fill_random(&SystemRandom::new(), &mut nonce_bytes)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    cipher
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Seal)?;

    let mut encoded = Base64::encode_string(&nonce_bytes);
    encoded.push(SEPARATOR);
    encoded.push_str(&Base64::encode_string(&in_out));
    Ok(encoded)
}

/// Decrypt a value produced by [`seal`].
pub fn open(key: &[u8], encoded: &str) -> CryptoResult<Vec<u8>> {
    let mut parts = encoded.split(SEPARATOR);
    let (nonce_b64, ciphertext_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(nonce), Some(ciphertext), None) => (nonce, ciphertext),
        _ => return Err(CryptoError::MissingSeparator),
    };

    let nonce_bytes = Base64::decode_vec(nonce_b64).map_err(|_| CryptoError::Base64("nonce"))?;
    let mut in_out =
        Base64::decode_vec(ciphertext_b64).map_err(|_| CryptoError::Base64("ciphertext"))?;

    let cipher = cipher_for(key)?;
    let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes)
        .map_err(|_| CryptoError::InvalidNonce(nonce_bytes.len()))?;

    let plaintext_len = cipher
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Authentication)?
        .len();
    in_out.truncate(plaintext_len);
    Ok(in_out)
}
