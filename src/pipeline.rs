// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Record Pipeline
//!
//! Streaming upload and decrypting read of records.
//!
//! ## Write Path
//!
//! An upload is a stream of [`WriteChunk`] frames. The first non-empty name
//! and the first non-empty kind win; every chunk is appended in arrival
//! order. When the stream ends the buffer is sealed under a fresh record key
//! and persisted in one store call. A stream that fails before its end
//! leaves nothing behind.
//!
//! ```text
//! RECEIVING ──end──▶ ENCRYPTING ──▶ PERSISTING ──▶ RESPONDING
//!     │                  │              │              ▲
//!     └──── error ───────┴──────────────┴──────────────┘
//! ```
//!
//! ## Read Path
//!
//! Records are loaded by `(id, owner)`, their key is unwrapped under the
//! master key, and the content is decrypted.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::crypto::{unwrap_and_decrypt, wrap_and_encrypt, CryptoError, MasterKey};
use crate::models::RecordContent;
use crate::storage::{NewRecord, Record, RecordId, StoreError, UserId, VaultStore};

/// One frame of a streaming upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WriteChunk {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    /// Payload bytes, base64-encoded
    #[serde(default, with = "crate::models::b64")]
    #[schema(value_type = String, format = Byte)]
    pub chunk: Vec<u8>,
}

impl WriteChunk {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, chunk: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            chunk: chunk.into(),
        }
    }
}

/// Stage of an upload. Any failure jumps straight to `Responding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Receiving,
    Encrypting,
    Persisting,
    Responding,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upload stream failed: {0}")]
    Stream(String),

    #[error("encryption failed: {0}")]
    Encrypt(#[source] CryptoError),

    #[error("decryption failed: {0}")]
    Decrypt(#[source] CryptoError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Accumulated state of one upload.
///
/// The plaintext buffer is wiped when the upload is dropped.
pub struct RecordUpload {
    owner: UserId,
    name: String,
    kind: String,
    buffer: Zeroizing<Vec<u8>>,
    stage: UploadStage,
}

impl RecordUpload {
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            name: String::new(),
            kind: String::new(),
            buffer: Zeroizing::new(Vec::new()),
            stage: UploadStage::Receiving,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    /// Number of payload bytes received so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Absorb one frame.
    pub fn push(&mut self, chunk: WriteChunk) {
        if self.name.is_empty() && !chunk.name.is_empty() {
            self.name = chunk.name;
        }
        if self.kind.is_empty() && !chunk.kind.is_empty() {
            self.kind = chunk.kind;
        }
        self.buffer.extend_from_slice(&chunk.chunk);
    }

    /// Move to `Responding` and return the stage the upload ended in.
    pub fn finish(&mut self) -> UploadStage {
        std::mem::replace(&mut self.stage, UploadStage::Responding)
    }

    /// Seal the buffered payload under a fresh record key.
    pub fn seal(&mut self, master_key: &MasterKey) -> Result<NewRecord, PipelineError> {
        self.stage = UploadStage::Encrypting;
        let envelope = wrap_and_encrypt(master_key.as_bytes(), &self.buffer)
            .map_err(PipelineError::Encrypt)?;
        Ok(NewRecord {
            owner: self.owner,
            name: std::mem::take(&mut self.name),
            kind: std::mem::take(&mut self.kind),
            cipher_value: envelope.cipher_value,
            wrapped_key: envelope.wrapped_key,
        })
    }
}

/// Encrypts uploads into the store and decrypts them back out.
pub struct RecordPipeline {
    master_key: MasterKey,
    store: Arc<dyn VaultStore>,
}

impl RecordPipeline {
    pub fn new(master_key: MasterKey, store: Arc<dyn VaultStore>) -> Self {
        Self { master_key, store }
    }

    /// Consume an upload stream and persist the sealed record.
    ///
    /// Nothing is stored unless the stream ends cleanly.
    pub async fn ingest<S, E>(&self, owner: UserId, stream: S) -> Result<Record, PipelineError>
    where
        S: Stream<Item = Result<WriteChunk, E>>,
        E: std::fmt::Display,
    {
        let mut upload = RecordUpload::new(owner);
        let result = self.run_upload(&mut upload, stream).await;
        let reached = upload.finish();
        match &result {
            Ok(record) => tracing::debug!(owner, record_id = record.id, stage = ?reached, "Upload stored"),
            Err(e) => tracing::debug!(owner, stage = ?reached, error = %e, "Upload aborted"),
        }
        result
    }

    async fn run_upload<S, E>(
        &self,
        upload: &mut RecordUpload,
        stream: S,
    ) -> Result<Record, PipelineError>
    where
        S: Stream<Item = Result<WriteChunk, E>>,
        E: std::fmt::Display,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(frame) = stream.next().await {
            upload.push(frame.map_err(|e| PipelineError::Stream(e.to_string()))?);
        }

        tracing::debug!(owner = upload.owner, bytes = upload.len(), "Upload received");
        let record = upload.seal(&self.master_key)?;
        upload.stage = UploadStage::Persisting;
        Ok(self.store.create_record(record)?)
    }

    /// Load and decrypt record `id` of `owner`. `None` if it does not exist
    /// or belongs to someone else.
    pub fn open(&self, id: RecordId, owner: UserId) -> Result<Option<RecordContent>, PipelineError> {
        let Some(record) = self.store.get_record(id, owner)? else {
            return Ok(None);
        };

        let data = unwrap_and_decrypt(
            self.master_key.as_bytes(),
            &record.wrapped_key,
            &record.cipher_value,
        )
        .map_err(PipelineError::Decrypt)?;

        Ok(Some(RecordContent {
            name: record.name,
            kind: record.kind,
            data,
        }))
    }
}
