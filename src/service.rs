// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault Service
//!
//! Business operations behind the HTTP handlers: the identity service
//! (register, login) and the storage service (list, read, write, delete).
//!
//! Every storage operation takes the caller identity as an explicit
//! `Option<&Identity>`. A missing identity is reported as a business error.
//! Internal failures are logged here in full and collapse to a generic
//! message in the returned [`ServiceError`].

use std::sync::Arc;

use futures::Stream;

use crate::auth::{hash_password, verify_password, AuthError, Identity, TokenKeys};
use crate::models::{DeleteResponse, RecordContent, TokenResponse, WriteResponse};
use crate::pipeline::{PipelineError, RecordPipeline, WriteChunk};
use crate::storage::{RecordId, RecordSummary, StoreError, UserId, VaultStore};

/// Result of a business operation.
pub type Outcome<T> = Result<T, ServiceError>;

/// Business error. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid token")]
    InvalidToken,

    #[error("login or password incorrect")]
    InvalidCredentials,

    #[error("this user exists")]
    UserExists,

    #[error("failed create user")]
    CreateUserFailed,

    #[error("user not found")]
    UserNotFound,

    #[error("failed login")]
    LoginFailed,

    #[error("failed get all records")]
    ListFailed,

    #[error("failed read record")]
    ReadFailed,

    #[error("record not found")]
    RecordNotFound,

    #[error("failed decrypt data")]
    DecryptFailed,

    #[error("failed receive chunk")]
    ReceiveFailed,

    #[error("failed encrypt data")]
    EncryptFailed,

    #[error("failed write record")]
    WriteFailed,

    #[error("failed delete record")]
    DeleteFailed,
}

#[derive(Clone)]
pub struct VaultService {
    store: Arc<dyn VaultStore>,
    pipeline: Arc<RecordPipeline>,
    tokens: Arc<TokenKeys>,
}

fn caller(identity: Option<&Identity>) -> Outcome<&Identity> {
    identity.ok_or(ServiceError::InvalidToken)
}

impl VaultService {
    pub fn new(
        store: Arc<dyn VaultStore>,
        pipeline: Arc<RecordPipeline>,
        tokens: Arc<TokenKeys>,
    ) -> Self {
        Self {
            store,
            pipeline,
            tokens,
        }
    }

    // =========================================================================
    // Identity service
    // =========================================================================

    /// Create an account and return a session token.
    ///
    /// The account is committed before the token is issued. If issuance then
    /// fails the caller sees "failed create user" while the account exists,
    /// and a retry reports "this user exists"; logging in recovers.
    pub async fn register(&self, login: &str, password: &str) -> Outcome<TokenResponse> {
        if login.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                ServiceError::CreateUserFailed
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password");
                ServiceError::CreateUserFailed
            })?;

        let user = self.store.create_user(login, &hash).map_err(|e| match e {
            StoreError::LoginTaken(_) => ServiceError::UserExists,
            e => {
                tracing::error!(error = %e, "Failed to create user");
                ServiceError::CreateUserFailed
            }
        })?;

        tracing::info!(user_id = user.id, "User registered");
        self.session(user.id, &user.login).map_err(|e| {
            tracing::warn!(user_id = user.id, error = %e, "User registered without a session token");
            ServiceError::CreateUserFailed
        })
    }

    /// Check credentials and return a session token.
    pub async fn login(&self, login: &str, password: &str) -> Outcome<TokenResponse> {
        let user = self
            .store
            .find_user_by_login(login)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to look up user");
                ServiceError::LoginFailed
            })?
            .ok_or(ServiceError::UserNotFound)?;

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "Password check task failed");
                ServiceError::LoginFailed
            })?
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "Failed to verify password");
                ServiceError::LoginFailed
            })?;
        if !matches {
            return Err(ServiceError::InvalidCredentials);
        }

        self.session(user.id, &user.login).map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Failed to issue token");
            ServiceError::LoginFailed
        })
    }

    fn session(&self, user_id: UserId, login: &str) -> Result<TokenResponse, AuthError> {
        let token = self.tokens.issue(user_id, login)?;
        Ok(TokenResponse { token })
    }

    // =========================================================================
    // Storage service
    // =========================================================================

    /// Summaries of every record owned by the caller.
    pub fn read_all_records(&self, identity: Option<&Identity>) -> Outcome<Vec<RecordSummary>> {
        let identity = caller(identity)?;
        self.store
            .list_records_by_owner(identity.user_id)
            .map_err(|e| {
                tracing::error!(user_id = identity.user_id, error = %e, "Failed to list records");
                ServiceError::ListFailed
            })
    }

    /// Decrypted content of one of the caller's records.
    pub fn read_record(&self, identity: Option<&Identity>, id: RecordId) -> Outcome<RecordContent> {
        let identity = caller(identity)?;
        match self.pipeline.open(id, identity.user_id) {
            Ok(Some(content)) => Ok(content),
            Ok(None) => Err(ServiceError::RecordNotFound),
            Err(PipelineError::Decrypt(e)) => {
                tracing::error!(record_id = id, error = %e, "Failed to decrypt record");
                Err(ServiceError::DecryptFailed)
            }
            Err(e) => {
                tracing::error!(record_id = id, error = %e, "Failed to read record");
                Err(ServiceError::ReadFailed)
            }
        }
    }

    /// Consume an upload stream into a new record owned by the caller.
    pub async fn write_record<S, E>(
        &self,
        identity: Option<&Identity>,
        chunks: S,
    ) -> Outcome<WriteResponse>
    where
        S: Stream<Item = Result<WriteChunk, E>>,
        E: std::fmt::Display,
    {
        let identity = caller(identity)?;
        match self.pipeline.ingest(identity.user_id, chunks).await {
            Ok(record) => {
                tracing::info!(record_id = record.id, user_id = identity.user_id, "Record written");
                Ok(WriteResponse { id: record.id })
            }
            Err(PipelineError::Stream(e)) => {
                tracing::error!(user_id = identity.user_id, error = %e, "Failed to receive chunk");
                Err(ServiceError::ReceiveFailed)
            }
            Err(e @ (PipelineError::Encrypt(_) | PipelineError::Decrypt(_))) => {
                tracing::error!(user_id = identity.user_id, error = %e, "Failed to encrypt record");
                Err(ServiceError::EncryptFailed)
            }
            Err(e @ PipelineError::Store(_)) => {
                tracing::error!(user_id = identity.user_id, error = %e, "Failed to write record");
                Err(ServiceError::WriteFailed)
            }
        }
    }

    /// Delete one of the caller's records. A missing record is not an error.
    pub fn delete_record(&self, identity: Option<&Identity>, id: RecordId) -> Outcome<DeleteResponse> {
        let identity = caller(identity)?;
        let deleted = self.store.delete_record(id, identity.user_id).map_err(|e| {
            tracing::error!(record_id = id, error = %e, "Failed to delete record");
            ServiceError::DeleteFailed
        })?;
        Ok(DeleteResponse { deleted })
    }
}
