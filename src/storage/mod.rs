// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Record Storage
//!
//! Persistence for users and encrypted records behind the [`VaultStore`]
//! trait.
//!
//! ## Ownership Model
//!
//! Every record lookup is scoped by `(id, owner)` in the same query. A record
//! that belongs to another user is indistinguishable from one that does not
//! exist; there is no separate authorization check.
//!
//! ## Backends
//!
//! - [`RedbStore`] - embedded ACID database (production)
//! - [`MemoryStore`] - in-process maps (tests and local runs)
//!
//! Stored records only ever contain ciphertext and a wrapped key.

pub mod error;
pub mod memory;
pub mod redb_store;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

pub type UserId = u64;
pub type RecordId = u64;

/// Registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// PHC-format password hash
    pub password_hash: String,
}

/// Encrypted record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub owner: UserId,
    pub name: String,
    pub kind: String,
    pub cipher_value: String,
    pub wrapped_key: String,
}

/// Record ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub owner: UserId,
    pub name: String,
    pub kind: String,
    pub cipher_value: String,
    pub wrapped_key: String,
}

impl NewRecord {
    fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            owner: self.owner,
            name: self.name,
            kind: self.kind,
            cipher_value: self.cipher_value,
            wrapped_key: self.wrapped_key,
        }
    }
}

/// Listing projection of a record. Never carries ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecordSummary {
    /// Record identifier
    pub id: RecordId,
    /// User-supplied label
    pub name: String,
    /// Free-form tag such as `text` or `file`
    pub kind: String,
    /// Owning user id
    pub owner: UserId,
}

impl From<&Record> for RecordSummary {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind.clone(),
            owner: record.owner,
        }
    }
}

/// Storage collaborator used by the service layer.
///
/// Implementations must scope every record read and delete by owner.
pub trait VaultStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::LoginTaken`] on a duplicate login.
    fn create_user(&self, login: &str, password_hash: &str) -> StoreResult<User>;

    /// Exact, case-sensitive login lookup.
    fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    /// Insert a record and return it with its assigned id.
    fn create_record(&self, record: NewRecord) -> StoreResult<Record>;

    /// All records of `owner`, ordered by id.
    fn list_records_by_owner(&self, owner: UserId) -> StoreResult<Vec<RecordSummary>>;

    /// Record `id` if and only if it belongs to `owner`.
    fn get_record(&self, id: RecordId, owner: UserId) -> StoreResult<Option<Record>>;

    /// Delete record `id` if it belongs to `owner`. Returns the number of rows removed.
    fn delete_record(&self, id: RecordId, owner: UserId) -> StoreResult<u64>;

    /// Cheap liveness check for readiness probes.
    fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
