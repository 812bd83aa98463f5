// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized [`User`]
//! - `user_logins`: login → user id (unique constraint)
//! - `records`: record id → serialized [`Record`]
//! - `owner_records`: composite key (owner_be | id_be) → record id
//! - `sequences`: sequence name → last assigned id

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{
    NewRecord, Record, RecordId, RecordSummary, StoreError, StoreResult, User, UserId, VaultStore,
};

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

const USER_LOGINS: TableDefinition<&str, u64> = TableDefinition::new("user_logins");

const RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("records");

/// Index: `owner (8 bytes BE) | record id (8 bytes BE)` → record id.
/// Big-endian keys keep one owner's records contiguous and ordered by id.
const OWNER_RECORDS: TableDefinition<&[u8], u64> = TableDefinition::new("owner_records");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const USER_SEQ: &str = "users";
const RECORD_SEQ: &str = "records";

// =============================================================================
// Index Key Helpers
// =============================================================================

fn owner_key(owner: UserId, id: RecordId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&owner.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

/// Advance a named sequence inside an open write transaction.
fn next_id(txn: &redb::WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// RedbStore
// =============================================================================

/// redb-backed [`VaultStore`].
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_LOGINS)?;
            let _ = write_txn.open_table(RECORDS)?;
            let _ = write_txn.open_table(OWNER_RECORDS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Record database opened");
        Ok(Self { db })
    }
}

impl VaultStore for RedbStore {
    fn create_user(&self, login: &str, password_hash: &str) -> StoreResult<User> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut logins = write_txn.open_table(USER_LOGINS)?;
            if logins.get(login)?.is_some() {
                return Err(StoreError::LoginTaken(login.to_string()));
            }

            let id = next_id(&write_txn, USER_SEQ)?;
            let user = User {
                id,
                login: login.to_string(),
                password_hash: password_hash.to_string(),
            };
            let json = serde_json::to_vec(&user)?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            logins.insert(login, id)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let logins = read_txn.open_table(USER_LOGINS)?;
        let Some(id) = logins.get(login)?.map(|v| v.value()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        let value = users
            .get(id)?
            .ok_or_else(|| StoreError::Corrupted(format!("login index points at missing user {id}")))?;
        Ok(Some(serde_json::from_slice(value.value())?))
    }

    fn create_record(&self, record: NewRecord) -> StoreResult<Record> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let id = next_id(&write_txn, RECORD_SEQ)?;
            let record = record.into_record(id);
            let json = serde_json::to_vec(&record)?;

            let mut records = write_txn.open_table(RECORDS)?;
            records.insert(id, json.as_slice())?;

            let mut index = write_txn.open_table(OWNER_RECORDS)?;
            index.insert(owner_key(record.owner, id).as_slice(), id)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    fn list_records_by_owner(&self, owner: UserId) -> StoreResult<Vec<RecordSummary>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(OWNER_RECORDS)?;
        let records = read_txn.open_table(RECORDS)?;

        let start = owner_key(owner, 0);
        let end = owner_key(owner, u64::MAX);

        let mut summaries = Vec::new();
        for entry in index.range(start.as_slice()..=end.as_slice())? {
            let (_, id) = entry?;
            let id = id.value();
            match records.get(id)? {
                Some(value) => {
                    let record: Record = serde_json::from_slice(value.value())?;
                    summaries.push(RecordSummary::from(&record));
                }
                None => {
                    tracing::warn!(record_id = id, owner, "Owner index points at missing record");
                }
            }
        }
        Ok(summaries)
    }

    fn get_record(&self, id: RecordId, owner: UserId) -> StoreResult<Option<Record>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(OWNER_RECORDS)?;
        if index.get(owner_key(owner, id).as_slice())?.is_none() {
            return Ok(None);
        }

        let records = read_txn.open_table(RECORDS)?;
        let record = match records.get(id)? {
            Some(value) => Some(serde_json::from_slice::<Record>(value.value())?),
            None => None,
        };
        Ok(record.filter(|r| r.owner == owner))
    }

    fn delete_record(&self, id: RecordId, owner: UserId) -> StoreResult<u64> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut index = write_txn.open_table(OWNER_RECORDS)?;
            let indexed = index.remove(owner_key(owner, id).as_slice())?.is_some();
            if indexed {
                let mut records = write_txn.open_table(RECORDS)?;
                records.remove(id)?;
                1
            } else {
                0
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}
