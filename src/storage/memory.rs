// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store for tests and local development.
//!
//! Not durable. Behaves like [`super::RedbStore`] with respect to unique logins,
//! owner scoping and id assignment.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{
    NewRecord, Record, RecordId, RecordSummary, StoreError, StoreResult, User, UserId, VaultStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    logins: HashMap<String, UserId>,
    records: BTreeMap<RecordId, Record>,
    last_user_id: UserId,
    last_record_id: RecordId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Corrupted("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Corrupted("memory store lock poisoned".to_string()))
    }
}

impl VaultStore for MemoryStore {
    fn create_user(&self, login: &str, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.logins.contains_key(login) {
            return Err(StoreError::LoginTaken(login.to_string()));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.logins.insert(user.login.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables
            .logins
            .get(login)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn create_record(&self, record: NewRecord) -> StoreResult<Record> {
        let mut tables = self.write()?;
        tables.last_record_id += 1;
        let record = record.into_record(tables.last_record_id);
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn list_records_by_owner(&self, owner: UserId) -> StoreResult<Vec<RecordSummary>> {
        let tables = self.read()?;
        Ok(tables
            .records
            .values()
            .filter(|record| record.owner == owner)
            .map(RecordSummary::from)
            .collect())
    }

    fn get_record(&self, id: RecordId, owner: UserId) -> StoreResult<Option<Record>> {
        let tables = self.read()?;
        Ok(tables
            .records
            .get(&id)
            .filter(|record| record.owner == owner)
            .cloned())
    }

    fn delete_record(&self, id: RecordId, owner: UserId) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let owned = tables
            .records
            .get(&id)
            .is_some_and(|record| record.owner == owner);
        if owned {
            tables.records.remove(&id);
            Ok(1)
        } else {
            Ok(0)
        }
    }
}
