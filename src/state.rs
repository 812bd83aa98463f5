// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::crypto::MasterKey;
use crate::pipeline::RecordPipeline;
use crate::service::VaultService;
use crate::storage::VaultStore;

/// Shared, read-only handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VaultStore>,
    pub tokens: Arc<TokenKeys>,
    pub service: VaultService,
}

impl AppState {
    pub fn new(store: Arc<dyn VaultStore>, master_key: MasterKey, jwt_secret: &[u8]) -> Self {
        let pipeline = Arc::new(RecordPipeline::new(master_key, store.clone()));
        let tokens = Arc::new(TokenKeys::new(jwt_secret));
        let service = VaultService::new(store.clone(), pipeline, tokens.clone());
        Self {
            store,
            tokens,
            service,
        }
    }
}
