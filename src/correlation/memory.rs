// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory correlation store.
//!
//! Suitable for tests and single-process deployments. Records are lost on
//! restart, which simply forces every client through sign-in again.
//!
//! A record is confirmed the first time it is fetched by id: the client has
//! sent the identifier cookie back, which is the round trip an `Unfamiliar`
//! record waits for.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{CorrelationRecord, CorrelationState, CorrelationStore, StoreContext, StoreError, StoreResult};

#[derive(Default)]
pub struct InMemoryCorrelationStore {
    records: RwLock<HashMap<String, CorrelationRecord>>,
}

impl InMemoryCorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a record.
    pub fn insert(&self, record: CorrelationRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.id.clone(), record);
        }
    }

    /// Inspect a record without confirming it.
    pub fn get(&self, id: &str) -> Option<CorrelationRecord> {
        self.records.read().ok()?.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("correlation map lock poisoned".to_string())
}

impl CorrelationStore for InMemoryCorrelationStore {
    async fn create(&self, _ctx: &StoreContext) -> StoreResult<CorrelationRecord> {
        let record = CorrelationRecord::unfamiliar(Uuid::new_v4().to_string());
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: &str, _ctx: &StoreContext) -> StoreResult<Option<CorrelationRecord>> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let Some(record) = records.get_mut(id) else {
            return Ok(None);
        };
        record.state = CorrelationState::Established;
        Ok(Some(record.clone()))
    }

    async fn update(
        &self,
        id: &str,
        expected: Option<&str>,
        secret: &str,
        _ctx: &StoreContext,
    ) -> StoreResult<CorrelationRecord> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.secret.as_deref() != expected {
            return Err(StoreError::Conflict { id: id.to_string() });
        }

        record.secret = Some(secret.to_string());
        record.state = CorrelationState::Established;
        Ok(record.clone())
    }
}
