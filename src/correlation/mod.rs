// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Correlations
//!
//! A correlation is a server-tracked binding for one client (one browser, one
//! device). Its identifier lives in a long-lived cookie; its secret lives only
//! inside the session token and rotates on every renewal.
//!
//! ## States
//!
//! ```text
//! Unknown --create--> Unfamiliar --confirmed round trip--> Established
//!                                                  \--rotate--/
//! ```
//!
//! Records are persisted by an external [`CorrelationStore`]. Its `update`
//! MUST be a compare-and-swap on the previously known secret, so that of two
//! concurrent renewals presenting the same secret exactly one succeeds.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod lifecycle;
pub mod memory;

pub use lifecycle::CorrelationLifecycle;
pub use memory::InMemoryCorrelationStore;

/// Whether a correlation has completed a confirmed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationState {
    /// Freshly created; no token is issued against it yet
    Unfamiliar,
    /// Confirmed; tokens may be issued and renewed
    Established,
}

/// Correlation record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub id: String,
    /// Current secret. `None` until the first rotation.
    pub secret: Option<String>,
    pub state: CorrelationState,
}

impl CorrelationRecord {
    pub fn unfamiliar(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: None,
            state: CorrelationState::Unfamiliar,
        }
    }

    pub fn established(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: Some(secret.into()),
            state: CorrelationState::Established,
        }
    }

    pub fn is_unfamiliar(&self) -> bool {
        self.state == CorrelationState::Unfamiliar
    }
}

/// Call-scoped information handed to the store with every operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreContext {
    /// Serialized user of the call, when one is known
    pub user: Option<Value>,
}

impl StoreContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: Value) -> Self {
        Self { user: Some(user) }
    }
}

/// Correlation store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-swap lost: the stored secret is not the expected one
    #[error("correlation {id} was modified concurrently")]
    Conflict { id: String },

    #[error("correlation not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable keyed storage for correlation records.
pub trait CorrelationStore: Send + Sync + 'static {
    /// Create a new `Unfamiliar` record with a store-assigned id.
    fn create(&self, ctx: &StoreContext) -> impl Future<Output = StoreResult<CorrelationRecord>> + Send;

    /// Look up a record by id.
    fn fetch(
        &self,
        id: &str,
        ctx: &StoreContext,
    ) -> impl Future<Output = StoreResult<Option<CorrelationRecord>>> + Send;

    /// Replace the secret of `id` with `secret` if and only if the stored
    /// secret still equals `expected`; otherwise fail with
    /// [`StoreError::Conflict`]. The returned record is `Established`.
    fn update(
        &self,
        id: &str,
        expected: Option<&str>,
        secret: &str,
        ctx: &StoreContext,
    ) -> impl Future<Output = StoreResult<CorrelationRecord>> + Send;
}

impl<T: CorrelationStore> CorrelationStore for Arc<T> {
    fn create(&self, ctx: &StoreContext) -> impl Future<Output = StoreResult<CorrelationRecord>> + Send {
        (**self).create(ctx)
    }

    fn fetch(
        &self,
        id: &str,
        ctx: &StoreContext,
    ) -> impl Future<Output = StoreResult<Option<CorrelationRecord>>> + Send {
        (**self).fetch(id, ctx)
    }

    fn update(
        &self,
        id: &str,
        expected: Option<&str>,
        secret: &str,
        ctx: &StoreContext,
    ) -> impl Future<Output = StoreResult<CorrelationRecord>> + Send {
        (**self).update(id, expected, secret, ctx)
    }
}
