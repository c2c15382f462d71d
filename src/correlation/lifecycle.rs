// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declare / register / renew operations over a [`CorrelationStore`].

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, info, warn};

use super::{CorrelationRecord, CorrelationStore, StoreContext, StoreError};
use crate::auth::AuthError;

/// Random bytes per generated secret.
const SECRET_LEN: usize = 32;

pub struct CorrelationLifecycle<S> {
    store: Arc<S>,
    rng: SystemRandom,
}

impl<S: CorrelationStore> CorrelationLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            rng: SystemRandom::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve `id` to its record, creating a new `Unfamiliar` one when the id
    /// is absent or unknown to the store.
    pub async fn declare(
        &self,
        id: Option<&str>,
        ctx: &StoreContext,
    ) -> Result<CorrelationRecord, AuthError> {
        if let Some(id) = id {
            if let Some(record) = self.store.fetch(id, ctx).await? {
                return Ok(record);
            }
            debug!(correlation_id = %id, "Presented correlation is unknown");
        }

        let record = self.store.create(ctx).await?;
        info!(correlation_id = %record.id, "Correlation created");
        Ok(record)
    }

    /// Declare `id` and, when it is established, rotate its secret.
    ///
    /// `Unfamiliar` records come back unchanged: no rotation and no token
    /// until the client has presented the identifier again.
    pub async fn register(
        &self,
        id: Option<&str>,
        ctx: &StoreContext,
    ) -> Result<CorrelationRecord, AuthError> {
        let record = self.declare(id, ctx).await?;
        if record.is_unfamiliar() {
            return Ok(record);
        }

        self.rotate(&record.id, record.secret.as_deref(), ctx).await
    }

    /// Rotate the secret of correlation `id`, provided the caller presents
    /// the currently stored secret.
    pub async fn renew(
        &self,
        id: &str,
        secret: &str,
        ctx: &StoreContext,
    ) -> Result<CorrelationRecord, AuthError> {
        let Some(current) = self.store.fetch(id, ctx).await? else {
            warn!(correlation_id = %id, "Renewal for unknown correlation");
            return Err(AuthError::SecretMismatch);
        };

        if current.secret.as_deref() != Some(secret) {
            warn!(correlation_id = %id, "Renewal presented a rotated secret");
            return Err(AuthError::SecretMismatch);
        }

        self.rotate(id, Some(secret), ctx).await
    }

    async fn rotate(
        &self,
        id: &str,
        expected: Option<&str>,
        ctx: &StoreContext,
    ) -> Result<CorrelationRecord, AuthError> {
        let secret = self.generate_secret()?;

        match self.store.update(id, expected, &secret, ctx).await {
            Ok(record) => {
                debug!(correlation_id = %id, "Correlation secret rotated");
                Ok(record)
            }
            Err(StoreError::Conflict { .. }) => {
                warn!(correlation_id = %id, "Lost concurrent secret rotation");
                Err(AuthError::SecretMismatch)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn generate_secret(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; SECRET_LEN];
        self.rng.fill(&mut bytes).map_err(|_| AuthError::Randomness)?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }
}
