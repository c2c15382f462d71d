// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host-supplied conversion between user models and token payloads.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("user payload rejected: {0}")]
pub struct UserCodecError(pub String);

/// Converts the host's user model to and from the value embedded in tokens.
///
/// The payload is opaque to the authenticator.
pub trait UserCodec: Send + Sync + 'static {
    type User: Clone + Send + Sync + 'static;

    fn to_values(&self, user: &Self::User) -> Result<Value, UserCodecError>;

    fn to_model(&self, values: Value) -> Result<Self::User, UserCodecError>;
}

/// [`UserCodec`] for any serde type.
pub struct JsonUserCodec<U>(PhantomData<fn() -> U>);

impl<U> JsonUserCodec<U> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<U> Default for JsonUserCodec<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> UserCodec for JsonUserCodec<U>
where
    U: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type User = U;

    fn to_values(&self, user: &U) -> Result<Value, UserCodecError> {
        serde_json::to_value(user).map_err(|e| UserCodecError(e.to_string()))
    }

    fn to_model(&self, values: Value) -> Result<U, UserCodecError> {
        serde_json::from_value(values).map_err(|e| UserCodecError(e.to_string()))
    }
}
