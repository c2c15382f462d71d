// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Correlation-bound bearer session authentication.
//!
//! ## Modules
//!
//! - `auth` - Token codec, per-call authenticator, Axum middleware and extractors
//! - `correlation` - Correlation records, store contract and lifecycle
//! - `transport` - Credential extraction and buffered response headers
//! - `error` - The generic "must authenticate" rejection
//! - `config` - Environment configuration
//! - `telemetry` - Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod correlation;
pub mod error;
pub mod telemetry;
pub mod transport;
