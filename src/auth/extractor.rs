// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the caller identity.
//!
//! The gate stores the verified identity in the request extensions; this
//! extractor hands it to handlers as an explicit value. It never rejects:
//! a missing identity (gate bypassed or misconfigured) is a business error
//! for the handler to report, not a transport failure.
//!
//! ```rust,ignore
//! async fn list_records(Caller(identity): Caller, State(state): State<AppState>) {
//!     state.service.read_all_records(identity.as_ref());
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::Identity;

/// Identity attached to the current call, if any.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Identity>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Identity>().cloned()))
    }
}
