// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the vault API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in via the identity service (`/v1/users/*`)
//!    and receives an HS256 token valid for 30 minutes
//! 2. Client sends `Authorization: Bearer <token>` on every storage call
//! 3. Server ([`middleware::auth_gate`]):
//!    - Decides per route whether the gate runs ([`middleware::requires_auth`])
//!    - Verifies signature and expiry with the shared signing secret
//!    - Inserts the caller [`Identity`] into the request extensions
//! 4. Handlers receive the identity through the [`Caller`] extractor
//!
//! ## Security
//!
//! - Rejections never reveal which user a token belonged to
//! - There is no refresh flow; clients log in again after expiry
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::{Claims, Identity};
pub use error::AuthError;
pub use extractor::Caller;
pub use password::{hash_password, verify_password, PasswordError};
pub use token::TokenKeys;
