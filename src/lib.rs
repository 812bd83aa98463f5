// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keeper - Personal Secrets Vault
//!
//! Authenticated owners store named secrets and files. Each record is sealed
//! under its own AES-GCM key, and that key is wrapped under a single server
//! master key before anything reaches disk.
//!
//! ## Modules
//!
//! - `agent` - Command-line agent over the client
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token gate, session tokens, password hashing
//! - `client` - Typed HTTP client
//! - `crypto` - Envelope encryption
//! - `pipeline` - Streaming upload and decrypting read of records
//! - `service` - Business operations and user-facing errors
//! - `storage` - User and record persistence (redb)

pub mod agent;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod service;
pub mod state;
pub mod storage;
