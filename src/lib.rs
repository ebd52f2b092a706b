// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Personal Notes - encrypted note-taking service
//!
//! Categories and notes over HTTP. Note subjects, contents and tags and
//! category names are sealed with AES-256-GCM before they reach the
//! embedded database, and every write is refused while the encryption key
//! is missing or fails its self-test.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `encryption` - key management, the write gate and the field codec
//! - `storage` - redb tables, repositories and the activity log
//! - `audit_writer` - background writer for activity log entries
//! - `integrity` - startup sweep for notes that no longer decrypt

pub mod api;
pub mod audit_writer;
pub mod config;
pub mod encryption;
pub mod error;
pub mod integrity;
pub mod models;
pub mod settings;
pub mod state;
pub mod storage;
