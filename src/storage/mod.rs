// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage
//!
//! Categories, notes and the activity log live in a single embedded redb
//! database under the data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   settings.json
//!   notes.redb
//!     categories      id -> Category JSON (name is ciphertext)
//!     notes           id -> Note JSON (subject/content/tags are ciphertext)
//!     activity_logs   seq -> ActivityLog JSON
//! ```
//!
//! ## Important Notes
//!
//! - This layer stores whatever strings it is given
//! - Encryption happens before rows arrive here, in
//!   [`FieldCodec`](crate::encryption::FieldCodec)
//! - Every operation is one redb transaction

pub mod audit;
pub mod database;
pub mod paths;
pub mod repository;

pub use audit::{
    ActivityAction, ActivityLog, ActivityLogFilter, AuditRepository, EntityType, LOCAL_ACTOR_ID,
    UNKNOWN_ADDRESS,
};
pub use database::{DbError, DbResult, NotesDatabase};
pub use paths::StoragePaths;
pub use repository::{CategoryRepository, NoteFilter, NoteRepository};
