// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::audit_writer::AuditLogger;
use crate::encryption::{EncryptionGate, FieldCodec};
use crate::settings::DEFAULT_NOTES_LIMIT;
use crate::storage::NotesDatabase;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<NotesDatabase>,
    pub codec: FieldCodec,
    pub audit: AuditLogger,
    /// Default page size for note listings.
    pub notes_limit: u32,
    /// Serializes check-then-write sequences (category name uniqueness).
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Arc<NotesDatabase>, gate: Arc<EncryptionGate>, audit: AuditLogger) -> Self {
        Self {
            db,
            codec: FieldCodec::new(gate),
            audit,
            notes_limit: DEFAULT_NOTES_LIMIT,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_notes_limit(mut self, limit: u32) -> Self {
        self.notes_limit = limit.max(1);
        self
    }

    pub fn gate(&self) -> &EncryptionGate {
        self.codec.gate()
    }
}
