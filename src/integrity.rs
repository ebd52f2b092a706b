// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Startup sweep for notes that can no longer be decrypted.
//!
//! Notes written before encryption was introduced, or under a different key,
//! fail strict decryption and are silently dropped from listings. The sweep
//! makes them visible in the logs once per start and can optionally delete
//! them.
//!
//! It only runs when the encryption gate is valid. With an invalid gate every
//! row would look unreadable.

use tracing::{info, warn};

use crate::encryption::FieldCodec;
use crate::storage::{DbResult, NoteFilter, NoteRepository, NotesDatabase};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub checked: usize,
    /// Ids of notes that failed strict decryption.
    pub unreadable: Vec<String>,
    pub purged: usize,
}

/// Check every stored note. Returns `None` when the sweep was skipped.
pub fn sweep_notes(
    db: &NotesDatabase,
    codec: &FieldCodec,
    purge: bool,
) -> DbResult<Option<IntegrityReport>> {
    if !codec.gate().is_valid() {
        warn!("Encryption unavailable, skipping note integrity sweep");
        return Ok(None);
    }

    let repo = NoteRepository::new(db);
    let notes = repo.get_all(&NoteFilter::default())?;

    let mut report = IntegrityReport {
        checked: notes.len(),
        ..Default::default()
    };

    for sealed in notes {
        let id = sealed.entity_id().to_string();
        if let Err(e) = codec.decrypt_fields(sealed) {
            warn!(note_id = %id, error = %e, "Note cannot be decrypted");
            report.unreadable.push(id);
        }
    }

    if purge && !report.unreadable.is_empty() {
        report.purged = repo.delete_many(&report.unreadable)?;
        warn!(purged = report.purged, "Deleted unreadable notes");
    }

    info!(
        checked = report.checked,
        unreadable = report.unreadable.len(),
        purged = report.purged,
        "Note integrity sweep complete"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::{EncryptionGate, EncryptionKey, Sealed, StaticKey};
    use crate::models::{Note, NoteRequest, Priority};
    use std::sync::Arc;

    fn codec_with(key: EncryptionKey) -> FieldCodec {
        let mut gate = EncryptionGate::new();
        gate.initialize(&StaticKey::new(key)).unwrap();
        FieldCodec::new(Arc::new(gate))
    }

    fn note(subject: &str) -> Note {
        Note::new(NoteRequest {
            subject: subject.to_string(),
            content: "c".to_string(),
            priority: Priority::Medium,
            tags: String::new(),
            category_id: None,
        })
    }

    struct Fixture {
        db: NotesDatabase,
        good_id: String,
        legacy_id: String,
        foreign_id: String,
        _dir: tempfile::TempDir,
    }

    fn fixture(codec: &FieldCodec) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = NotesDatabase::open(&dir.path().join("notes.redb")).unwrap();
        let repo = NoteRepository::new(&db);

        let good = codec.encrypt_fields(note("readable")).unwrap();
        let legacy = Sealed::from_storage(note("plaintext from an old build"));
        let foreign = codec_with(EncryptionKey::generate())
            .encrypt_fields(note("other key"))
            .unwrap();
        for n in [&good, &legacy, &foreign] {
            repo.create(n).unwrap();
        }

        Fixture {
            good_id: good.entity_id().to_string(),
            legacy_id: legacy.entity_id().to_string(),
            foreign_id: foreign.entity_id().to_string(),
            db,
            _dir: dir,
        }
    }

    #[test]
    fn reports_without_purging() {
        let codec = codec_with(EncryptionKey::generate());
        let fx = fixture(&codec);

        let report = sweep_notes(&fx.db, &codec, false).unwrap().unwrap();
        assert_eq!(report.checked, 3);
        assert_eq!(report.unreadable, vec![fx.legacy_id.clone(), fx.foreign_id.clone()]);
        assert_eq!(report.purged, 0);

        let remaining = NoteRepository::new(&fx.db)
            .get_all(&NoteFilter::default())
            .unwrap();
        assert_eq!(remaining.len(), 3);
    }

    #[test]
    fn purges_unreadable_notes() {
        let codec = codec_with(EncryptionKey::generate());
        let fx = fixture(&codec);

        let report = sweep_notes(&fx.db, &codec, true).unwrap().unwrap();
        assert_eq!(report.purged, 2);

        let remaining = NoteRepository::new(&fx.db)
            .get_all(&NoteFilter::default())
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].entity_id(), fx.good_id);
    }

    #[test]
    fn skipped_when_gate_invalid() {
        let codec = codec_with(EncryptionKey::generate());
        let fx = fixture(&codec);
        let invalid = FieldCodec::new(Arc::new(EncryptionGate::new()));

        assert_eq!(sweep_notes(&fx.db, &invalid, true).unwrap(), None);
        let remaining = NoteRepository::new(&fx.db)
            .get_all(&NoteFilter::default())
            .unwrap();
        assert_eq!(remaining.len(), 3);
    }
}
