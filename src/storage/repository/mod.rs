// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the notes database.
//!
//! Each repository provides CRUD operations for one entity type and works
//! only on [`Sealed`](crate::encryption::Sealed) values, so plaintext never
//! reaches it.

pub mod categories;
pub mod notes;

pub use categories::{CategoryRepository, CATEGORY_NOT_FOUND};
pub use notes::{NoteFilter, NoteRepository, NOTE_NOT_FOUND};
