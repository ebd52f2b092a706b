// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Background Activity Log Writer
//!
//! Handlers never write audit rows themselves. They hand entries to an
//! [`AuditLogger`], which pushes them onto a bounded queue without waiting,
//! and a single [`AuditWorker`] task drains that queue into the
//! `activity_logs` table.
//!
//! ## Back-pressure
//!
//! When the queue is full the entry is dropped and a warning is logged. The
//! request that produced it is never slowed down or failed by auditing.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`, following the same pattern as
//! the other background tasks. On cancellation the worker writes whatever is
//! still queued before it returns.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{ActivityLog, AuditRepository, NotesDatabase};

/// Default queue capacity.
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Cheap, cloneable handle for recording activity.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<ActivityLog>,
}

impl AuditLogger {
    /// Create a logger and the receiving end for its worker.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ActivityLog>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue an entry without blocking. Never fails the caller.
    pub fn record(&self, entry: ActivityLog) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(
                    action = %entry.action,
                    entity_type = %entry.entity_type,
                    "Audit queue full, dropping activity log entry"
                );
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(
                    action = %entry.action,
                    entity_type = %entry.entity_type,
                    "Audit worker stopped, dropping activity log entry"
                );
            }
        }
    }
}

/// Drains the audit queue into the database.
pub struct AuditWorker {
    db: Arc<NotesDatabase>,
    rx: mpsc::Receiver<ActivityLog>,
}

impl AuditWorker {
    pub fn new(db: Arc<NotesDatabase>, rx: mpsc::Receiver<ActivityLog>) -> Self {
        Self { db, rx }
    }

    /// Run until the token is cancelled or every logger is dropped.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(worker.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Audit worker starting");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    let flushed = self.flush();
                    info!(flushed, "Audit worker shutting down");
                    return;
                }
                entry = self.rx.recv() => match entry {
                    Some(entry) => self.write(&entry),
                    None => {
                        info!("Audit queue closed, worker exiting");
                        return;
                    }
                },
            }
        }
    }

    /// Write everything currently queued. Returns how many entries were taken.
    fn flush(&mut self) -> usize {
        let mut taken = 0;
        while let Ok(entry) = self.rx.try_recv() {
            self.write(&entry);
            taken += 1;
        }
        taken
    }

    fn write(&self, entry: &ActivityLog) {
        match AuditRepository::new(&self.db).append(entry) {
            Ok(id) => debug!(id, action = %entry.action, "Activity logged"),
            Err(e) => warn!(
                error = %e,
                action = %entry.action,
                entity_type = %entry.entity_type,
                "Failed to write activity log entry"
            ),
        }
    }
}
