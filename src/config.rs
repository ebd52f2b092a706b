// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`ServerConfig`] read from
//! them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding `settings.json` and `notes.redb` | `.` |
//! | `SETTINGS_FILE` | Explicit path of the settings record | `$DATA_DIR/settings.json` |
//! | `HOST` | Server bind address | `127.0.0.1` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `AUDIT_QUEUE_CAPACITY` | Bounded audit queue size | `1024` |
//! | `PURGE_UNREADABLE_NOTES` | Delete notes that fail decryption at startup | `false` |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::warn;

use crate::audit_writer::DEFAULT_AUDIT_QUEUE_CAPACITY;
use crate::storage::paths::DATA_ROOT;
use crate::storage::StoragePaths;

/// Directory for the settings record and the database.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Overrides the settings record location.
pub const SETTINGS_FILE_ENV: &str = "SETTINGS_FILE";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// `json` for machine-readable logs, anything else for human-readable ones.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const AUDIT_QUEUE_CAPACITY_ENV: &str = "AUDIT_QUEUE_CAPACITY";

/// When `true`, notes that fail strict decryption are deleted at startup
/// instead of only being reported.
pub const PURGE_UNREADABLE_NOTES_ENV: &str = "PURGE_UNREADABLE_NOTES";

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub paths: StoragePaths,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub audit_queue_capacity: usize,
    pub purge_unreadable_notes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            paths: StoragePaths::default(),
            bind_addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
            log_format: LogFormat::Pretty,
            audit_queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
            purge_unreadable_notes: false,
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Unparseable values fall back to their
    /// defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string());
        let mut paths = StoragePaths::new(data_dir);
        if let Some(settings_file) = lookup(SETTINGS_FILE_ENV).filter(|s| !s.trim().is_empty()) {
            paths = paths.with_settings_file(settings_file);
        }

        let host = parse_or(&lookup, HOST_ENV, DEFAULT_HOST);
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT);

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            paths,
            bind_addr: SocketAddr::new(host, port),
            log_format,
            audit_queue_capacity: parse_or(
                &lookup,
                AUDIT_QUEUE_CAPACITY_ENV,
                defaults.audit_queue_capacity,
            )
            .max(1),
            purge_unreadable_notes: parse_or(&lookup, PURGE_UNREADABLE_NOTES_ENV, false),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, "Ignoring unparseable environment variable");
                default
            }
        },
        None => default,
    }
}
