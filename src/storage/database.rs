// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database connection management
//!
//! [`Database`] resolves the configured [`StorageTarget`] to live connections
//! and guarantees the schema exists before a repository sees a connection.
//!
//! # Connection Lifetimes
//! - **In-memory**: one connection is opened and initialized when the
//!   `Database` is built and kept for as long as any clone of it is alive.
//!   Closing it would destroy the data, so [`StoreConnection::release`] only
//!   unlocks it. Callers are serialized by a mutex.
//! - **File**: every [`Database::acquire`] opens a fresh connection and runs
//!   the schema initializer on it. Opening is serialized so two first callers
//!   never initialize the schema at the same time. The caller closes the
//!   connection through [`StoreConnection::release`].
//!
//! # SQLite Configuration
//! - Rollback journal (no WAL), so the database is always one self-contained
//!   file that a backup can copy
//! - Busy timeout of 30 seconds for overlapping file connections

use crate::config::{StorageTarget, StoreConfig};
use crate::error::{DiaryError, Result};
use crate::storage::schema;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection manager - the single place that decides where data lives
///
/// Cheap to clone; clones share the in-memory connection and the open lock.
#[derive(Clone)]
pub struct Database {
    target: StorageTarget,
    /// Retained connection, only set for in-memory databases
    shared: Option<Arc<Mutex<SqliteConnection>>>,
    /// Serializes opening + initializing file connections
    open_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Build a connection manager for the configured storage target
    ///
    /// For in-memory targets the retained connection is opened and
    /// initialized here; an error means the diary cannot run at all.
    ///
    /// # Errors
    /// Returns error if:
    /// - The in-memory connection can't be opened or initialized
    /// - The parent directory of a database file can't be created
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let shared = match &config.target {
            StorageTarget::InMemory => {
                tracing::debug!("opening retained in-memory connection");
                let mut conn = Self::connect_options(&config.target)?.connect().await?;
                schema::initialize_schema(&mut conn).await?;
                tracing::info!("in-memory database initialized");
                Some(Arc::new(Mutex::new(conn)))
            }
            StorageTarget::File(path) => {
                Self::ensure_parent_dir(path)?;
                None
            }
        };

        Ok(Self {
            target: config.target.clone(),
            shared,
            open_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a file-backed database at `database_path`
    ///
    /// The file itself is created on the first [`acquire`](Self::acquire).
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        Self::open(&StoreConfig::file(database_path)).await
    }

    /// Create in-memory database for testing
    pub async fn new_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory()).await
    }

    fn connect_options(target: &StorageTarget) -> Result<SqliteConnectOptions> {
        let options = match target {
            StorageTarget::InMemory => SqliteConnectOptions::from_str("sqlite::memory:")?,
            StorageTarget::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .busy_timeout(BUSY_TIMEOUT),
        };

        Ok(options.disable_statement_logging())
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("created database directory {}", parent.display());
            }
        }
        Ok(())
    }

    /// Resolve a connection for one repository operation
    ///
    /// In-memory databases hand out the retained connection (waiting for any
    /// other holder to release it). File databases open and initialize a new
    /// connection.
    ///
    /// For an in-memory database the returned connection holds the only lock
    /// on the store until [`StoreConnection::release`]. A task that calls a
    /// repository method before releasing it waits on itself forever.
    pub async fn acquire(&self) -> Result<StoreConnection<'_>> {
        match (&self.target, &self.shared) {
            (StorageTarget::InMemory, Some(shared)) => {
                Ok(StoreConnection::Shared(shared.lock().await))
            }
            (StorageTarget::File(path), _) => {
                let _guard = self.open_lock.lock().await;
                tracing::debug!("opening database file {}", path.display());

                let mut conn = Self::connect_options(&self.target)?
                    .connect()
                    .await
                    .map_err(|e| {
                        tracing::error!("failed to open database file {}: {}", path.display(), e);
                        DiaryError::from(e)
                    })?;

                if let Err(e) = schema::initialize_schema(&mut conn).await {
                    tracing::error!("failed to initialize schema in {}: {}", path.display(), e);
                    let _ = conn.close().await;
                    return Err(e);
                }

                Ok(StoreConnection::Owned(conn))
            }
            (StorageTarget::InMemory, None) => Err(DiaryError::InvalidState(
                "In-memory connection was not initialized".to_string(),
            )),
        }
    }

    /// Configured storage target
    pub fn target(&self) -> &StorageTarget {
        &self.target
    }

    /// Get database file path
    ///
    /// Returns `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            StorageTarget::File(path) => Some(path.as_path()),
            StorageTarget::InMemory => None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.target, StorageTarget::InMemory)
    }

    /// Check database integrity
    ///
    /// Runs SQLite integrity check and returns true if database is okay.
    /// Useful after a restore has replaced the database file.
    pub async fn check_integrity(&self) -> Result<bool> {
        let mut conn = self.acquire().await?;
        let result: std::result::Result<String, sqlx::Error> =
            sqlx::query_scalar("PRAGMA integrity_check")
                .fetch_one(&mut *conn)
                .await;
        conn.release().await;

        Ok(result? == "ok")
    }

    /// Export database to file
    ///
    /// Copies the database file to `output_path` for backups. The open lock
    /// is held while copying, so no new connection is opened mid-copy.
    /// Connections acquired earlier are not waited for: call this only when
    /// no repository operation on the same file is in flight.
    ///
    /// # Errors
    /// Returns error if:
    /// - The database is in-memory (there is no file to copy)
    /// - File copy fails
    pub async fn export<P: AsRef<Path>>(&self, output_path: P) -> Result<PathBuf> {
        let source_path = self.path().ok_or_else(|| {
            DiaryError::InvalidState("Cannot export in-memory database".to_string())
        })?;

        let _guard = self.open_lock.lock().await;
        let output_path = output_path.as_ref();
        std::fs::copy(source_path, output_path)?;
        tracing::info!(
            "exported database {} to {}",
            source_path.display(),
            output_path.display()
        );

        Ok(output_path.to_path_buf())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.target)
            .field("shared", &self.shared.is_some())
            .finish()
    }
}

/// A connection handed to one repository operation
///
/// Derefs to [`SqliteConnection`], so it can be passed straight to sqlx as
/// `&mut *conn`.
pub enum StoreConnection<'a> {
    /// The retained in-memory connection; never closed by callers
    Shared(MutexGuard<'a, SqliteConnection>),
    /// A connection opened for this operation; closed on release
    Owned(SqliteConnection),
}

impl StoreConnection<'_> {
    /// Whether this is the retained in-memory connection
    pub fn is_shared(&self) -> bool {
        matches!(self, StoreConnection::Shared(_))
    }

    /// Give the connection back: close it if owned, unlock it if shared
    ///
    /// Close failures are logged and swallowed; the operation that used the
    /// connection has already produced its result.
    pub async fn release(self) {
        match self {
            StoreConnection::Shared(guard) => drop(guard),
            StoreConnection::Owned(conn) => {
                if let Err(e) = conn.close().await {
                    tracing::warn!("failed to close database connection: {}", e);
                }
            }
        }
    }
}

impl Deref for StoreConnection<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            StoreConnection::Shared(guard) => &**guard,
            StoreConnection::Owned(conn) => conn,
        }
    }
}

impl DerefMut for StoreConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            StoreConnection::Shared(guard) => &mut **guard,
            StoreConnection::Owned(conn) => conn,
        }
    }
}
