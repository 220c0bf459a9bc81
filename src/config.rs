// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Storage target configuration
//!
//! A single connection string decides where the diary lives:
//! 1. `BOOK_DIARY_DB_URL` environment variable if set and non-blank
//! 2. `book_diary.db` in the working directory otherwise
//!
//! # Accepted connection strings
//! - `sqlite::memory:` or `:memory:` - in-memory database (tests)
//! - `sqlite://<path>` or `sqlite:<path>` - database file at `<path>`
//! - `<path>` - database file at `<path>`

use crate::error::{DiaryError, Result};
use std::path::{Path, PathBuf};

/// Environment variable holding the connection string
pub const DB_URL_ENV: &str = "BOOK_DIARY_DB_URL";

/// Database file used when nothing is configured
pub const DEFAULT_DB_FILE: &str = "book_diary.db";

/// Directory holding cover images, next to the database file
pub const COVERS_DIR_NAME: &str = "covers";

const IN_MEMORY_URLS: [&str; 2] = ["sqlite::memory:", ":memory:"];

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// One process-lifetime connection; data disappears when it closes
    InMemory,
    /// A database file; every request opens its own connection
    File(PathBuf),
}

/// Storage configuration resolved by the composition root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub target: StorageTarget,
}

impl StoreConfig {
    /// In-memory configuration
    pub fn in_memory() -> Self {
        Self {
            target: StorageTarget::InMemory,
        }
    }

    /// File-backed configuration at `path`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            target: StorageTarget::File(path.as_ref().to_path_buf()),
        }
    }

    /// Parse a connection string
    ///
    /// Blank input resolves to the default database file.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();

        if url.is_empty() {
            return Ok(Self::default());
        }

        if IN_MEMORY_URLS.contains(&url) {
            return Ok(Self::in_memory());
        }

        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if path.is_empty() {
            return Err(DiaryError::invalid_input(format!(
                "Connection string '{}' has no database path",
                url
            )));
        }

        Ok(Self::file(path))
    }

    /// Read the connection string from `BOOK_DIARY_DB_URL`
    pub fn from_env() -> Result<Self> {
        match std::env::var(DB_URL_ENV) {
            Ok(url) => Self::from_url(&url),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Database file path, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        match &self.target {
            StorageTarget::File(path) => Some(path.as_path()),
            StorageTarget::InMemory => None,
        }
    }

    /// Directory that cover image filenames are resolved against
    pub fn covers_dir(&self) -> PathBuf {
        let base = self
            .db_path()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(COVERS_DIR_NAME)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::file(DEFAULT_DB_FILE)
    }
}
