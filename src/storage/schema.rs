// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Schema initialization
//!
//! Both tables are created with `CREATE TABLE IF NOT EXISTS` on every new
//! connection. There is no version tracking: the column layout is fixed and
//! has to stay byte-compatible with database files copied in by a restore.

use crate::error::Result;
use sqlx::SqliteConnection;

/// Books table: one row per book in the reading log
pub(crate) const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT,
    genre TEXT,
    status TEXT NOT NULL,            -- READ / WANT_TO_READ
    dateAdded TEXT NOT NULL,         -- ISO 8601 date (YYYY-MM-DD)
    dateRead TEXT,                   -- ISO 8601 date, NULL unless READ
    rating INTEGER,                  -- 0 (unrated) .. 5
    comment TEXT,
    coverImagePath TEXT,             -- file name inside the covers directory
    favorite INTEGER NOT NULL DEFAULT 0
)
"#;

/// Goals table: one row per reading goal
pub(crate) const CREATE_GOALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT,
    type TEXT NOT NULL,              -- MONTHLY / YEARLY / TOTAL
    targetValue INTEGER NOT NULL,
    year INTEGER,
    month INTEGER,
    dateAdded TEXT NOT NULL
)
"#;

/// Create both tables if they do not exist yet
pub async fn initialize_schema(conn: &mut SqliteConnection) -> Result<()> {
    tracing::debug!("creating table 'books' if missing");
    sqlx::query(CREATE_BOOKS_TABLE).execute(&mut *conn).await?;

    tracing::debug!("creating table 'goals' if missing");
    sqlx::query(CREATE_GOALS_TABLE).execute(&mut *conn).await?;

    tracing::info!("database schema initialized");
    Ok(())
}
