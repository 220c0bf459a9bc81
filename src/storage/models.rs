// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database models for Book Diary
//!
//! # SQLite Adaptations
//! - Enums stored as their upper-case names (`READ`, `MONTHLY`, ...)
//! - Dates stored as TEXT in ISO 8601 format (`YYYY-MM-DD`)
//! - Booleans stored as INTEGER 0/1
//!
//! # Identity
//! Records start out transient with `id == 0`. Two transient records compare
//! by every field; once either side has an id, records compare by id alone.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::DiaryError;

// ============================================================================
// ENUMS
// ============================================================================

/// Reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    Read,
    WantToRead,
}

impl ReadingStatus {
    /// Text stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Read => "READ",
            ReadingStatus::WantToRead => "WANT_TO_READ",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReadingStatus::Read => "Read",
            ReadingStatus::WantToRead => "Want to read",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(ReadingStatus::Read),
            "WANT_TO_READ" => Ok(ReadingStatus::WantToRead),
            other => Err(DiaryError::invalid_data(format!(
                "Unknown reading status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Period a reading goal counts books over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    Monthly,
    Yearly,
    Total,
}

impl GoalType {
    /// Text stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Monthly => "MONTHLY",
            GoalType::Yearly => "YEARLY",
            GoalType::Total => "TOTAL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GoalType::Monthly => "Monthly",
            GoalType::Yearly => "Yearly",
            GoalType::Total => "Total",
        }
    }
}

impl FromStr for GoalType {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MONTHLY" => Ok(GoalType::Monthly),
            "YEARLY" => Ok(GoalType::Yearly),
            "TOTAL" => Ok(GoalType::Total),
            other => Err(DiaryError::invalid_data(format!("Unknown goal type '{}'", other))),
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// BOOK
// ============================================================================

/// Book entity - one entry in the reading log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Primary key, 0 until the book has been added
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: ReadingStatus,
    pub date_added: NaiveDate,
    /// Set when `status` is `Read`
    pub date_read: Option<NaiveDate>,
    /// 0 = unrated, otherwise 1..=5
    pub rating: i32,
    pub comment: Option<String>,
    /// File name inside the covers directory, not a path
    pub cover_image_path: Option<String>,
    pub favorite: bool,
}

impl Book {
    /// Create a transient book added today
    pub fn new(
        title: impl Into<String>,
        author: Option<String>,
        genre: Option<String>,
        status: ReadingStatus,
        cover_image_path: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            author,
            genre,
            status,
            date_added: Local::now().date_naive(),
            date_read: None,
            rating: 0,
            comment: None,
            cover_image_path,
            favorite: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Move the book to the read shelf
    pub fn mark_read(&mut self, date_read: NaiveDate) {
        self.status = ReadingStatus::Read;
        self.date_read = Some(date_read);
    }

    /// Move the book back to the wishlist, dropping read-only details
    pub fn mark_want_to_read(&mut self) {
        self.status = ReadingStatus::WantToRead;
        self.date_read = None;
        self.rating = 0;
        self.favorite = false;
    }

    /// Resolve the cover filename against the covers directory
    pub fn cover_path(&self, covers_dir: &Path) -> Option<PathBuf> {
        self.cover_image_path
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| covers_dir.join(name))
    }

    /// Compare every field except the id
    pub fn fields_eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.author == other.author
            && self.genre == other.genre
            && self.status == other.status
            && self.date_added == other.date_added
            && self.date_read == other.date_read
            && self.rating == other.rating
            && self.comment == other.comment
            && self.cover_image_path == other.cover_image_path
            && self.favorite == other.favorite
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        if self.id == 0 && other.id == 0 {
            return self.fields_eq(other);
        }
        self.id != 0 && self.id == other.id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.id != 0 {
            self.id.hash(state);
            return;
        }
        self.title.hash(state);
        self.author.hash(state);
        self.genre.hash(state);
        self.status.hash(state);
        self.date_added.hash(state);
        self.date_read.hash(state);
        self.rating.hash(state);
        self.comment.hash(state);
        self.cover_image_path.hash(state);
        self.favorite.hash(state);
    }
}

// ============================================================================
// GOAL
// ============================================================================

/// Reading goal - a target number of books for a period
///
/// `goal_type` and `date_added` are optional so that a half-filled form can be
/// represented; the goal repository refuses to write either one missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Primary key, 0 until the goal has been added
    pub id: i64,
    pub description: Option<String>,
    pub goal_type: Option<GoalType>,
    pub target_value: i32,
    /// Required for monthly and yearly goals
    pub year: Option<i32>,
    /// 1..=12, monthly goals only
    pub month: Option<u32>,
    pub date_added: Option<NaiveDate>,
}

impl Goal {
    /// Create a transient goal added today
    pub fn new(
        description: Option<String>,
        goal_type: GoalType,
        target_value: i32,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Self {
        Self {
            id: 0,
            description,
            goal_type: Some(goal_type),
            target_value,
            year,
            month,
            date_added: Some(Local::now().date_naive()),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Compare every field except the id
    pub fn fields_eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.goal_type == other.goal_type
            && self.target_value == other.target_value
            && self.year == other.year
            && self.month == other.month
            && self.date_added == other.date_added
    }
}

impl PartialEq for Goal {
    fn eq(&self, other: &Self) -> bool {
        if self.id == 0 && other.id == 0 {
            return self.fields_eq(other);
        }
        self.id != 0 && self.id == other.id
    }
}

impl Eq for Goal {}

impl Hash for Goal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.id != 0 {
            self.id.hash(state);
            return;
        }
        self.description.hash(state);
        self.goal_type.hash(state);
        self.target_value.hash(state);
        self.year.hash(state);
        self.month.hash(state);
        self.date_added.hash(state);
    }
}
