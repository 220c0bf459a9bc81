// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Repository traits for books and goals
//!
//! Callers (the CLI, goal progress) depend on these traits, never on the
//! SQLite types, so a different store can be dropped in without touching
//! them. Methods return `impl Future + Send` so the futures can be spawned
//! on a multi-threaded runtime.

use crate::error::Result;
use crate::storage::models::{Book, Goal, ReadingStatus};
use std::future::Future;

/// Durable storage of [`Book`] records
pub trait BookRepository: Send + Sync {
    /// Insert a new book and write the generated id back into `book`
    ///
    /// Fails if no row was inserted or no id was generated.
    fn add(&self, book: &mut Book) -> impl Future<Output = Result<i64>> + Send;

    /// Overwrite every stored field of the book with `book.id`
    ///
    /// An id with no stored row is not an error; nothing changes.
    fn update(&self, book: &Book) -> impl Future<Output = Result<()>> + Send;

    /// Remove the book with `id`, if any
    fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Book>>> + Send;

    /// All books, most recently added first
    fn get_all(&self) -> impl Future<Output = Result<Vec<Book>>> + Send;

    /// Books with `status`, most recently added first
    fn get_by_status(
        &self,
        status: ReadingStatus,
    ) -> impl Future<Output = Result<Vec<Book>>> + Send;

    /// Favorite books, most recently added first
    fn get_favorites(&self) -> impl Future<Output = Result<Vec<Book>>> + Send;

    /// Case-insensitive substring match on title or author, ordered by title
    ///
    /// A blank term returns the same result as [`get_all`](Self::get_all).
    fn search(&self, term: &str) -> impl Future<Output = Result<Vec<Book>>> + Send;

    /// Distinct non-empty genres, alphabetical ignoring case
    fn distinct_genres(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Number of books with status `Read`
    fn total_read_count(&self) -> impl Future<Output = Result<i64>> + Send;

    /// Number of books read in `year`
    fn read_count_by_year(&self, year: i32) -> impl Future<Output = Result<i64>> + Send;

    /// Number of books read in `month` (1..=12) of `year`
    fn read_count_by_month_and_year(
        &self,
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Number of stored books regardless of status
    fn count(&self) -> impl Future<Output = Result<i64>> + Send;
}

/// Durable storage of [`Goal`] records
pub trait GoalRepository: Send + Sync {
    /// Insert a new goal and write the generated id back into `goal`
    ///
    /// Rejects a goal without a type or creation date before touching the
    /// store.
    fn add(&self, goal: &mut Goal) -> impl Future<Output = Result<i64>> + Send;

    /// Overwrite every stored field of the goal with `goal.id`
    ///
    /// Same validation as [`add`](Self::add). Fails with
    /// [`RecordNotFound`](crate::error::DiaryError::RecordNotFound) when no
    /// goal has that id.
    fn update(&self, goal: &Goal) -> impl Future<Output = Result<()>> + Send;

    /// Remove the goal with `id`, if any
    fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Goal>>> + Send;

    /// All goals, most recently added first
    fn get_all(&self) -> impl Future<Output = Result<Vec<Goal>>> + Send;

    fn count(&self) -> impl Future<Output = Result<i64>> + Send;
}
