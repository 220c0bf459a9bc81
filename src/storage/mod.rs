// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database storage and models
//!
//! This module handles all database operations using SQLite through sqlx.
//!
//! # Database Schema
//! - books: one row per book (wishlist or read)
//! - goals: reading goals per month, per year or overall
//!
//! # Usage Example
//! ```no_run
//! use book_diary::storage::{BookRepository, Database, SqliteBookRepository};
//! use book_diary::storage::models::{Book, ReadingStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./book_diary.db").await?;
//! let books = SqliteBookRepository::new(db);
//!
//! let mut hobbit = Book::new("The Hobbit", Some("J.R.R. Tolkien".into()), None,
//!     ReadingStatus::WantToRead, None);
//! let id = books.add(&mut hobbit).await?;
//!
//! let found = books.search("tolkien").await?;
//! assert_eq!(found[0].id, id);
//! # Ok(())
//! # }
//! ```

pub mod books;
pub mod database;
pub mod goals;
pub mod helpers;
pub mod models;
pub mod progress;
pub mod schema;
pub mod traits;

// Re-export commonly used types
pub use books::SqliteBookRepository;
pub use database::{Database, StoreConnection};
pub use goals::SqliteGoalRepository;
pub use models::{Book, Goal, GoalType, ReadingStatus};
pub use progress::{goal_progress, progress_for_all, GoalProgress};
pub use traits::{BookRepository, GoalRepository};
