//! Book Diary persistence core
//!
//! Stores the books and reading goals of a personal reading log in SQLite.
//!
//! - [`config`] resolves where the database lives
//! - [`storage::Database`] hands out connections for that location
//! - [`storage::BookRepository`] and [`storage::GoalRepository`] are the
//!   record stores the rest of an application talks to

pub mod config;
pub mod error;
pub mod storage;

pub use config::{StorageTarget, StoreConfig};
pub use error::{DiaryError, Result};
