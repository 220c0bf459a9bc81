// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! SQLite-backed book repository
//!
//! Every public operation acquires a connection from [`Database`], runs its
//! statement(s) and releases the connection before returning, whether or
//! not the statement succeeded.

use crate::error::{DiaryError, Result};
use crate::storage::database::Database;
use crate::storage::helpers::{
    decode_date, decode_flag, decode_optional_date, encode_date, encode_flag, month_pattern,
    year_pattern,
};
use crate::storage::models::{Book, ReadingStatus};
use crate::storage::traits::BookRepository;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const SELECT_BOOK_COLUMNS: &str = r#"
    SELECT id, title, author, genre, status, dateAdded, dateRead,
           rating, comment, coverImagePath, favorite
    FROM books
"#;

/// SQLite implementation of [`BookRepository`]
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    db: Database,
}

impl SqliteBookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    async fn insert(conn: &mut SqliteConnection, book: &Book) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (
                title, author, genre, status, dateAdded, dateRead,
                rating, comment, coverImagePath, favorite
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.status.as_str())
        .bind(encode_date(book.date_added))
        .bind(book.date_read.map(encode_date))
        .bind(book.rating)
        .bind(&book.comment)
        .bind(&book.cover_image_path)
        .bind(encode_flag(book.favorite))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DiaryError::NoRowsAffected(format!(
                "Inserting book '{}' did not create a row",
                book.title
            )));
        }

        let id = result.last_insert_rowid();
        if id <= 0 {
            return Err(DiaryError::GeneratedKeyMissing(format!(
                "No id was generated for book '{}'",
                book.title
            )));
        }

        Ok(id)
    }

    async fn overwrite(conn: &mut SqliteConnection, book: &Book) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = ?, author = ?, genre = ?, status = ?, dateAdded = ?,
                dateRead = ?, rating = ?, comment = ?, coverImagePath = ?,
                favorite = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.status.as_str())
        .bind(encode_date(book.date_added))
        .bind(book.date_read.map(encode_date))
        .bind(book.rating)
        .bind(&book.comment)
        .bind(&book.cover_image_path)
        .bind(encode_flag(book.favorite))
        .bind(book.id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove(conn: &mut SqliteConnection, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> Result<Option<Book>> {
        let sql = format!("{} WHERE id = ?", SELECT_BOOK_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Book>> {
        let sql = format!("{} ORDER BY dateAdded DESC", SELECT_BOOK_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn fetch_by_status(
        conn: &mut SqliteConnection,
        status: ReadingStatus,
    ) -> Result<Vec<Book>> {
        let sql = format!("{} WHERE status = ? ORDER BY dateAdded DESC", SELECT_BOOK_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn fetch_favorites(conn: &mut SqliteConnection) -> Result<Vec<Book>> {
        let sql = format!("{} WHERE favorite = 1 ORDER BY dateAdded DESC", SELECT_BOOK_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn fetch_genres(conn: &mut SqliteConnection) -> Result<Vec<String>> {
        let genres: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT genre FROM books
            WHERE genre IS NOT NULL AND genre != ''
            ORDER BY genre COLLATE NOCASE ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(genres)
    }

    async fn count_read(conn: &mut SqliteConnection, date_pattern: Option<String>) -> Result<i64> {
        let count: i64 = match date_pattern {
            Some(pattern) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM books WHERE status = ? AND dateRead LIKE ?",
                )
                .bind(ReadingStatus::Read.as_str())
                .bind(pattern)
                .fetch_one(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE status = ?")
                    .bind(ReadingStatus::Read.as_str())
                    .fetch_one(&mut *conn)
                    .await?
            }
        };

        Ok(count)
    }

    async fn count_all(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    async fn read_count(&self, date_pattern: Option<String>) -> Result<i64> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::count_read(&mut conn, date_pattern).await;
        conn.release().await;
        outcome
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn book_from_row(row: &SqliteRow) -> Result<Book> {
    let status: String = row.try_get("status")?;
    let date_added: String = row.try_get("dateAdded")?;
    let rating: Option<i32> = row.try_get("rating")?;
    let favorite: i64 = row.try_get("favorite")?;

    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        genre: row.try_get("genre")?,
        status: status.parse()?,
        date_added: decode_date("dateAdded", &date_added)?,
        date_read: decode_optional_date("dateRead", row.try_get("dateRead")?)?,
        rating: rating.unwrap_or(0),
        comment: row.try_get("comment")?,
        cover_image_path: row.try_get("coverImagePath")?,
        favorite: decode_flag(favorite),
    })
}

/// Case-insensitive substring match on title or author, sorted by title
fn filter_by_term(books: Vec<Book>, term: &str) -> Vec<Book> {
    let needle = term.to_lowercase();
    let mut matches: Vec<Book> = books
        .into_iter()
        .filter(|book| {
            book.title.to_lowercase().contains(&needle)
                || book
                    .author
                    .as_deref()
                    .map_or(false, |author| author.to_lowercase().contains(&needle))
        })
        .collect();

    matches.sort_by_cached_key(|book| book.title.to_lowercase());
    matches
}

impl BookRepository for SqliteBookRepository {
    async fn add(&self, book: &mut Book) -> Result<i64> {
        tracing::debug!("adding book '{}'", book.title);

        let mut conn = self.db.acquire().await?;
        let outcome = Self::insert(&mut conn, book).await;
        conn.release().await;

        match outcome {
            Ok(id) => {
                book.id = id;
                tracing::info!("added book '{}' with id {}", book.title, id);
                Ok(id)
            }
            Err(e) => {
                tracing::error!("failed to add book '{}': {}", book.title, e);
                Err(e)
            }
        }
    }

    async fn update(&self, book: &Book) -> Result<()> {
        tracing::debug!("updating book {}", book.id);

        let mut conn = self.db.acquire().await?;
        let outcome = Self::overwrite(&mut conn, book).await;
        conn.release().await;

        match outcome {
            Ok(0) => {
                tracing::warn!("update of book {} affected no rows", book.id);
                Ok(())
            }
            Ok(_) => {
                tracing::info!("updated book {}", book.id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to update book {}: {}", book.id, e);
                Err(e)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        tracing::debug!("deleting book {}", id);

        let mut conn = self.db.acquire().await?;
        let outcome = Self::remove(&mut conn, id).await;
        conn.release().await;

        match outcome? {
            0 => tracing::warn!("delete of book {} affected no rows", id),
            _ => tracing::info!("deleted book {}", id),
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_one(&mut conn, id).await;
        conn.release().await;
        outcome
    }

    async fn get_all(&self) -> Result<Vec<Book>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_all(&mut conn).await;
        conn.release().await;
        outcome
    }

    async fn get_by_status(&self, status: ReadingStatus) -> Result<Vec<Book>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_by_status(&mut conn, status).await;
        conn.release().await;
        outcome
    }

    async fn get_favorites(&self) -> Result<Vec<Book>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_favorites(&mut conn).await;
        conn.release().await;
        outcome
    }

    async fn search(&self, term: &str) -> Result<Vec<Book>> {
        let books = self.get_all().await?;

        // Blank check only; surrounding spaces stay part of the match
        if term.trim().is_empty() {
            return Ok(books);
        }

        Ok(filter_by_term(books, term))
    }

    async fn distinct_genres(&self) -> Result<Vec<String>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_genres(&mut conn).await;
        conn.release().await;
        outcome
    }

    async fn total_read_count(&self) -> Result<i64> {
        self.read_count(None).await
    }

    async fn read_count_by_year(&self, year: i32) -> Result<i64> {
        self.read_count(Some(year_pattern(year))).await
    }

    async fn read_count_by_month_and_year(&self, year: i32, month: u32) -> Result<i64> {
        self.read_count(Some(month_pattern(year, month))).await
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::count_all(&mut conn).await;
        conn.release().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> SqliteBookRepository {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        SqliteBookRepository::new(db)
    }

    fn book(title: &str, author: Option<&str>, added: NaiveDate) -> Book {
        let mut book = Book::new(
            title,
            author.map(str::to_string),
            None,
            ReadingStatus::WantToRead,
            None,
        );
        book.date_added = added;
        book
    }

    fn read_book(title: &str, read_on: NaiveDate) -> Book {
        let mut book = book(title, None, read_on);
        book.mark_read(read_on);
        book
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let repo = setup().await;

        let mut original = Book::new(
            "Dune",
            Some("Frank Herbert".into()),
            Some("Science Fiction".into()),
            ReadingStatus::Read,
            Some("dune.jpg".into()),
        );
        original.date_added = date(2024, 1, 1);
        original.date_read = Some(date(2024, 1, 20));
        original.rating = 5;
        original.comment = Some("Spice".into());
        original.favorite = true;

        let id = repo.add(&mut original).await.expect("Failed to add book");
        assert!(id > 0);
        assert_eq!(original.id, id);

        let loaded = repo.get_by_id(id).await.unwrap().expect("Book not found");
        assert_eq!(loaded.id, id);
        assert!(loaded.fields_eq(&original));
    }

    #[tokio::test]
    async fn test_add_ignores_incoming_id() {
        let repo = setup().await;

        let mut first = book("First", None, date(2024, 1, 1));
        first.id = 999;
        let id = repo.add(&mut first).await.unwrap();
        assert_ne!(id, 999);
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unset_optional_fields_round_trip_as_none() {
        let repo = setup().await;

        let mut wish = book("Wishlist", None, date(2024, 3, 3));
        let id = repo.add(&mut wish).await.unwrap();

        let loaded = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.author, None);
        assert_eq!(loaded.date_read, None);
        assert_eq!(loaded.rating, 0);
        assert!(!loaded.favorite);
    }

    #[tokio::test]
    async fn test_update_persists_fields() {
        let repo = setup().await;

        let mut dune = book("Dune", Some("Frank Herbert"), date(2024, 1, 1));
        repo.add(&mut dune).await.unwrap();

        dune.mark_read(date(2024, 2, 10));
        dune.rating = 4;
        dune.comment = Some("Long".into());
        repo.update(&dune).await.expect("Failed to update");

        let loaded = repo.get_by_id(dune.id).await.unwrap().unwrap();
        assert!(loaded.fields_eq(&dune));
        assert_eq!(loaded.status, ReadingStatus::Read);
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_is_a_no_op() {
        let repo = setup().await;
        repo.add(&mut book("Kept", None, date(2024, 1, 1))).await.unwrap();

        let mut ghost = book("Ghost", None, date(2024, 1, 1));
        ghost.id = 4242;
        repo.update(&ghost).await.expect("Update of unknown id must not fail");

        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get_by_id(4242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_book() {
        let repo = setup().await;

        let mut doomed = book("Doomed", None, date(2024, 1, 1));
        let id = repo.add(&mut doomed).await.unwrap();
        repo.delete(id).await.expect("Failed to delete");

        assert!(repo.get_by_id(id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);

        // Deleting again is tolerated
        repo.delete(id).await.expect("Second delete must not fail");
    }

    #[tokio::test]
    async fn test_get_all_orders_by_date_added_desc() {
        let repo = setup().await;

        repo.add(&mut book("Middle", None, date(2024, 2, 1))).await.unwrap();
        repo.add(&mut book("Oldest", None, date(2023, 12, 31))).await.unwrap();
        repo.add(&mut book("Newest", None, date(2024, 3, 1))).await.unwrap();

        let titles: Vec<String> = repo
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
    }

    #[tokio::test]
    async fn test_get_by_status_and_favorites() {
        let repo = setup().await;

        let mut read = read_book("Read one", date(2024, 1, 5));
        read.favorite = true;
        repo.add(&mut read).await.unwrap();
        repo.add(&mut read_book("Read two", date(2024, 1, 6))).await.unwrap();
        repo.add(&mut book("Wish", None, date(2024, 1, 7))).await.unwrap();

        let read_books = repo.get_by_status(ReadingStatus::Read).await.unwrap();
        assert_eq!(read_books.len(), 2);
        assert!(read_books.iter().all(|b| b.status == ReadingStatus::Read));
        assert_eq!(read_books[0].title, "Read two");

        let wishlist = repo.get_by_status(ReadingStatus::WantToRead).await.unwrap();
        assert_eq!(wishlist.len(), 1);

        let favorites = repo.get_favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].title, "Read one");
    }

    #[tokio::test]
    async fn test_search_matches_title_or_author_sorted_by_title() {
        let repo = setup().await;

        repo.add(&mut book("The Hobbit", Some("J.R.R. Tolkien"), date(2024, 1, 1)))
            .await
            .unwrap();
        repo.add(&mut book("Dune", Some("Frank Herbert"), date(2024, 1, 2)))
            .await
            .unwrap();
        repo.add(&mut book("Hobbit Companion", None, date(2024, 1, 3)))
            .await
            .unwrap();

        let titles: Vec<String> = repo
            .search("hOBBit")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Hobbit Companion", "The Hobbit"]);

        let by_author = repo.search("herbert").await.unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].title, "Dune");

        assert!(repo.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_keeps_surrounding_spaces_in_term() {
        let repo = setup().await;

        repo.add(&mut book("The Hobbit", None, date(2024, 1, 1))).await.unwrap();
        repo.add(&mut book("Hobbit Companion", None, date(2024, 1, 2))).await.unwrap();

        let titles: Vec<String> = repo
            .search(" hobbit")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["The Hobbit"]);

        assert!(repo.search("hobbit  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_returns_everything_in_get_all_order() {
        let repo = setup().await;

        repo.add(&mut book("B", None, date(2024, 1, 1))).await.unwrap();
        repo.add(&mut book("A", None, date(2024, 1, 2))).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(repo.search("").await.unwrap(), all);
        assert_eq!(repo.search("   ").await.unwrap(), all);
    }

    #[tokio::test]
    async fn test_distinct_genres() {
        let repo = setup().await;

        let genres = [
            Some("Fantasy"),
            Some("fantasy"),
            Some("Fantasy"),
            Some("biography"),
            Some(""),
            None,
        ];
        for genre in genres {
            let mut b = book("Any", None, date(2024, 1, 1));
            b.genre = genre.map(str::to_string);
            repo.add(&mut b).await.unwrap();
        }

        let genres = repo.distinct_genres().await.unwrap();
        assert_eq!(genres.len(), 3);
        assert_eq!(genres[0], "biography");
        assert!(genres[1..].iter().all(|g| g.eq_ignore_ascii_case("fantasy")));
    }

    #[tokio::test]
    async fn test_read_statistics() {
        let repo = setup().await;

        repo.add(&mut read_book("One", date(2024, 1, 15))).await.unwrap();
        repo.add(&mut read_book("Two", date(2024, 2, 1))).await.unwrap();
        repo.add(&mut read_book("Three", date(2023, 1, 10))).await.unwrap();
        repo.add(&mut book("Wish", None, date(2024, 1, 20))).await.unwrap();

        assert_eq!(repo.total_read_count().await.unwrap(), 3);
        assert_eq!(repo.read_count_by_year(2024).await.unwrap(), 2);
        assert_eq!(repo.read_count_by_year(2025).await.unwrap(), 0);
        assert_eq!(repo.read_count_by_month_and_year(2024, 1).await.unwrap(), 1);
        assert_eq!(repo.read_count_by_month_and_year(2024, 3).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_empty_date_read_column_maps_to_none() {
        let repo = setup().await;

        let mut conn = repo.database().acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO books (title, status, dateAdded, dateRead) VALUES ('Legacy', 'READ', '2020-05-05', '')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        conn.release().await;

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].date_read, None);
        assert_eq!(all[0].rating, 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_invalid_data() {
        let repo = setup().await;

        let mut conn = repo.database().acquire().await.unwrap();
        sqlx::query("INSERT INTO books (title, status, dateAdded) VALUES ('Bad', 'LOST', '2020-05-05')")
            .execute(&mut *conn)
            .await
            .unwrap();
        conn.release().await;

        let err = repo.get_all().await.unwrap_err();
        assert!(matches!(err, DiaryError::InvalidData(_)));
        assert!(err.is_access_error());
    }
}
