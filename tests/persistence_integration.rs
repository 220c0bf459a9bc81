//! Integration tests for file-backed storage
//!
//! Exercises the repositories end to end against real database files in a
//! temporary directory: data written through one `Database` must be visible
//! through a fresh one opened on the same file.

use book_diary::config::StoreConfig;
use book_diary::storage::{
    goal_progress, Book, BookRepository, Database, Goal, GoalRepository, GoalType,
    ReadingStatus, SqliteBookRepository, SqliteGoalRepository,
};
use chrono::NaiveDate;
use sqlx::SqliteConnection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_file_database_persists_across_instances() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("diary").join("book_diary.db");

    let book_id = {
        let db = Database::new(&db_path).await?;
        let books = SqliteBookRepository::new(db);

        let mut dune = Book::new(
            "Dune",
            Some("Frank Herbert".into()),
            Some("Science Fiction".into()),
            ReadingStatus::WantToRead,
            None,
        );
        dune.date_added = date(2024, 1, 1);
        books.add(&mut dune).await?
    };

    let reopened = Database::open(&StoreConfig::file(&db_path)).await?;
    let books = SqliteBookRepository::new(reopened);
    let loaded = books.get_by_id(book_id).await?.expect("Book should survive reopen");

    assert_eq!(loaded.title, "Dune");
    assert_eq!(loaded.author.as_deref(), Some("Frank Herbert"));
    assert_eq!(books.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_file_database_opens_fresh_connection_per_acquire() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(dir.path().join("book_diary.db")).await?;

    let first = db.acquire().await?;
    let second = db.acquire().await?;
    assert!(!first.is_shared());
    assert!(!second.is_shared());
    assert_ne!(
        &*first as *const SqliteConnection,
        &*second as *const SqliteConnection
    );
    first.release().await;
    second.release().await;

    Ok(())
}

#[tokio::test]
async fn test_url_config_selects_storage() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("url.db").display());

    let db = Database::open(&StoreConfig::from_url(&url)?).await?;
    assert!(!db.is_in_memory());

    let memory = Database::open(&StoreConfig::from_url("sqlite::memory:")?).await?;
    assert!(memory.is_in_memory());

    Ok(())
}

#[tokio::test]
async fn test_reading_year_against_file_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(dir.path().join("book_diary.db")).await?;
    let books = SqliteBookRepository::new(db.clone());
    let goals = SqliteGoalRepository::new(db.clone());

    for (title, read_on) in [
        ("Piranesi", date(2024, 1, 15)),
        ("Circe", date(2024, 2, 1)),
        ("Beloved", date(2023, 1, 10)),
    ] {
        let mut book = Book::new(title, None, None, ReadingStatus::WantToRead, None);
        book.mark_read(read_on);
        books.add(&mut book).await?;
    }

    let mut yearly = Goal::new(Some("Twelve in 2024".into()), GoalType::Yearly, 12, Some(2024), None);
    goals.add(&mut yearly).await?;

    let stored = goals.get_by_id(yearly.id).await?.expect("Goal should be stored");
    let progress = goal_progress(&books, &stored).await?;
    assert_eq!(progress.current, 2);
    assert_eq!(progress.target, 12);
    assert!(!progress.is_achieved());

    let backup = db.export(dir.path().join("backup.db")).await?;
    let restored = SqliteBookRepository::new(Database::new(&backup).await?);
    assert_eq!(restored.total_read_count().await?, 3);
    assert_eq!(restored.read_count_by_month_and_year(2024, 2).await?, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_to_new_file_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(dir.path().join("fresh.db")).await?;

    let mut handles = Vec::new();
    for n in 0..32 {
        let books = SqliteBookRepository::new(db.clone());
        handles.push(tokio::spawn(async move {
            let mut book = Book::new(
                format!("Book {}", n),
                None,
                None,
                ReadingStatus::WantToRead,
                None,
            );
            books.add(&mut book).await
        }));
    }

    let mut errors = 0;
    for handle in handles {
        if handle.await?.is_err() {
            errors += 1;
        }
    }

    assert_eq!(errors, 0);
    assert_eq!(SqliteBookRepository::new(db).count().await?, 32);

    Ok(())
}
