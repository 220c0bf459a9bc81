// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

use anyhow::{bail, Context, Result};
use book_diary::config::{StoreConfig, DB_URL_ENV};
use book_diary::storage::{
    progress_for_all, Book, BookRepository, Database, Goal, GoalRepository, GoalType,
    ReadingStatus, SqliteBookRepository, SqliteGoalRepository,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "book-diary-cli")]
#[command(about = "Book Diary CLI - manage a personal reading log", long_about = None)]
struct Cli {
    /// Database connection string (overrides BOOK_DIARY_DB_URL)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Read,
    WantToRead,
}

impl From<StatusArg> for ReadingStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Read => ReadingStatus::Read,
            StatusArg::WantToRead => ReadingStatus::WantToRead,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalTypeArg {
    Monthly,
    Yearly,
    Total,
}

impl From<GoalTypeArg> for GoalType {
    fn from(arg: GoalTypeArg) -> Self {
        match arg {
            GoalTypeArg::Monthly => GoalType::Monthly,
            GoalTypeArg::Yearly => GoalType::Yearly,
            GoalTypeArg::Total => GoalType::Total,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the diary
    AddBook {
        title: String,
        #[arg(short, long)]
        author: Option<String>,
        #[arg(short, long)]
        genre: Option<String>,
        #[arg(short, long, value_enum, default_value = "want-to-read")]
        status: StatusArg,
        /// Cover image file name inside the covers directory
        #[arg(long)]
        cover: Option<String>,
    },
    /// List books, newest first
    List {
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
        #[arg(short, long)]
        favorites: bool,
    },
    /// Show one book
    Show { id: i64 },
    /// Search titles and authors
    Search { term: String },
    /// List the genres in use
    Genres,
    /// Mark a book as read
    MarkRead {
        id: i64,
        /// Date read (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long, value_parser = clap::value_parser!(i32).range(0..=5))]
        rating: Option<i32>,
        #[arg(short, long)]
        favorite: bool,
    },
    /// Delete a book
    DeleteBook { id: i64 },
    /// Show reading statistics
    Stats {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Add a reading goal
    AddGoal {
        #[arg(value_enum)]
        goal_type: GoalTypeArg,
        /// Number of books to read
        target: i32,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List goals with their progress
    Goals,
    /// Delete a goal
    DeleteGoal { id: i64 },
    /// Copy the database file for backup
    Export { dest: PathBuf },
}

#[derive(Serialize)]
struct Stats {
    total: i64,
    read: i64,
    year: Option<(i32, i64)>,
    month: Option<(i32, u32, i64)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.db {
        Some(url) => StoreConfig::from_url(url)?,
        None => StoreConfig::from_env().with_context(|| format!("Invalid {}", DB_URL_ENV))?,
    };
    let db = Database::open(&config)
        .await
        .context("Failed to open the reading diary database")?;

    let books = SqliteBookRepository::new(db.clone());
    let goals = SqliteGoalRepository::new(db.clone());

    match cli.command {
        Commands::AddBook {
            title,
            author,
            genre,
            status,
            cover,
        } => {
            let mut book = Book::new(title, author, genre, status.into(), cover);
            if book.status == ReadingStatus::Read {
                book.date_read = Some(book.date_added);
            }
            books.add(&mut book).await?;
            print_book(&book, cli.json)?;
        }
        Commands::List { status, favorites } => {
            let list = match (status, favorites) {
                (_, true) => books.get_favorites().await?,
                (Some(status), false) => books.get_by_status(status.into()).await?,
                (None, false) => books.get_all().await?,
            };
            print_books(&list, cli.json)?;
        }
        Commands::Show { id } => {
            let book = find_book(&books, id).await?;
            print_book(&book, cli.json)?;
            if !cli.json {
                if let Some(cover) = book.cover_path(&config.covers_dir()) {
                    println!("  cover: {}", cover.display());
                }
            }
        }
        Commands::Search { term } => {
            let list = books.search(&term).await?;
            print_books(&list, cli.json)?;
        }
        Commands::Genres => {
            let genres = books.distinct_genres().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&genres)?);
            } else {
                for genre in genres {
                    println!("{}", genre);
                }
            }
        }
        Commands::MarkRead {
            id,
            date,
            rating,
            favorite,
        } => {
            let mut book = find_book(&books, id).await?;
            book.mark_read(date.unwrap_or_else(|| Local::now().date_naive()));
            if let Some(rating) = rating {
                book.rating = rating;
            }
            book.favorite = book.favorite || favorite;
            books.update(&book).await?;
            print_book(&book, cli.json)?;
        }
        Commands::DeleteBook { id } => {
            books.delete(id).await?;
            if !cli.json {
                println!("Deleted book {}", id);
            }
        }
        Commands::Stats { year, month } => {
            if month.is_some() && year.is_none() {
                bail!("--month needs --year");
            }
            let stats = Stats {
                total: books.count().await?,
                read: books.total_read_count().await?,
                year: match year {
                    Some(year) => Some((year, books.read_count_by_year(year).await?)),
                    None => None,
                },
                month: match (year, month) {
                    (Some(year), Some(month)) => Some((
                        year,
                        month,
                        books.read_count_by_month_and_year(year, month).await?,
                    )),
                    _ => None,
                },
            };
            print_stats(&stats, cli.json)?;
        }
        Commands::AddGoal {
            goal_type,
            target,
            year,
            month,
            description,
        } => {
            let goal_type = GoalType::from(goal_type);
            let today = Local::now().date_naive();
            let (year, month) = match goal_type {
                GoalType::Monthly => (
                    Some(year.unwrap_or(today.year())),
                    Some(month.unwrap_or(today.month())),
                ),
                GoalType::Yearly => (Some(year.unwrap_or(today.year())), None),
                GoalType::Total => (None, None),
            };
            let mut goal = Goal::new(description, goal_type, target, year, month);
            goals.add(&mut goal).await?;
            print_goal(&goal, cli.json)?;
        }
        Commands::Goals => {
            let all = goals.get_all().await?;
            let progress = progress_for_all(&books, &all).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                for p in progress {
                    println!(
                        "[{}] {} {}/{} ({:.0}%){}",
                        p.goal.id,
                        goal_period(&p.goal),
                        p.current,
                        p.target,
                        p.fraction() * 100.0,
                        if p.is_achieved() { " achieved" } else { "" }
                    );
                }
            }
        }
        Commands::DeleteGoal { id } => {
            goals.delete(id).await?;
            if !cli.json {
                println!("Deleted goal {}", id);
            }
        }
        Commands::Export { dest } => {
            let written = db.export(&dest).await?;
            if !cli.json {
                println!("Exported database to {}", written.display());
            }
        }
    }

    Ok(())
}

async fn find_book(books: &SqliteBookRepository, id: i64) -> Result<Book> {
    match books.get_by_id(id).await? {
        Some(book) => Ok(book),
        None => bail!("No book with id {}", id),
    }
}

fn print_book(book: &Book, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(book)?);
        return Ok(());
    }

    println!(
        "[{}] {}{}",
        book.id,
        book.title,
        book.author
            .as_deref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default()
    );
    println!("  status: {}", book.status);
    println!("  added: {}", book.date_added);
    if let Some(read) = book.date_read {
        println!("  read: {}", read);
    }
    if let Some(genre) = &book.genre {
        println!("  genre: {}", genre);
    }
    if book.rating > 0 {
        println!("  rating: {}/5", book.rating);
    }
    if book.favorite {
        println!("  favorite");
    }
    if let Some(comment) = &book.comment {
        println!("  comment: {}", comment);
    }
    Ok(())
}

fn print_books(books: &[Book], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books found");
    }
    for book in books {
        print_book(book, false)?;
    }
    Ok(())
}

fn print_goal(goal: &Goal, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(goal)?);
    } else {
        println!("[{}] {} target {}", goal.id, goal_period(goal), goal.target_value);
    }
    Ok(())
}

fn goal_period(goal: &Goal) -> String {
    let label = match (goal.goal_type, goal.year, goal.month) {
        (Some(GoalType::Monthly), Some(year), Some(month)) => format!("{:04}-{:02}", year, month),
        (Some(GoalType::Yearly), Some(year), _) => year.to_string(),
        (Some(goal_type), _, _) => goal_type.display_name().to_string(),
        (None, _, _) => "Untyped".to_string(),
    };

    match &goal.description {
        Some(description) => format!("{} - {}", label, description),
        None => label,
    }
}

fn print_stats(stats: &Stats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Books in diary: {}", stats.total);
    println!("Books read: {}", stats.read);
    if let Some((year, count)) = stats.year {
        println!("Read in {}: {}", year, count);
    }
    if let Some((year, month, count)) = stats.month {
        println!("Read in {:04}-{:02}: {}", year, month, count);
    }
    Ok(())
}
