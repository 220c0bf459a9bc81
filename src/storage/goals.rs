// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! SQLite-backed goal repository
//!
//! Unlike books, a goal write is validated before a connection is acquired,
//! and updating a goal id that does not exist is an error.

use crate::error::{DiaryError, Result};
use crate::storage::database::Database;
use crate::storage::helpers::{decode_date, encode_date};
use crate::storage::models::{Goal, GoalType};
use crate::storage::traits::GoalRepository;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const SELECT_GOAL_COLUMNS: &str = r#"
    SELECT id, description, type, targetValue, year, month, dateAdded
    FROM goals
"#;

/// Fields every stored goal must carry
struct ValidGoal<'a> {
    goal: &'a Goal,
    goal_type: GoalType,
    date_added: NaiveDate,
}

fn validate(goal: &Goal) -> Result<ValidGoal<'_>> {
    let goal_type = goal
        .goal_type
        .ok_or_else(|| DiaryError::missing_field("goal type"))?;
    let date_added = goal
        .date_added
        .ok_or_else(|| DiaryError::missing_field("date added"))?;

    Ok(ValidGoal {
        goal,
        goal_type,
        date_added,
    })
}

/// SQLite implementation of [`GoalRepository`]
#[derive(Debug, Clone)]
pub struct SqliteGoalRepository {
    db: Database,
}

impl SqliteGoalRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn insert(conn: &mut SqliteConnection, valid: &ValidGoal<'_>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO goals (description, type, targetValue, year, month, dateAdded)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&valid.goal.description)
        .bind(valid.goal_type.as_str())
        .bind(valid.goal.target_value)
        .bind(valid.goal.year)
        .bind(valid.goal.month)
        .bind(encode_date(valid.date_added))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DiaryError::NoRowsAffected(
                "Inserting goal did not create a row".to_string(),
            ));
        }

        let id = result.last_insert_rowid();
        if id <= 0 {
            return Err(DiaryError::GeneratedKeyMissing(
                "No id was generated for goal".to_string(),
            ));
        }

        Ok(id)
    }

    async fn overwrite(conn: &mut SqliteConnection, valid: &ValidGoal<'_>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE goals SET
                description = ?, type = ?, targetValue = ?, year = ?, month = ?,
                dateAdded = ?
            WHERE id = ?
            "#,
        )
        .bind(&valid.goal.description)
        .bind(valid.goal_type.as_str())
        .bind(valid.goal.target_value)
        .bind(valid.goal.year)
        .bind(valid.goal.month)
        .bind(encode_date(valid.date_added))
        .bind(valid.goal.id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove(conn: &mut SqliteConnection, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> Result<Option<Goal>> {
        let sql = format!("{} WHERE id = ?", SELECT_GOAL_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

        row.as_ref().map(goal_from_row).transpose()
    }

    async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Goal>> {
        let sql = format!("{} ORDER BY dateAdded DESC", SELECT_GOAL_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        rows.iter().map(goal_from_row).collect()
    }

    async fn count_all(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }
}

fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
    let goal_type: String = row.try_get("type")?;
    let date_added: String = row.try_get("dateAdded")?;

    Ok(Goal {
        id: row.try_get("id")?,
        description: row.try_get("description")?,
        goal_type: Some(goal_type.parse()?),
        target_value: row.try_get("targetValue")?,
        year: row.try_get("year")?,
        month: row.try_get("month")?,
        date_added: Some(decode_date("dateAdded", &date_added)?),
    })
}

impl GoalRepository for SqliteGoalRepository {
    async fn add(&self, goal: &mut Goal) -> Result<i64> {
        let valid = validate(goal)?;
        tracing::debug!("adding {} goal", valid.goal_type.as_str());

        let mut conn = self.db.acquire().await?;
        let outcome = Self::insert(&mut conn, &valid).await;
        conn.release().await;

        match outcome {
            Ok(id) => {
                goal.id = id;
                tracing::info!("added goal with id {}", id);
                Ok(id)
            }
            Err(e) => {
                tracing::error!("failed to add goal: {}", e);
                Err(e)
            }
        }
    }

    async fn update(&self, goal: &Goal) -> Result<()> {
        let valid = validate(goal)?;
        tracing::debug!("updating goal {}", goal.id);

        let mut conn = self.db.acquire().await?;
        let outcome = Self::overwrite(&mut conn, &valid).await;
        conn.release().await;

        match outcome {
            Ok(0) => {
                tracing::warn!("update of goal {} affected no rows", goal.id);
                Err(DiaryError::not_found(format!("Goal with id {}", goal.id)))
            }
            Ok(_) => {
                tracing::info!("updated goal {}", goal.id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to update goal {}: {}", goal.id, e);
                Err(e)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        tracing::debug!("deleting goal {}", id);

        let mut conn = self.db.acquire().await?;
        let outcome = Self::remove(&mut conn, id).await;
        conn.release().await;

        match outcome? {
            0 => tracing::warn!("delete of goal {} affected no rows", id),
            _ => tracing::info!("deleted goal {}", id),
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Goal>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_one(&mut conn, id).await;
        conn.release().await;
        outcome
    }

    async fn get_all(&self) -> Result<Vec<Goal>> {
        let mut conn = self.db.acquire().await?;
        let outcome = Self::fetch_all(&mut conn).await;
        conn.release().await;
        outcome
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> SqliteGoalRepository {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        SqliteGoalRepository::new(db)
    }

    fn goal(goal_type: GoalType, target: i32, year: Option<i32>, month: Option<u32>) -> Goal {
        let mut goal = Goal::new(Some("Read more".into()), goal_type, target, year, month);
        goal.date_added = Some(date(2024, 1, 1));
        goal
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let repo = setup().await;

        let mut monthly = goal(GoalType::Monthly, 3, Some(2024), Some(6));
        let id = repo.add(&mut monthly).await.expect("Failed to add goal");
        assert_eq!(monthly.id, id);

        let loaded = repo.get_by_id(id).await.unwrap().expect("Goal not found");
        assert!(loaded.fields_eq(&monthly));
    }

    #[tokio::test]
    async fn test_total_goal_reads_back_null_year_and_month() {
        let repo = setup().await;

        let mut total = goal(GoalType::Total, 100, None, None);
        let id = repo.add(&mut total).await.unwrap();

        let loaded = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.year, None);
        assert_eq!(loaded.month, None);
        assert_eq!(loaded.goal_type, Some(GoalType::Total));
    }

    #[tokio::test]
    async fn test_add_without_type_is_rejected_before_writing() {
        let repo = setup().await;

        let mut untyped = goal(GoalType::Yearly, 10, Some(2024), None);
        untyped.goal_type = None;
        let err = repo.add(&mut untyped).await.unwrap_err();

        assert!(matches!(err, DiaryError::MissingRequiredField(ref f) if f == "goal type"));
        assert!(err.is_validation_error());
        assert_eq!(untyped.id, 0);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_without_date_added_is_rejected() {
        let repo = setup().await;

        let mut undated = goal(GoalType::Yearly, 10, Some(2024), None);
        undated.date_added = None;
        let err = repo.add(&mut undated).await.unwrap_err();

        assert!(matches!(err, DiaryError::MissingRequiredField(ref f) if f == "date added"));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_validates_and_persists() {
        let repo = setup().await;

        let mut yearly = goal(GoalType::Yearly, 10, Some(2024), None);
        repo.add(&mut yearly).await.unwrap();

        yearly.target_value = 20;
        yearly.description = None;
        repo.update(&yearly).await.expect("Failed to update");
        let loaded = repo.get_by_id(yearly.id).await.unwrap().unwrap();
        assert_eq!(loaded.target_value, 20);
        assert_eq!(loaded.description, None);

        let mut broken = yearly.clone();
        broken.goal_type = None;
        let err = repo.update(&broken).await.unwrap_err();
        assert!(err.is_validation_error());
        let unchanged = repo.get_by_id(yearly.id).await.unwrap().unwrap();
        assert_eq!(unchanged.goal_type, Some(GoalType::Yearly));
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_names_the_id() {
        let repo = setup().await;

        let mut ghost = goal(GoalType::Total, 5, None, None);
        ghost.id = 31337;
        let err = repo.update(&ghost).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.is_access_error());
        assert!(err.to_string().contains("31337"));
    }

    #[tokio::test]
    async fn test_delete_and_ordering() {
        let repo = setup().await;

        let mut older = goal(GoalType::Total, 5, None, None);
        older.date_added = Some(date(2023, 6, 1));
        let mut newer = goal(GoalType::Yearly, 12, Some(2024), None);
        newer.date_added = Some(date(2024, 6, 1));
        repo.add(&mut older).await.unwrap();
        repo.add(&mut newer).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all, vec![newer.clone(), older.clone()]);

        repo.delete(newer.id).await.unwrap();
        repo.delete(newer.id).await.expect("Second delete must not fail");
        assert_eq!(repo.get_all().await.unwrap(), vec![older]);
    }
}
