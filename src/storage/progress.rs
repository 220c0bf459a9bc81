// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Reading goal progress
//!
//! Progress is derived on demand from the book statistics; nothing about it
//! is stored.
//!
//! | Goal type | Counted books |
//! |-----------|---------------|
//! | Monthly   | read in `month` of `year` |
//! | Yearly    | read in `year` |
//! | Total     | every read book |

use crate::error::Result;
use crate::storage::models::{Goal, GoalType};
use crate::storage::traits::BookRepository;
use serde::Serialize;
use std::cmp::Reverse;

/// A goal together with how far along it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    /// Books counted towards the goal so far
    pub current: i64,
    pub target: i64,
}

impl GoalProgress {
    pub fn is_achieved(&self) -> bool {
        self.target > 0 && self.current >= self.target
    }

    /// Completion in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.target <= 0 {
            return 0.0;
        }
        (self.current as f64 / self.target as f64).clamp(0.0, 1.0)
    }
}

/// Count the books that count towards `goal`
///
/// A goal missing the year or month its type needs has made no progress.
pub async fn goal_progress<B: BookRepository>(books: &B, goal: &Goal) -> Result<GoalProgress> {
    let current = match (goal.goal_type, goal.year, goal.month) {
        (Some(GoalType::Monthly), Some(year), Some(month)) => {
            books.read_count_by_month_and_year(year, month).await?
        }
        (Some(GoalType::Yearly), Some(year), _) => books.read_count_by_year(year).await?,
        (Some(GoalType::Total), _, _) => books.total_read_count().await?,
        (goal_type, year, month) => {
            tracing::warn!(
                "goal {} ({:?}) lacks its period (year {:?}, month {:?})",
                goal.id,
                goal_type,
                year,
                month
            );
            0
        }
    };

    Ok(GoalProgress {
        goal: goal.clone(),
        current,
        target: i64::from(goal.target_value),
    })
}

/// Progress for every goal: unfinished goals first, then achieved ones,
/// each group newest first
pub async fn progress_for_all<B: BookRepository>(
    books: &B,
    goals: &[Goal],
) -> Result<Vec<GoalProgress>> {
    let mut progress = Vec::with_capacity(goals.len());
    for goal in goals {
        progress.push(goal_progress(books, goal).await?);
    }

    progress.sort_by_key(|p| (p.is_achieved(), Reverse(p.goal.date_added)));
    Ok(progress)
}
