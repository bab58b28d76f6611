//! Aggregate goal statistics.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::goals::model::{Goal, GoalCategory};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalStats {
    pub active: usize,
    pub completed: usize,
    /// Mean raw progress of active goals, 0 when there are none.
    pub average_progress: f64,
    pub completed_this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementStats {
    pub total: usize,
    pub top_category: Option<GoalCategory>,
    pub completed_this_month: usize,
    pub average_days_taken: f64,
}

/// Whether `at` falls in the same UTC calendar month as `now`.
fn same_month(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    at.year() == now.year() && at.month() == now.month()
}

fn completed_in_month(completed: &[Goal], now: DateTime<Utc>) -> usize {
    completed
        .iter()
        .filter(|g| g.completed_at.is_some_and(|at| same_month(at, now)))
        .count()
}

pub fn goal_stats(active: &[Goal], completed: &[Goal], now: DateTime<Utc>) -> GoalStats {
    let average_progress = if active.is_empty() {
        0.0
    } else {
        active.iter().map(Goal::progress_percent).sum::<f64>() / active.len() as f64
    };
    GoalStats {
        active: active.len(),
        completed: completed.len(),
        average_progress,
        completed_this_month: completed_in_month(completed, now),
    }
}

/// Achievement summary. Category ties go to the one seen first in `completed`.
pub fn achievement_stats(completed: &[Goal], now: DateTime<Utc>) -> AchievementStats {
    let mut counts: Vec<(&GoalCategory, usize)> = Vec::new();
    for goal in completed {
        match counts.iter_mut().find(|(c, _)| *c == &goal.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((&goal.category, 1)),
        }
    }
    let mut top: Option<(&GoalCategory, usize)> = None;
    for (category, n) in counts {
        if top.is_none_or(|(_, best)| n > best) {
            top = Some((category, n));
        }
    }

    let taken: Vec<i64> = completed.iter().filter_map(Goal::days_taken).collect();
    let average_days_taken = if completed.is_empty() {
        0.0
    } else {
        taken.iter().sum::<i64>() as f64 / completed.len() as f64
    };

    AchievementStats {
        total: completed.len(),
        top_category: top.map(|(c, _)| c.clone()),
        completed_this_month: completed_in_month(completed, now),
        average_days_taken,
    }
}
