//! Dashboard statistics over health records.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::DatabaseError;
use crate::goals::model::GoalStatus;
use crate::health::model::{HealthRecord, RecordType};
use crate::store::Database;

/// Daily exercise target in minutes.
pub const DAILY_EXERCISE_MINUTES: f64 = 30.0;

/// Daily water target in cups.
pub const DAILY_WATER_CUPS: usize = 8;

/// Mood shown when nothing has been logged yet.
pub const DEFAULT_MOOD: f64 = 5.0;

/// Headline numbers for the overview screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Latest weight, 0 when none has been logged.
    pub current_weight: f64,
    pub today_exercises: usize,
    pub week_exercises: usize,
    pub latest_mood: f64,
    pub active_goals: usize,
}

/// Exercise and mood summary for a trailing week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekStats {
    pub exercise_count: usize,
    /// `None` when no mood was logged.
    pub average_mood: Option<f64>,
}

/// Progress toward today's fixed targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProgress {
    pub exercise_minutes: f64,
    /// Clamped to 100.
    pub exercise_percent: f64,
    pub water_cups: usize,
    /// Clamped to 100.
    pub water_percent: f64,
}

/// Start of the UTC day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Mean of the numeric values of records of one type, if any have one.
pub fn mean_numeric(records: &[HealthRecord], record_type: &RecordType) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter(|r| &r.record_type == record_type)
        .filter_map(|r| r.numeric_value)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn count_of(records: &[HealthRecord], record_type: &RecordType) -> usize {
    records.iter().filter(|r| &r.record_type == record_type).count()
}

pub fn week_stats(records: &[HealthRecord]) -> WeekStats {
    WeekStats {
        exercise_count: count_of(records, &RecordType::Exercise),
        average_mood: mean_numeric(records, &RecordType::Mood),
    }
}

/// Today's progress from today's records. Exercise numeric values are minutes;
/// every water record counts as one cup.
pub fn daily_progress(today: &[HealthRecord]) -> DailyProgress {
    let exercise_minutes: f64 = today
        .iter()
        .filter(|r| r.record_type == RecordType::Exercise)
        .filter_map(|r| r.numeric_value)
        .sum();
    let water_cups = count_of(today, &RecordType::Water);

    DailyProgress {
        exercise_minutes,
        exercise_percent: (exercise_minutes / DAILY_EXERCISE_MINUTES * 100.0).min(100.0),
        water_cups,
        water_percent: (water_cups as f64 / DAILY_WATER_CUPS as f64 * 100.0).min(100.0),
    }
}

/// Collect the overview numbers for one user.
pub async fn dashboard_stats(
    db: &dyn Database,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<DashboardStats, DatabaseError> {
    let current_weight = db
        .latest_record(user_id, &RecordType::Weight)
        .await?
        .and_then(|r| r.numeric_value)
        .unwrap_or(0.0);
    let latest_mood = db
        .latest_record(user_id, &RecordType::Mood)
        .await?
        .and_then(|r| r.numeric_value)
        .unwrap_or(DEFAULT_MOOD);

    let week = db
        .records_since(user_id, Some(&RecordType::Exercise), now - Duration::days(7))
        .await?;
    let midnight = start_of_day(now);
    let today_exercises = week.iter().filter(|r| r.recorded_at >= midnight).count();

    let active_goals = db
        .list_goals_by_status(user_id, GoalStatus::Active)
        .await?
        .len();

    Ok(DashboardStats {
        current_weight,
        today_exercises,
        week_exercises: week.len(),
        latest_mood,
        active_goals,
    })
}
