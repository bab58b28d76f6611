//! Goal data model: goals, lifecycle status, categories, and urgency bands.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;

/// Lifecycle status.
///
/// `Active` moves to `Completed` (automatically, on reaching the target) or
/// to `Paused`. Neither transitions back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Paused,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            other => Err(format!("unknown goal status: {other}")),
        }
    }
}

/// Goal category. Anything outside the four built-ins is kept verbatim as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalCategory {
    Fitness,
    Nutrition,
    Weight,
    Wellness,
    Custom(String),
}

impl GoalCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fitness => "fitness",
            Self::Nutrition => "nutrition",
            Self::Weight => "weight",
            Self::Wellness => "wellness",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for GoalCategory {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fitness" => Self::Fitness,
            "nutrition" => Self::Nutrition,
            "weight" => Self::Weight,
            "wellness" => Self::Wellness,
            _ => Self::Custom(s.trim().to_string()),
        }
    }
}

impl From<&str> for GoalCategory {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<GoalCategory> for String {
    fn from(category: GoalCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-deadline band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Deadline has passed.
    Overdue,
    /// 0–3 days left.
    Urgent(i64),
    /// 4–7 days left.
    Attention(i64),
    /// More than 7 days left.
    Scheduled(i64),
}

impl Urgency {
    /// Band a whole-day count.
    pub fn from_days_left(days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            0..=3 => Self::Urgent(days),
            4..=7 => Self::Attention(days),
            _ => Self::Scheduled(days),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Overdue => "overdue".to_string(),
            Self::Urgent(_) => "urgent".to_string(),
            Self::Attention(_) => "attention".to_string(),
            Self::Scheduled(days) => format!("{days} days"),
        }
    }
}

/// Display band for progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Done,
    Good,
    Fair,
    Low,
}

impl ProgressBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            Self::Done
        } else if percent >= 75.0 {
            Self::Good
        } else if percent >= 50.0 {
            Self::Fair
        } else {
            Self::Low
        }
    }
}

/// Whole days from `now` until `deadline`, rounded toward negative infinity.
///
/// A deadline twelve hours ago is `-1`, not `0`.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// A tracked user objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target_value: f64,
    /// May exceed `target_value`; overachievement is kept as-is.
    pub current_value: f64,
    pub unit: String,
    pub deadline: DateTime<Utc>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on the `Active` → `Completed` transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Raw progress percentage. Not clamped; can exceed 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_value > 0.0 {
            self.current_value / self.target_value * 100.0
        } else {
            0.0
        }
    }

    /// Percentage above target, if the goal overshot it.
    pub fn overachievement_percent(&self) -> Option<f64> {
        (self.target_value > 0.0 && self.current_value > self.target_value)
            .then(|| (self.current_value / self.target_value - 1.0) * 100.0)
    }

    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.deadline, now)
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> Urgency {
        Urgency::from_days_left(self.days_left(now))
    }

    /// Whole days between creation and completion.
    pub fn days_taken(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_seconds().div_euclid(SECONDS_PER_DAY))
    }
}

/// Input for creating a goal.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target_value: f64,
    pub unit: String,
    pub deadline: DateTime<Utc>,
}

/// Result of a progress update.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// The goal after the update.
    pub goal: Goal,
    /// True when this update moved the goal from `Active` to `Completed`.
    pub just_completed: bool,
}

impl ProgressUpdate {
    pub fn status(&self) -> GoalStatus {
        self.goal.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn goal(target: f64, current: f64) -> Goal {
        let now = Utc::now();
        Goal {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            title: "Run".into(),
            description: "Run more".into(),
            category: GoalCategory::Fitness,
            target_value: target,
            current_value: current,
            unit: "km".into(),
            deadline: now + Duration::days(30),
            status: GoalStatus::Active,
            created_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn urgency_boundaries() {
        let now = Utc::now();
        assert_eq!(Urgency::from_days_left(days_until(now - Duration::days(1), now)), Urgency::Overdue);
        assert_eq!(Urgency::from_days_left(days_until(now + Duration::days(3), now)), Urgency::Urgent(3));
        assert_eq!(Urgency::from_days_left(days_until(now + Duration::days(4), now)), Urgency::Attention(4));
        assert_eq!(Urgency::from_days_left(days_until(now + Duration::days(7), now)), Urgency::Attention(7));
        assert_eq!(Urgency::from_days_left(days_until(now + Duration::days(8), now)), Urgency::Scheduled(8));
        assert_eq!(Urgency::from_days_left(days_until(now + Duration::days(30), now)), Urgency::Scheduled(30));
        assert_eq!(Urgency::from_days_left(0), Urgency::Urgent(0));
    }

    #[test]
    fn partial_day_past_deadline_is_overdue() {
        let now = Utc::now();
        assert_eq!(days_until(now - Duration::hours(12), now), -1);
        assert_eq!(days_until(now + Duration::hours(12), now), 0);
    }

    #[test]
    fn progress_keeps_overachievement() {
        let g = goal(10.0, 15.0);
        assert!((g.progress_percent() - 150.0).abs() < 1e-9);
        assert!((g.overachievement_percent().unwrap() - 50.0).abs() < 1e-9);
        assert!(goal(10.0, 5.0).overachievement_percent().is_none());
    }

    #[test]
    fn zero_target_progress_is_zero() {
        assert_eq!(goal(0.0, 5.0).progress_percent(), 0.0);
    }

    #[test]
    fn category_roundtrip_through_strings() {
        assert_eq!(GoalCategory::from("Weight"), GoalCategory::Weight);
        assert_eq!(GoalCategory::from("meditation"), GoalCategory::Custom("meditation".into()));
        let json = serde_json::to_string(&GoalCategory::Nutrition).unwrap();
        assert_eq!(json, "\"nutrition\"");
        let parsed: GoalCategory = serde_json::from_str("\"reading\"").unwrap();
        assert_eq!(parsed.as_str(), "reading");
    }

    #[test]
    fn status_parse() {
        assert_eq!("paused".parse::<GoalStatus>().unwrap(), GoalStatus::Paused);
        assert!("cancelled".parse::<GoalStatus>().is_err());
    }

    #[test]
    fn progress_bands() {
        assert_eq!(ProgressBand::from_percent(120.0), ProgressBand::Done);
        assert_eq!(ProgressBand::from_percent(75.0), ProgressBand::Good);
        assert_eq!(ProgressBand::from_percent(50.0), ProgressBand::Fair);
        assert_eq!(ProgressBand::from_percent(10.0), ProgressBand::Low);
    }
}
