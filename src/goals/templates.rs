//! Preset goal templates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::GoalError;
use crate::goals::model::{GoalCategory, NewGoal};

/// Longest accepted goal horizon, in days.
pub const MAX_GOAL_DAYS: i64 = 36_500;

/// Deadline `days` whole days after `now`.
pub fn deadline_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, GoalError> {
    if !(1..=MAX_GOAL_DAYS).contains(&days) {
        return Err(GoalError::Validation(format!(
            "days must be between 1 and {MAX_GOAL_DAYS}, got {days}"
        )));
    }
    Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| GoalError::Validation(format!("deadline {days} days out is out of range")))
}

/// A preset goal shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTemplate {
    WeightLoss,
    MuscleGain,
    RunningDistance,
    WorkoutFrequency,
    Sleep,
    Water,
}

impl GoalTemplate {
    pub const ALL: [GoalTemplate; 6] = [
        Self::WeightLoss,
        Self::MuscleGain,
        Self::RunningDistance,
        Self::WorkoutFrequency,
        Self::Sleep,
        Self::Water,
    ];

    /// Short key used on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::MuscleGain => "muscle_gain",
            Self::RunningDistance => "running",
            Self::WorkoutFrequency => "workouts",
            Self::Sleep => "sleep",
            Self::Water => "water",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WeightLoss => "Weight loss",
            Self::MuscleGain => "Muscle gain",
            Self::RunningDistance => "Running distance",
            Self::WorkoutFrequency => "Workout frequency",
            Self::Sleep => "Sleep",
            Self::Water => "Water intake",
        }
    }

    pub fn category(&self) -> GoalCategory {
        match self {
            Self::WeightLoss => GoalCategory::Weight,
            Self::MuscleGain | Self::RunningDistance | Self::WorkoutFrequency => GoalCategory::Fitness,
            Self::Sleep => GoalCategory::Wellness,
            Self::Water => GoalCategory::Nutrition,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::WeightLoss | Self::MuscleGain => "kg",
            Self::RunningDistance => "km",
            Self::WorkoutFrequency => "sessions/week",
            Self::Sleep => "hours/day",
            Self::Water => "cups/day",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::WeightLoss => "Reach a healthy weight through balanced eating and regular exercise",
            Self::MuscleGain => "Build muscle mass with strength training",
            Self::RunningDistance => "Improve running endurance until you reach the target distance",
            Self::WorkoutFrequency => "Build a habit of regular exercise",
            Self::Sleep => "Get enough sleep every night",
            Self::Water => "Build a habit of drinking enough water",
        }
    }

    pub fn default_target(&self) -> f64 {
        match self {
            Self::WeightLoss => 5.0,
            Self::MuscleGain => 3.0,
            Self::RunningDistance => 10.0,
            Self::WorkoutFrequency => 4.0,
            Self::Sleep => 8.0,
            Self::Water => 8.0,
        }
    }

    pub fn default_days(&self) -> i64 {
        match self {
            Self::WeightLoss => 90,
            Self::MuscleGain => 120,
            Self::RunningDistance => 60,
            Self::WorkoutFrequency | Self::Sleep | Self::Water => 30,
        }
    }

    /// Build the goal input, applying any overrides.
    pub fn to_new_goal(
        &self,
        overrides: &TemplateOverrides,
        now: DateTime<Utc>,
    ) -> Result<NewGoal, GoalError> {
        let days = overrides.days.unwrap_or_else(|| self.default_days());
        Ok(NewGoal {
            title: overrides
                .title
                .clone()
                .unwrap_or_else(|| format!("Reach my {} goal", self.name().to_lowercase())),
            description: self.description().to_string(),
            category: self.category(),
            target_value: overrides.target.unwrap_or_else(|| self.default_target()),
            unit: self.unit().to_string(),
            deadline: deadline_after(now, days)?,
        })
    }
}

impl fmt::Display for GoalTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GoalTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|t| t.key()).collect();
                format!("unknown template '{s}' (known: {})", known.join(", "))
            })
    }
}

/// Caller-supplied replacements for template defaults.
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    pub title: Option<String>,
    pub target: Option<f64>,
    pub days: Option<i64>,
}
