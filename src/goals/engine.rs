//! Goal lifecycle over the record store.
//!
//! The engine holds no state of its own; every call reads from and writes
//! to the `Database` it was built with.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GoalError;
use crate::goals::model::{Goal, GoalStatus, NewGoal, ProgressUpdate, Urgency};
use crate::goals::stats::{self, AchievementStats, GoalStats};
use crate::goals::templates::{GoalTemplate, TemplateOverrides};
use crate::store::Database;

/// One row of the quick view.
#[derive(Debug, Clone)]
pub struct QuickViewEntry {
    pub goal: Goal,
    pub progress_percent: f64,
    pub days_left: i64,
    pub urgency: Urgency,
}

/// The most urgent active goals plus how many were left out.
#[derive(Debug, Clone)]
pub struct QuickView {
    pub entries: Vec<QuickViewEntry>,
    pub remaining: usize,
}

pub struct GoalEngine {
    db: Arc<dyn Database>,
}

impl GoalEngine {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Validate and store a new active goal. Returns its id.
    pub async fn create_goal(
        &self,
        user_id: &str,
        input: NewGoal,
        now: DateTime<Utc>,
    ) -> Result<Uuid, GoalError> {
        if input.title.trim().is_empty() {
            return Err(GoalError::Validation("title must not be empty".into()));
        }
        if input.description.trim().is_empty() {
            return Err(GoalError::Validation("description must not be empty".into()));
        }
        if !input.target_value.is_finite() || input.target_value <= 0.0 {
            return Err(GoalError::Validation(format!(
                "target value must be positive, got {}",
                input.target_value
            )));
        }

        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category,
            target_value: input.target_value,
            current_value: 0.0,
            unit: input.unit,
            deadline: input.deadline,
            status: GoalStatus::Active,
            created_at: now,
            completed_at: None,
        };
        self.db.insert_goal(&goal).await?;
        info!(goal_id = %goal.id, title = %goal.title, category = %goal.category, "Goal created");
        Ok(goal.id)
    }

    /// Create a goal from a preset, going through the same validation.
    pub async fn create_from_template(
        &self,
        user_id: &str,
        template: GoalTemplate,
        overrides: &TemplateOverrides,
        now: DateTime<Utc>,
    ) -> Result<Uuid, GoalError> {
        self.create_goal(user_id, template.to_new_goal(overrides, now)?, now)
            .await
    }

    /// Record a new current value.
    ///
    /// Reaching the target on an active goal completes it in the same store
    /// write. Completed and paused goals only have their value updated.
    pub async fn update_progress(
        &self,
        goal_id: Uuid,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<ProgressUpdate, GoalError> {
        if !value.is_finite() || value < 0.0 {
            return Err(GoalError::Validation(format!(
                "progress value must be zero or more, got {value}"
            )));
        }

        let before = self.require(goal_id).await?;
        let goal = self
            .db
            .apply_progress(goal_id, value, now)
            .await?
            .ok_or_else(|| not_found(goal_id))?;

        let just_completed =
            before.status == GoalStatus::Active && goal.status == GoalStatus::Completed;
        if just_completed {
            info!(goal_id = %goal_id, value, "Goal completed");
        } else {
            debug!(goal_id = %goal_id, value, status = %goal.status, "Goal progress updated");
        }
        Ok(ProgressUpdate {
            goal,
            just_completed,
        })
    }

    /// Pause an active goal. Pausing a paused goal is a no-op.
    pub async fn pause_goal(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        let goal = self.require(goal_id).await?;
        match goal.status {
            GoalStatus::Completed => return Err(invalid_state(&goal, GoalStatus::Paused)),
            GoalStatus::Paused => return Ok(goal),
            GoalStatus::Active => {}
        }

        if !self.db.set_goal_status(goal_id, GoalStatus::Paused).await? {
            // Lost a race with a completing update.
            let current = self.require(goal_id).await?;
            return Err(invalid_state(&current, GoalStatus::Paused));
        }
        info!(goal_id = %goal_id, "Goal paused");
        self.require(goal_id).await
    }

    pub async fn get_goal(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        self.require(goal_id).await
    }

    /// Active goals, soonest deadline first.
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<Goal>, GoalError> {
        let mut goals = self
            .db
            .list_goals_by_status(user_id, GoalStatus::Active)
            .await?;
        // The store already orders by deadline; keep the guarantee local.
        goals.sort_by_key(|g| g.deadline);
        Ok(goals)
    }

    /// Completed goals, most recently completed first.
    pub async fn list_completed(&self, user_id: &str) -> Result<Vec<Goal>, GoalError> {
        Ok(self
            .db
            .list_goals_by_status(user_id, GoalStatus::Completed)
            .await?)
    }

    pub async fn list_paused(&self, user_id: &str) -> Result<Vec<Goal>, GoalError> {
        Ok(self
            .db
            .list_goals_by_status(user_id, GoalStatus::Paused)
            .await?)
    }

    /// Raw progress percentage, kept above 100 for overachievement.
    pub fn compute_progress(goal: &Goal) -> f64 {
        goal.progress_percent()
    }

    pub fn classify_urgency(goal: &Goal, now: DateTime<Utc>) -> Urgency {
        goal.urgency(now)
    }

    /// The `n` most urgent active goals.
    pub async fn quick_view(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        n: usize,
    ) -> Result<QuickView, GoalError> {
        let active = self.list_active(user_id).await?;
        let remaining = active.len().saturating_sub(n);
        let entries = active
            .into_iter()
            .take(n)
            .map(|goal| QuickViewEntry {
                progress_percent: goal.progress_percent(),
                days_left: goal.days_left(now),
                urgency: goal.urgency(now),
                goal,
            })
            .collect();
        Ok(QuickView { entries, remaining })
    }

    pub async fn goal_stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<GoalStats, GoalError> {
        let active = self.list_active(user_id).await?;
        let completed = self.list_completed(user_id).await?;
        Ok(stats::goal_stats(&active, &completed, now))
    }

    pub async fn achievement_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AchievementStats, GoalError> {
        let completed = self.list_completed(user_id).await?;
        Ok(stats::achievement_stats(&completed, now))
    }

    /// Find one of the user's goals by full id or unique id prefix.
    pub async fn resolve_goal(&self, user_id: &str, reference: &str) -> Result<Goal, GoalError> {
        let reference = reference.trim().to_lowercase();
        if let Ok(id) = Uuid::parse_str(&reference) {
            let goal = self.require(id).await?;
            if goal.user_id != user_id {
                return Err(not_found(id));
            }
            return Ok(goal);
        }
        if reference.is_empty() {
            return Err(GoalError::Validation("goal id must not be empty".into()));
        }

        let mut matches = Vec::new();
        for status in [GoalStatus::Active, GoalStatus::Paused, GoalStatus::Completed] {
            matches.extend(
                self.db
                    .list_goals_by_status(user_id, status)
                    .await?
                    .into_iter()
                    .filter(|g| g.id.to_string().starts_with(&reference)),
            );
        }
        match matches.len() {
            0 => Err(GoalError::NotFound { id: reference }),
            1 => Ok(matches.remove(0)),
            n => Err(GoalError::Validation(format!(
                "goal id prefix '{reference}' matches {n} goals"
            ))),
        }
    }

    async fn require(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        self.db
            .get_goal(goal_id)
            .await?
            .ok_or_else(|| not_found(goal_id))
    }
}

fn not_found(goal_id: Uuid) -> GoalError {
    GoalError::NotFound {
        id: goal_id.to_string(),
    }
}

fn invalid_state(goal: &Goal, target: GoalStatus) -> GoalError {
    GoalError::InvalidState {
        id: goal.id.to_string(),
        state: goal.status.to_string(),
        target: target.to_string(),
    }
}
