//! `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::goals::model::{Goal, GoalStatus};
use crate::health::model::{HealthRecord, ProfileUpdate, RecordType, UserProfile};

/// A conversation message from the database.
#[derive(Debug, Clone)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic database trait covering profiles, records, goals, and conversations.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Profile ─────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    /// Return the profile, creating the default one on first use.
    async fn ensure_profile(&self, user_id: &str) -> Result<UserProfile, DatabaseError>;

    /// Merge the set fields of `update` into the stored profile.
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, DatabaseError>;

    // ── Health records ──────────────────────────────────────────────

    async fn insert_record(&self, record: &HealthRecord) -> Result<(), DatabaseError>;

    async fn get_record(&self, id: Uuid) -> Result<Option<HealthRecord>, DatabaseError>;

    async fn delete_record(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Records at or after `since`, newest first. `None` matches every type.
    async fn records_since(
        &self,
        user_id: &str,
        record_type: Option<&RecordType>,
        since: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, DatabaseError>;

    /// Most recent record of one type.
    async fn latest_record(
        &self,
        user_id: &str,
        record_type: &RecordType,
    ) -> Result<Option<HealthRecord>, DatabaseError>;

    // ── Goals ───────────────────────────────────────────────────────

    async fn insert_goal(&self, goal: &Goal) -> Result<(), DatabaseError>;

    async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>, DatabaseError>;

    /// Goals in one status. Active: deadline ascending. Completed: most
    /// recently completed first. Paused: oldest first.
    async fn list_goals_by_status(
        &self,
        user_id: &str,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, DatabaseError>;

    /// Write `current_value` and, if the goal is active and `value` reaches
    /// the target, mark it completed at `now`, all in one statement.
    ///
    /// Returns the goal as stored afterwards, or `None` if it does not exist.
    async fn apply_progress(
        &self,
        id: Uuid,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Option<Goal>, DatabaseError>;

    /// Move an active goal to `status`. Does not touch `completed_at`.
    ///
    /// Returns false when the goal is missing or no longer active.
    async fn set_goal_status(&self, id: Uuid, status: GoalStatus) -> Result<bool, DatabaseError>;

    async fn delete_goal(&self, id: Uuid) -> Result<bool, DatabaseError>;

    // ── Conversations ───────────────────────────────────────────────

    async fn ensure_conversation(&self, session_id: &str, user_id: &str)
    -> Result<(), DatabaseError>;

    async fn add_conversation_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), DatabaseError>;

    /// All messages of a session, oldest first.
    async fn list_conversation_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ConversationMessage>, DatabaseError>;
}
