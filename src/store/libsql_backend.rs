//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Timestamps are written as
//! fixed-width RFC 3339 (microseconds, `Z`) so string order in SQL matches
//! chronological order.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::goals::model::{Goal, GoalCategory, GoalStatus};
use crate::health::model::{HealthRecord, ProfileUpdate, RecordType, UserProfile};
use crate::store::migrations;
use crate::store::traits::{ConversationMessage, Database};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical timestamp encoding.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str, field: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(ndt.and_utc());
    }
    Err(DatabaseError::Serialization(format!(
        "{field}: invalid timestamp '{s}'"
    )))
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("{field}: {e}")))
}

const PROFILE_COLUMNS: &str = "user_id, name, age, gender, height_cm, weight_kg, activity_level, fitness_goal, health_conditions, dietary_preferences, created_at, updated_at";

fn row_to_profile(row: &libsql::Row) -> Result<UserProfile, DatabaseError> {
    let user_id: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("profile.user_id: {e}")))?;
    let name: String = row.get(1).unwrap_or_else(|_| "User".to_string());
    let created_str: String = row.get(10).unwrap_or_default();
    let updated_str: String = row.get(11).unwrap_or_default();

    Ok(UserProfile {
        user_id,
        name,
        age: row.get::<i64>(2).ok().and_then(|v| u32::try_from(v).ok()),
        gender: row.get::<String>(3).ok(),
        height_cm: row.get::<f64>(4).ok(),
        weight_kg: row.get::<f64>(5).ok(),
        activity_level: row.get::<String>(6).ok(),
        fitness_goal: row.get::<String>(7).ok(),
        health_conditions: row.get::<String>(8).ok(),
        dietary_preferences: row.get::<String>(9).ok(),
        created_at: parse_datetime(&created_str, "profile.created_at")?,
        updated_at: parse_datetime(&updated_str, "profile.updated_at")?,
    })
}

const RECORD_COLUMNS: &str =
    "id, user_id, record_type, value, numeric_value, notes, recorded_at";

fn row_to_record(row: &libsql::Row) -> Result<HealthRecord, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("record.id: {e}")))?;
    let user_id: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("record.user_id: {e}")))?;
    let type_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("record.record_type: {e}")))?;
    let value: String = row.get(3).unwrap_or_default();
    let recorded_str: String = row
        .get(6)
        .map_err(|e| DatabaseError::Query(format!("record.recorded_at: {e}")))?;

    Ok(HealthRecord {
        id: parse_uuid(&id_str, "record.id")?,
        user_id,
        record_type: RecordType::from(type_str),
        value,
        numeric_value: row.get::<f64>(4).ok(),
        notes: row.get(5).unwrap_or_default(),
        recorded_at: parse_datetime(&recorded_str, "record.recorded_at")?,
    })
}

const GOAL_COLUMNS: &str = "id, user_id, title, description, category, target_value, current_value, unit, deadline, status, created_at, completed_at";

fn row_to_goal(row: &libsql::Row) -> Result<Goal, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("goal.id: {e}")))?;
    let user_id: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("goal.user_id: {e}")))?;
    let title: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("goal.title: {e}")))?;
    let description: String = row.get(3).unwrap_or_default();
    let category: String = row.get(4).unwrap_or_default();
    let target_value: f64 = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("goal.target_value: {e}")))?;
    let current_value: f64 = row.get(6).unwrap_or(0.0);
    let unit: String = row.get(7).unwrap_or_default();
    let deadline_str: String = row
        .get(8)
        .map_err(|e| DatabaseError::Query(format!("goal.deadline: {e}")))?;
    let status_str: String = row
        .get(9)
        .map_err(|e| DatabaseError::Query(format!("goal.status: {e}")))?;
    let created_str: String = row.get(10).unwrap_or_default();
    let completed_str: Option<String> = row.get(11).ok();

    let status: GoalStatus = status_str.parse().map_err(DatabaseError::Serialization)?;

    Ok(Goal {
        id: parse_uuid(&id_str, "goal.id")?,
        user_id,
        title,
        description,
        category: GoalCategory::from(category),
        target_value,
        current_value,
        unit,
        deadline: parse_datetime(&deadline_str, "goal.deadline")?,
        status,
        created_at: parse_datetime(&created_str, "goal.created_at")?,
        completed_at: completed_str
            .filter(|s| !s.is_empty())
            .map(|s| parse_datetime(&s, "goal.completed_at"))
            .transpose()?,
    })
}

/// Collect every row of a query through a mapper.
async fn collect_rows<T>(
    mut rows: libsql::Rows,
    map: fn(&libsql::Row) -> Result<T, DatabaseError>,
) -> Result<Vec<T>, DatabaseError> {
    let mut out = Vec::new();
    while let Ok(Some(row)) = rows.next().await {
        out.push(map(&row)?);
    }
    Ok(out)
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profile ─────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_profile(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile row: {e}"))),
        }
    }

    async fn ensure_profile(&self, user_id: &str) -> Result<UserProfile, DatabaseError> {
        let profile = UserProfile::default_for(user_id);
        let inserted = self
            .conn()
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO user_profiles ({PROFILE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    profile.user_id.as_str(),
                    profile.name.as_str(),
                    profile.age.map(i64::from),
                    profile.gender.clone(),
                    profile.height_cm,
                    profile.weight_kg,
                    profile.activity_level.clone(),
                    profile.fitness_goal.clone(),
                    profile.health_conditions.clone(),
                    profile.dietary_preferences.clone(),
                    ts(&profile.created_at),
                    ts(&profile.updated_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("ensure_profile: {e}")))?;
        if inserted > 0 {
            debug!(user_id, "Default profile created");
        }

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "profile".to_string(),
                id: user_id.to_string(),
            })
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, DatabaseError> {
        let mut profile =
            self.get_profile(user_id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound {
                    entity: "profile".to_string(),
                    id: user_id.to_string(),
                })?;
        update.apply(&mut profile);

        self.conn()
            .execute(
                "UPDATE user_profiles SET name = ?2, age = ?3, gender = ?4, height_cm = ?5,
                     weight_kg = ?6, activity_level = ?7, fitness_goal = ?8,
                     health_conditions = ?9, dietary_preferences = ?10, updated_at = ?11
                 WHERE user_id = ?1",
                params![
                    user_id,
                    profile.name.as_str(),
                    profile.age.map(i64::from),
                    profile.gender.clone(),
                    profile.height_cm,
                    profile.weight_kg,
                    profile.activity_level.clone(),
                    profile.fitness_goal.clone(),
                    profile.health_conditions.clone(),
                    profile.dietary_preferences.clone(),
                    ts(&profile.updated_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_profile: {e}")))?;

        debug!(user_id, "Profile updated");
        Ok(profile)
    }

    // ── Health records ──────────────────────────────────────────────

    async fn insert_record(&self, record: &HealthRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO health_records ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    record.id.to_string(),
                    record.user_id.as_str(),
                    record.record_type.as_str(),
                    record.value.as_str(),
                    record.numeric_value,
                    record.notes.as_str(),
                    ts(&record.recorded_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_record: {e}")))?;

        debug!(record_id = %record.id, record_type = %record.record_type, "Health record inserted");
        Ok(())
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<HealthRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {RECORD_COLUMNS} FROM health_records WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_record: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_record row: {e}"))),
        }
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM health_records WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_record: {e}")))?;
        Ok(affected > 0)
    }

    async fn records_since(
        &self,
        user_id: &str,
        record_type: Option<&RecordType>,
        since: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, DatabaseError> {
        let conn = self.conn();
        let rows = match record_type {
            Some(t) => {
                conn.query(
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM health_records
                         WHERE user_id = ?1 AND record_type = ?2 AND recorded_at >= ?3
                         ORDER BY recorded_at DESC"
                    ),
                    params![user_id, t.as_str(), ts(&since)],
                )
                .await
            }
            None => {
                conn.query(
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM health_records
                         WHERE user_id = ?1 AND recorded_at >= ?2
                         ORDER BY recorded_at DESC"
                    ),
                    params![user_id, ts(&since)],
                )
                .await
            }
        }
        .map_err(|e| DatabaseError::Query(format!("records_since: {e}")))?;

        collect_rows(rows, row_to_record).await
    }

    async fn latest_record(
        &self,
        user_id: &str,
        record_type: &RecordType,
    ) -> Result<Option<HealthRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM health_records
                     WHERE user_id = ?1 AND record_type = ?2
                     ORDER BY recorded_at DESC LIMIT 1"
                ),
                params![user_id, record_type.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("latest_record: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("latest_record row: {e}"))),
        }
    }

    // ── Goals ───────────────────────────────────────────────────────

    async fn insert_goal(&self, goal: &Goal) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO goals ({GOAL_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    goal.id.to_string(),
                    goal.user_id.as_str(),
                    goal.title.as_str(),
                    goal.description.as_str(),
                    goal.category.as_str(),
                    goal.target_value,
                    goal.current_value,
                    goal.unit.as_str(),
                    ts(&goal.deadline),
                    goal.status.as_str(),
                    ts(&goal.created_at),
                    goal.completed_at.as_ref().map(ts),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_goal: {e}")))?;

        debug!(goal_id = %goal.id, "Goal inserted");
        Ok(())
    }

    async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_goal: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_goal(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_goal row: {e}"))),
        }
    }

    async fn list_goals_by_status(
        &self,
        user_id: &str,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, DatabaseError> {
        let order = match status {
            GoalStatus::Active => "deadline ASC, created_at ASC",
            GoalStatus::Completed => "completed_at DESC",
            GoalStatus::Paused => "created_at ASC",
        };
        let rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND status = ?2 ORDER BY {order}"
                ),
                params![user_id, status.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_goals_by_status: {e}")))?;

        collect_rows(rows, row_to_goal).await
    }

    async fn apply_progress(
        &self,
        id: Uuid,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Option<Goal>, DatabaseError> {
        // CASE arms read the pre-update row, so status and completed_at flip together.
        let affected = self
            .conn()
            .execute(
                "UPDATE goals SET
                     current_value = ?1,
                     status = CASE WHEN status = 'active' AND ?1 >= target_value
                                   THEN 'completed' ELSE status END,
                     completed_at = CASE WHEN status = 'active' AND ?1 >= target_value
                                         THEN ?2 ELSE completed_at END
                 WHERE id = ?3",
                params![value, ts(&now), id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("apply_progress: {e}")))?;

        if affected == 0 {
            return Ok(None);
        }
        self.get_goal(id).await
    }

    async fn set_goal_status(&self, id: Uuid, status: GoalStatus) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE goals SET status = ?1 WHERE id = ?2 AND status = 'active'",
                params![status.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_goal_status: {e}")))?;
        Ok(affected > 0)
    }

    async fn delete_goal(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute("DELETE FROM goals WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_goal: {e}")))?;
        Ok(affected > 0)
    }

    // ── Conversations ───────────────────────────────────────────────

    async fn ensure_conversation(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<(), DatabaseError> {
        let now = ts(&Utc::now());
        self.conn()
            .execute(
                "INSERT INTO conversations (id, user_id, started_at, last_activity)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT (id) DO UPDATE SET last_activity = ?3",
                params![session_id, user_id, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("ensure_conversation: {e}")))?;
        Ok(())
    }

    async fn add_conversation_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = ts(&Utc::now());
        conn.execute(
            "INSERT INTO conversation_messages (id, conversation_id, seq, role, content, created_at)
             SELECT ?1, ?2, COALESCE(MAX(seq), 0) + 1, ?3, ?4, ?5
             FROM conversation_messages WHERE conversation_id = ?2",
            params![id.to_string(), session_id, role, content, now.as_str()],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("add_conversation_message: {e}")))?;

        // Touch last_activity
        let _ = conn
            .execute(
                "UPDATE conversations SET last_activity = ?2 WHERE id = ?1",
                params![session_id, now],
            )
            .await;

        Ok(())
    }

    async fn list_conversation_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ConversationMessage>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, role, content, created_at FROM conversation_messages
                 WHERE conversation_id = ?1 ORDER BY seq ASC",
                params![session_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_conversation_messages: {e}")))?;

        let mut messages = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let id_str: String = row.get(0).unwrap_or_default();
            let role: String = row.get(1).unwrap_or_default();
            let content: String = row.get(2).unwrap_or_default();
            let created_str: String = row.get(3).unwrap_or_default();
            messages.push(ConversationMessage {
                id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                role,
                content,
                created_at: parse_datetime(&created_str, "conversation_message.created_at")?,
            });
        }
        Ok(messages)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_goal(user: &str, title: &str, deadline_days: i64) -> Goal {
        let now = Utc::now();
        Goal {
            id: Uuid::new_v4(),
            user_id: user.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            category: GoalCategory::Fitness,
            target_value: 10.0,
            current_value: 0.0,
            unit: "km".to_string(),
            deadline: now + Duration::days(deadline_days),
            status: GoalStatus::Active,
            created_at: now,
            completed_at: None,
        }
    }

    // ── Profile tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn ensure_profile_creates_default_once() {
        let db = test_db().await;
        assert!(db.get_profile("u1").await.unwrap().is_none());

        let profile = db.ensure_profile("u1").await.unwrap();
        assert_eq!(profile.name, "User");
        assert_eq!(profile.age, Some(25));
        assert_eq!(profile.fitness_goal.as_deref(), Some("stay healthy"));

        let mut update = ProfileUpdate::default();
        update.name = Some("Alex".into());
        db.update_profile("u1", &update).await.unwrap();

        // A second ensure must not reset the edited profile.
        let again = db.ensure_profile("u1").await.unwrap();
        assert_eq!(again.name, "Alex");
        assert_eq!(again.height_cm, Some(170.0));
    }

    #[tokio::test]
    async fn update_profile_missing_is_not_found() {
        let db = test_db().await;
        let err = db
            .update_profile("ghost", &ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    // ── Record tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn records_since_is_newest_first_and_filtered() {
        let db = test_db().await;
        let now = Utc::now();
        for (days_ago, kind, value) in [(1, "weight", 70.0), (3, "weight", 71.0), (2, "mood", 6.0), (20, "weight", 75.0)] {
            let record = HealthRecord::new("u1", kind, format!("{value}"))
                .with_numeric(value)
                .at(now - Duration::days(days_ago));
            db.insert_record(&record).await.unwrap();
        }

        let weights = db
            .records_since("u1", Some(&RecordType::Weight), now - Duration::days(14))
            .await
            .unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].numeric_value, Some(70.0));
        assert_eq!(weights[1].numeric_value, Some(71.0));

        let all = db
            .records_since("u1", None, now - Duration::days(14))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].recorded_at >= w[1].recorded_at));

        let latest = db.latest_record("u1", &RecordType::Weight).await.unwrap().unwrap();
        assert_eq!(latest.numeric_value, Some(70.0));
    }

    #[tokio::test]
    async fn record_without_numeric_value() {
        let db = test_db().await;
        let record = HealthRecord::new("u1", "exercise", "yoga").with_notes("evening");
        db.insert_record(&record).await.unwrap();

        let fetched = db.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.numeric_value, None);
        assert_eq!(fetched.notes, "evening");
        assert_eq!(fetched.record_type, RecordType::Exercise);

        assert!(db.delete_record(record.id).await.unwrap());
        assert!(db.get_record(record.id).await.unwrap().is_none());
    }

    // ── Goal tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn active_goals_ordered_by_deadline() {
        let db = test_db().await;
        for (title, days) in [("late", 40), ("soon", 2), ("mid", 10)] {
            db.insert_goal(&make_goal("u1", title, days)).await.unwrap();
        }
        let active = db.list_goals_by_status("u1", GoalStatus::Active).await.unwrap();
        let titles: Vec<_> = active.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "mid", "late"]);
    }

    #[tokio::test]
    async fn apply_progress_completes_atomically() {
        let db = test_db().await;
        let goal = make_goal("u1", "Run 10km", 60);
        db.insert_goal(&goal).await.unwrap();

        let partial = db.apply_progress(goal.id, 4.0, Utc::now()).await.unwrap().unwrap();
        assert_eq!(partial.status, GoalStatus::Active);
        assert!(partial.completed_at.is_none());

        let done = db.apply_progress(goal.id, 12.5, Utc::now()).await.unwrap().unwrap();
        assert_eq!(done.status, GoalStatus::Completed);
        assert_eq!(done.current_value, 12.5);
        let completed_at = done.completed_at.unwrap();

        // Completed is terminal: value moves, status and timestamp stay.
        let later = db.apply_progress(goal.id, 3.0, Utc::now()).await.unwrap().unwrap();
        assert_eq!(later.status, GoalStatus::Completed);
        assert_eq!(later.current_value, 3.0);
        assert_eq!(later.completed_at.unwrap(), completed_at);
    }

    #[tokio::test]
    async fn apply_progress_on_paused_goal_only_sets_value() {
        let db = test_db().await;
        let goal = make_goal("u1", "Swim", 30);
        db.insert_goal(&goal).await.unwrap();
        db.set_goal_status(goal.id, GoalStatus::Paused).await.unwrap();

        let updated = db.apply_progress(goal.id, 20.0, Utc::now()).await.unwrap().unwrap();
        assert_eq!(updated.status, GoalStatus::Paused);
        assert!(updated.completed_at.is_none());
        assert_eq!(updated.current_value, 20.0);
    }

    #[tokio::test]
    async fn corrupt_deadline_is_an_error() {
        let db = test_db().await;
        let goal = make_goal("u1", "Hike", 20);
        db.insert_goal(&goal).await.unwrap();
        db.conn()
            .execute(
                "UPDATE goals SET deadline = 'next tuesday' WHERE id = ?1",
                params![goal.id.to_string()],
            )
            .await
            .unwrap();

        let err = db.get_goal(goal.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Serialization(_)));
        assert!(db.list_goals_by_status("u1", GoalStatus::Active).await.is_err());
    }

    #[test]
    fn parse_datetime_accepts_both_encodings() {
        let rfc = parse_datetime("2026-03-01T08:30:00.000000Z", "t").unwrap();
        let sqlite = parse_datetime("2026-03-01 08:30:00", "t").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_datetime("", "t").is_err());
    }

    #[tokio::test]
    async fn apply_progress_unknown_goal() {
        let db = test_db().await;
        assert!(db.apply_progress(Uuid::new_v4(), 1.0, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_goal_reports_presence() {
        let db = test_db().await;
        let goal = make_goal("u1", "Stretch", 5);
        db.insert_goal(&goal).await.unwrap();
        assert!(db.delete_goal(goal.id).await.unwrap());
        assert!(!db.delete_goal(goal.id).await.unwrap());
    }

    // ── Conversation tests ──────────────────────────────────────────

    #[tokio::test]
    async fn conversation_messages_keep_insertion_order() {
        let db = test_db().await;
        db.ensure_conversation("s1", "u1").await.unwrap();
        db.add_conversation_message("s1", "user", "hello").await.unwrap();
        db.add_conversation_message("s1", "responder:fitness", "plan").await.unwrap();
        db.add_conversation_message("s1", "responder:wellness", "tips").await.unwrap();
        db.ensure_conversation("s1", "u1").await.unwrap();

        let messages = db.list_conversation_messages("s1").await.unwrap();
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "responder:fitness", "responder:wellness"]);
        assert!(db.list_conversation_messages("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("health.db");
        let goal = make_goal("u1", "Persist", 7);
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.insert_goal(&goal).await.unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let fetched = db.get_goal(goal.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Persist");
    }
}
