//! Health records and the user profile.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record type tag. The insight rules recognise the named variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Weight,
    Exercise,
    Mood,
    Water,
    Sleep,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Weight => "weight",
            Self::Exercise => "exercise",
            Self::Mood => "mood",
            Self::Water => "water",
            Self::Sleep => "sleep",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weight" => Self::Weight,
            "exercise" => Self::Exercise,
            "mood" => Self::Mood,
            "water" => Self::Water,
            "sleep" => Self::Sleep,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<RecordType> for String {
    fn from(t: RecordType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-stamped health observation. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub user_id: String,
    pub record_type: RecordType,
    /// Display value, e.g. "70.5 kg" or "running 30 min".
    pub value: String,
    /// Numeric value consumed by statistics and insights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub recorded_at: DateTime<Utc>,
}

impl HealthRecord {
    pub fn new(
        user_id: impl Into<String>,
        record_type: impl Into<RecordType>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            record_type: record_type.into(),
            value: value.into(),
            numeric_value: None,
            notes: String::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Builder: set the numeric value.
    pub fn with_numeric(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }

    /// Builder: set notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Builder: override the timestamp.
    pub fn at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }
}

/// Per-user demographic and preference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub fitness_goal: Option<String>,
    pub health_conditions: Option<String>,
    pub dietary_preferences: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// The profile every user starts with.
    pub fn default_for(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            name: "User".to_string(),
            age: Some(25),
            gender: None,
            height_cm: Some(170.0),
            weight_kg: Some(65.0),
            activity_level: Some("lightly active".to_string()),
            fitness_goal: Some("stay healthy".to_string()),
            health_conditions: None,
            dietary_preferences: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub fitness_goal: Option<String>,
    pub health_conditions: Option<String>,
    pub dietary_preferences: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.height_cm.is_none()
            && self.weight_kg.is_none()
            && self.activity_level.is_none()
            && self.fitness_goal.is_none()
            && self.health_conditions.is_none()
            && self.dietary_preferences.is_none()
    }

    /// Set one field by name from its text form.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        let number = |v: &str| {
            v.parse::<f64>()
                .map_err(|_| format!("{key} must be a number, got '{v}'"))
        };
        match key {
            "name" => self.name = Some(value.to_string()),
            "age" => {
                self.age = Some(
                    value
                        .parse()
                        .map_err(|_| format!("age must be a whole number, got '{value}'"))?,
                )
            }
            "gender" => self.gender = Some(value.to_string()),
            "height" | "height_cm" => self.height_cm = Some(number(value)?),
            "weight" | "weight_kg" => self.weight_kg = Some(number(value)?),
            "activity_level" | "activity" => self.activity_level = Some(value.to_string()),
            "fitness_goal" | "goal" => self.fitness_goal = Some(value.to_string()),
            "health_conditions" | "conditions" => self.health_conditions = Some(value.to_string()),
            "dietary_preferences" | "diet" => self.dietary_preferences = Some(value.to_string()),
            other => return Err(format!("unknown profile field: {other}")),
        }
        Ok(())
    }

    /// Merge into an existing profile, bumping `updated_at`.
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(ref v) = self.name {
            profile.name = v.clone();
        }
        if let Some(v) = self.age {
            profile.age = Some(v);
        }
        if let Some(ref v) = self.gender {
            profile.gender = Some(v.clone());
        }
        if let Some(v) = self.height_cm {
            profile.height_cm = Some(v);
        }
        if let Some(v) = self.weight_kg {
            profile.weight_kg = Some(v);
        }
        if let Some(ref v) = self.activity_level {
            profile.activity_level = Some(v.clone());
        }
        if let Some(ref v) = self.fitness_goal {
            profile.fitness_goal = Some(v.clone());
        }
        if let Some(ref v) = self.health_conditions {
            profile.health_conditions = Some(v.clone());
        }
        if let Some(ref v) = self.dietary_preferences {
            profile.dietary_preferences = Some(v.clone());
        }
        profile.updated_at = Utc::now();
    }
}
