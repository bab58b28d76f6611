//! Health records, user profile, and dashboard statistics.

pub mod model;
pub mod stats;

pub use model::{HealthRecord, ProfileUpdate, RecordType, UserProfile};
pub use stats::{DailyProgress, DashboardStats, WeekStats};
