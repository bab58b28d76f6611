//! Goal tracking: lifecycle, progress, urgency, insights, and statistics.

pub mod engine;
pub mod insights;
pub mod model;
pub mod stats;
pub mod templates;

pub use engine::{GoalEngine, QuickView, QuickViewEntry};
pub use insights::{Insight, Motivation, generate_insights, motivation_message};
pub use model::{Goal, GoalCategory, GoalStatus, NewGoal, ProgressBand, ProgressUpdate, Urgency};
pub use templates::{GoalTemplate, MAX_GOAL_DAYS, TemplateOverrides, deadline_after};
