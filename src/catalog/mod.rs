//! Static fitness, nutrition, and wellness catalogs and the plan builders
//! that sample from them.
//!
//! Builders take the random source as a parameter. Selections vary between
//! calls; only the plan structure is fixed.

pub mod fitness;
pub mod nutrition;
pub mod wellness;

use std::fmt;

use regex::Regex;

/// What the user is working toward, as far as plan selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanGoal {
    WeightLoss,
    MuscleGain,
    Endurance,
    General,
}

impl fmt::Display for PlanGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WeightLoss => "weight loss",
            Self::MuscleGain => "muscle gain",
            Self::Endurance => "endurance",
            Self::General => "general fitness",
        })
    }
}

/// Structured input to the plan builders.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub goal: PlanGoal,
    pub level: String,
    pub duration_minutes: u32,
    pub dietary_preferences: Option<String>,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            goal: PlanGoal::General,
            level: "beginner".to_string(),
            duration_minutes: 45,
            dietary_preferences: None,
        }
    }
}

/// Derives a `PlanRequest` from free text (English and Chinese keywords).
pub struct PlanDetector {
    weight_loss: Regex,
    muscle_gain: Regex,
    endurance: Regex,
    level: Regex,
    duration: Regex,
    diet: Regex,
}

impl PlanDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            weight_loss: Regex::new(
                r"(?i)(weight[\s_-]?loss|lose\s+(some\s+)?weight|fat\s+loss|slim\s+down|减重|减肥|瘦身)",
            )?,
            muscle_gain: Regex::new(
                r"(?i)(muscle[\s_-]?gain|build\s+muscle|gain\s+muscle|bulk(ing)?\s+up|增肌|肌肉)",
            )?,
            endurance: Regex::new(r"(?i)(endurance|stamina|marathon|耐力)")?,
            level: Regex::new(r"(?i)\b(beginner|intermediate|advanced)\b")?,
            duration: Regex::new(r"(?i)(\d{1,3})\s*(min|mins|minutes|分钟)")?,
            diet: Regex::new(
                r"(?i)\b(vegetarian|vegan|pescatarian|gluten[\s-]?free|dairy[\s-]?free|lactose[\s-]?intolerant|halal|kosher|keto)\b|素食",
            )?,
        })
    }

    pub fn detect_goal(&self, text: &str) -> PlanGoal {
        if self.weight_loss.is_match(text) {
            PlanGoal::WeightLoss
        } else if self.muscle_gain.is_match(text) {
            PlanGoal::MuscleGain
        } else if self.endurance.is_match(text) {
            PlanGoal::Endurance
        } else {
            PlanGoal::General
        }
    }

    /// Build a request from the user's messages. Later messages win for
    /// goal and duration; dietary preferences accumulate.
    pub fn detect<'a>(&self, user_messages: impl IntoIterator<Item = &'a str>) -> PlanRequest {
        let mut request = PlanRequest::default();
        let mut goal_seen = false;
        let mut diets: Vec<String> = Vec::new();

        for text in user_messages {
            let goal = self.detect_goal(text);
            if goal != PlanGoal::General || !goal_seen {
                goal_seen |= goal != PlanGoal::General;
                request.goal = goal;
            }
            if let Some(m) = self.level.captures(text).and_then(|c| c.get(1)) {
                request.level = m.as_str().to_lowercase();
            }
            if let Some(minutes) = self
                .duration
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|m| *m > 0)
            {
                request.duration_minutes = minutes;
            }
            for m in self.diet.find_iter(text) {
                let pref = m.as_str().to_lowercase();
                if !diets.contains(&pref) {
                    diets.push(pref);
                }
            }
        }

        if !diets.is_empty() {
            request.dietary_preferences = Some(diets.join(", "));
        }
        request
    }
}

/// Append a numbered list of `name: detail` lines.
pub(crate) fn push_numbered<'a>(
    lines: &mut Vec<String>,
    start: usize,
    items: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> usize {
    let mut n = start;
    for (name, detail) in items {
        lines.push(format!("{n}. {name}: {detail}"));
        n += 1;
    }
    n
}
