//! Rule-based insight and motivation messages.
//!
//! Exercise counts fall into three bands: fewer than 3, 3 or 4, and 5 or
//! more. The middle band produces no exercise message.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::goals::model::Goal;
use crate::health::model::{HealthRecord, RecordType};
use crate::health::stats::mean_numeric;

const LOW_EXERCISE_COUNT: usize = 3;
const HIGH_EXERCISE_COUNT: usize = 5;
const LOW_MOOD: f64 = 5.0;
const GOOD_MOOD: f64 = 7.0;
const WEIGHT_DELTA_THRESHOLD: f64 = 1.0;
const DEADLINE_SOON_DAYS: i64 = 7;
const GOOD_PROGRESS_PERCENT: f64 = 75.0;

/// An observation derived from recent records.
#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    LowExercise,
    GreatExercise,
    LowMood,
    GoodMood,
    /// Newest minus oldest weight in the trailing 14 days.
    WeightChange(f64),
    /// Emitted alone when nothing else fires.
    KeepLogging,
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowExercise => f.write_str(
                "You exercised fewer than 3 times this week. Aim for 3 to 5 sessions a week.",
            ),
            Self::GreatExercise => {
                f.write_str("Great workout frequency this week, keep it up!")
            }
            Self::LowMood => f.write_str(
                "Your mood has been low lately. Try to make time for relaxing activities.",
            ),
            Self::GoodMood => f.write_str("Your mood has been good lately. Keep that positive outlook!"),
            Self::WeightChange(delta) => {
                let direction = if *delta > 0.0 { "gone up" } else { "gone down" };
                write!(
                    f,
                    "Your weight has {direction} by {:.1} kg recently. Keep diet and exercise in balance.",
                    delta.abs()
                )
            }
            Self::KeepLogging => f.write_str(
                "Keep logging your data and you will get more personalised suggestions.",
            ),
        }
    }
}

/// Apply the insight rules to recent records.
///
/// Records outside each rule's window are ignored, so callers may pass a
/// wider slice. The result is never empty.
pub fn generate_insights(records: &[HealthRecord], now: DateTime<Utc>) -> Vec<Insight> {
    let mut insights = Vec::new();
    let week_start = now - Duration::days(7);
    let week: Vec<HealthRecord> = records
        .iter()
        .filter(|r| r.recorded_at >= week_start)
        .cloned()
        .collect();

    let exercises = week
        .iter()
        .filter(|r| r.record_type == RecordType::Exercise)
        .count();
    if exercises < LOW_EXERCISE_COUNT {
        insights.push(Insight::LowExercise);
    } else if exercises >= HIGH_EXERCISE_COUNT {
        insights.push(Insight::GreatExercise);
    }

    if let Some(mood) = mean_numeric(&week, &RecordType::Mood) {
        if mood < LOW_MOOD {
            insights.push(Insight::LowMood);
        } else if mood >= GOOD_MOOD {
            insights.push(Insight::GoodMood);
        }
    }

    if let Some(delta) = weight_delta(records, now - Duration::days(14)) {
        if delta.abs() >= WEIGHT_DELTA_THRESHOLD {
            insights.push(Insight::WeightChange(delta));
        }
    }

    if insights.is_empty() {
        insights.push(Insight::KeepLogging);
    }
    insights
}

/// Newest minus oldest weight since `since`; needs two weighed records.
fn weight_delta(records: &[HealthRecord], since: DateTime<Utc>) -> Option<f64> {
    let mut weights: Vec<(DateTime<Utc>, f64)> = records
        .iter()
        .filter(|r| r.record_type == RecordType::Weight && r.recorded_at >= since)
        .filter_map(|r| r.numeric_value.map(|v| (r.recorded_at, v)))
        .collect();
    if weights.len() < 2 {
        return None;
    }
    weights.sort_by_key(|(at, _)| *at);
    let oldest = weights.first()?.1;
    let newest = weights.last()?.1;
    Some(newest - oldest)
}

/// Headline encouragement for the active goal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Motivation {
    CreateGoal,
    /// Goals due within a week (overdue ones included).
    DeadlineNear(usize),
    GoodProgress(usize),
    KeepGoing,
}

impl fmt::Display for Motivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateGoal => f.write_str("Set a new goal and start your journey!"),
            Self::DeadlineNear(n) => write!(f, "{n} goal(s) are due soon. Time for the final push!"),
            Self::GoodProgress(n) => write!(f, "{n} goal(s) are going well. Keep it up!"),
            Self::KeepGoing => {
                f.write_str("Every bit of effort brings you closer to your goals. Keep going!")
            }
        }
    }
}

/// Pick exactly one message; earlier rules win.
pub fn motivation_message(active: &[Goal], now: DateTime<Utc>) -> Motivation {
    if active.is_empty() {
        return Motivation::CreateGoal;
    }
    let due_soon = active
        .iter()
        .filter(|g| g.days_left(now) <= DEADLINE_SOON_DAYS)
        .count();
    if due_soon > 0 {
        return Motivation::DeadlineNear(due_soon);
    }
    let going_well = active
        .iter()
        .filter(|g| g.progress_percent() >= GOOD_PROGRESS_PERCENT)
        .count();
    if going_well > 0 {
        return Motivation::GoodProgress(going_well);
    }
    Motivation::KeepGoing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::model::{GoalCategory, GoalStatus};
    use uuid::Uuid;

    fn exercise(now: DateTime<Utc>, n: usize) -> Vec<HealthRecord> {
        (0..n)
            .map(|i| {
                HealthRecord::new("u", "exercise", "walk")
                    .with_numeric(30.0)
                    .at(now - Duration::hours(i as i64 * 12))
            })
            .collect()
    }

    fn weight(now: DateTime<Utc>, days_ago: i64, kg: f64) -> HealthRecord {
        HealthRecord::new("u", "weight", format!("{kg} kg"))
            .with_numeric(kg)
            .at(now - Duration::days(days_ago))
    }

    fn mood(now: DateTime<Utc>, value: f64) -> HealthRecord {
        HealthRecord::new("u", "mood", "mood").with_numeric(value).at(now)
    }

    fn goal(days: i64, current: f64) -> Goal {
        let now = Utc::now();
        Goal {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            title: "g".into(),
            description: "d".into(),
            category: GoalCategory::Fitness,
            target_value: 100.0,
            current_value: current,
            unit: "x".into(),
            deadline: now + Duration::days(days) + Duration::hours(1),
            status: GoalStatus::Active,
            created_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn low_exercise_fires_with_no_records() {
        let insights = generate_insights(&[], Utc::now());
        assert_eq!(insights, vec![Insight::LowExercise]);
    }

    #[test]
    fn middle_band_is_silent() {
        let now = Utc::now();
        for n in [3, 4] {
            let insights = generate_insights(&exercise(now, n), now);
            assert_eq!(insights, vec![Insight::KeepLogging], "count {n}");
        }
    }

    #[test]
    fn high_exercise_praised() {
        let now = Utc::now();
        let insights = generate_insights(&exercise(now, 5), now);
        assert_eq!(insights, vec![Insight::GreatExercise]);
    }

    #[test]
    fn old_exercise_is_ignored() {
        let now = Utc::now();
        let records: Vec<_> = exercise(now, 6)
            .into_iter()
            .map(|r| {
                let at = r.recorded_at - Duration::days(10);
                r.at(at)
            })
            .collect();
        assert_eq!(generate_insights(&records, now), vec![Insight::LowExercise]);
    }

    #[test]
    fn mood_bands() {
        let now = Utc::now();
        let mut records = exercise(now, 3);
        records.push(mood(now, 4.0));
        assert!(generate_insights(&records, now).contains(&Insight::LowMood));

        let mut records = exercise(now, 3);
        records.push(mood(now, 7.0));
        assert!(generate_insights(&records, now).contains(&Insight::GoodMood));

        let mut records = exercise(now, 3);
        records.push(mood(now, 6.0));
        assert_eq!(generate_insights(&records, now), vec![Insight::KeepLogging]);
    }

    #[test]
    fn weight_change_direction() {
        let now = Utc::now();
        let mut records = exercise(now, 3);
        records.push(weight(now, 0, 71.5));
        records.push(weight(now, 10, 70.0));
        let insights = generate_insights(&records, now);
        assert_eq!(insights, vec![Insight::WeightChange(1.5)]);
        assert!(insights[0].to_string().contains("gone up by 1.5 kg"));

        let mut records = exercise(now, 3);
        records.push(weight(now, 1, 68.0));
        records.push(weight(now, 12, 70.0));
        records.push(weight(now, 30, 90.0));
        let insights = generate_insights(&records, now);
        assert_eq!(insights, vec![Insight::WeightChange(-2.0)]);
    }

    #[test]
    fn small_weight_change_ignored() {
        let now = Utc::now();
        let mut records = exercise(now, 3);
        records.push(weight(now, 0, 70.5));
        records.push(weight(now, 5, 70.0));
        assert_eq!(generate_insights(&records, now), vec![Insight::KeepLogging]);
    }

    #[test]
    fn motivation_priority() {
        let now = Utc::now();
        assert_eq!(motivation_message(&[], now), Motivation::CreateGoal);
        assert_eq!(
            motivation_message(&[goal(3, 90.0), goal(30, 80.0)], now),
            Motivation::DeadlineNear(1)
        );
        assert_eq!(
            motivation_message(&[goal(30, 80.0), goal(40, 75.0), goal(40, 10.0)], now),
            Motivation::GoodProgress(2)
        );
        assert_eq!(motivation_message(&[goal(30, 10.0)], now), Motivation::KeepGoing);
    }

    #[test]
    fn overdue_goal_counts_as_due_soon() {
        let now = Utc::now();
        assert_eq!(motivation_message(&[goal(-5, 0.0)], now), Motivation::DeadlineNear(1));
    }
}
