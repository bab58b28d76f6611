//! Goal lifecycle through the engine and the libSQL store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use health_assist::error::GoalError;
use health_assist::goals::{
    Goal, GoalCategory, GoalEngine, GoalStatus, GoalTemplate, NewGoal, TemplateOverrides, Urgency,
};
use health_assist::store::{Database, LibSqlBackend};

async fn setup() -> (GoalEngine, Arc<dyn Database>) {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    (GoalEngine::new(Arc::clone(&db)), db)
}

fn goal(title: &str, target: f64, unit: &str, days: i64) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: format!("Work toward {title}"),
        category: GoalCategory::Fitness,
        target_value: target,
        unit: unit.to_string(),
        deadline: Utc::now() + Duration::days(days),
    }
}

fn assert_completion_invariant(goal: &Goal) {
    assert_eq!(
        goal.status == GoalStatus::Completed,
        goal.completed_at.is_some(),
        "goal {} violates completed/completed_at pairing",
        goal.id
    );
}

#[tokio::test]
async fn run_10km_round_trip() {
    let (engine, _) = setup().await;
    let now = Utc::now();

    let id = engine
        .create_goal("u", goal("Run 10km", 10.0, "km", 60), now)
        .await
        .unwrap();
    let update = engine.update_progress(id, 10.0, now).await.unwrap();
    assert!(update.just_completed);
    assert_eq!(update.status(), GoalStatus::Completed);

    let active = engine.list_active("u").await.unwrap();
    assert!(active.iter().all(|g| g.id != id));

    let completed = engine.list_completed("u").await.unwrap();
    let done = completed.iter().find(|g| g.id == id).unwrap();
    assert_eq!(done.current_value, 10.0);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn overachievement_is_stored_unclamped() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    let id = engine
        .create_goal("u", goal("Push-ups", 50.0, "reps", 30), now)
        .await
        .unwrap();

    let update = engine.update_progress(id, 80.0, now).await.unwrap();
    assert_eq!(update.goal.status, GoalStatus::Completed);
    assert_eq!(update.goal.current_value, 80.0);
    assert_eq!(GoalEngine::compute_progress(&update.goal), 160.0);
    let over = update.goal.overachievement_percent().unwrap();
    assert!((over - 60.0).abs() < 1e-9);
}

#[tokio::test]
async fn completed_is_terminal() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    let id = engine
        .create_goal("u", goal("Swim", 5.0, "km", 30), now)
        .await
        .unwrap();
    let first = engine.update_progress(id, 6.0, now).await.unwrap();
    let completed_at = first.goal.completed_at;

    // Lowering the value later leaves completion untouched.
    let later = now + Duration::days(1);
    let second = engine.update_progress(id, 2.0, later).await.unwrap();
    assert!(!second.just_completed);
    assert_eq!(second.goal.status, GoalStatus::Completed);
    assert_eq!(second.goal.current_value, 2.0);
    assert_eq!(second.goal.completed_at, completed_at);
}

#[tokio::test]
async fn pausing_completed_goal_fails_and_changes_nothing() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    let id = engine
        .create_goal("u", goal("Cycle", 20.0, "km", 30), now)
        .await
        .unwrap();
    engine.update_progress(id, 25.0, now).await.unwrap();
    let before = engine.get_goal(id).await.unwrap();

    let err = engine.pause_goal(id).await.unwrap_err();
    assert!(matches!(err, GoalError::InvalidState { .. }));

    let after = engine.get_goal(id).await.unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.current_value, before.current_value);
    assert_eq!(after.completed_at, before.completed_at);
}

#[tokio::test]
async fn paused_goal_does_not_complete() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    let id = engine
        .create_goal("u", goal("Walk", 10.0, "km", 30), now)
        .await
        .unwrap();
    let paused = engine.pause_goal(id).await.unwrap();
    assert_eq!(paused.status, GoalStatus::Paused);

    let update = engine.update_progress(id, 12.0, now).await.unwrap();
    assert_eq!(update.goal.status, GoalStatus::Paused);
    assert_eq!(update.goal.current_value, 12.0);
    assert_completion_invariant(&update.goal);
    assert_eq!(engine.list_paused("u").await.unwrap().len(), 1);
    assert!(engine.list_active("u").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_and_invalid_updates() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    let err = engine
        .update_progress(uuid::Uuid::new_v4(), 1.0, now)
        .await
        .unwrap_err();
    assert!(matches!(err, GoalError::NotFound { .. }));

    let id = engine
        .create_goal("u", goal("Row", 3.0, "km", 10), now)
        .await
        .unwrap();
    let err = engine.update_progress(id, -1.0, now).await.unwrap_err();
    assert!(matches!(err, GoalError::Validation(_)));
    assert_eq!(engine.get_goal(id).await.unwrap().current_value, 0.0);

    let err = engine.pause_goal(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, GoalError::NotFound { .. }));
}

#[tokio::test]
async fn list_active_sorted_by_deadline() {
    let (engine, _) = setup().await;
    let now = Utc::now();
    for (title, days) in [("far", 90), ("near", 2), ("mid", 20), ("overdue", -3)] {
        engine
            .create_goal("u", goal(title, 1.0, "x", days), now)
            .await
            .unwrap();
    }

    let active = engine.list_active("u").await.unwrap();
    let titles: Vec<&str> = active.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["overdue", "near", "mid", "far"]);
    assert!(active.windows(2).all(|w| w[0].deadline <= w[1].deadline));

    assert_eq!(GoalEngine::classify_urgency(&active[0], now), Urgency::Overdue);
    assert!(matches!(
        GoalEngine::classify_urgency(&active[1], now),
        Urgency::Urgent(_)
    ));
}

#[tokio::test]
async fn invariant_holds_across_many_updates() {
    let (engine, db) = setup().await;
    let now = Utc::now();
    let mut ids = Vec::new();
    for i in 1..=6 {
        ids.push(
            engine
                .create_goal("u", goal(&format!("goal {i}"), i as f64, "x", 10 + i), now)
                .await
                .unwrap(),
        );
    }
    engine.pause_goal(ids[0]).await.unwrap();
    for (i, id) in ids.iter().enumerate() {
        engine
            .update_progress(*id, (i as f64) * 1.5, now)
            .await
            .unwrap();
    }

    for status in [GoalStatus::Active, GoalStatus::Completed, GoalStatus::Paused] {
        for g in db.list_goals_by_status("u", status).await.unwrap() {
            assert_eq!(g.status, status);
            assert_completion_invariant(&g);
            assert!(g.current_value >= 0.0);
        }
    }
}

#[tokio::test]
async fn template_goals_use_engine_validation() {
    let (engine, _) = setup().await;
    let now = Utc::now();

    let id = engine
        .create_from_template("u", GoalTemplate::Water, &TemplateOverrides::default(), now)
        .await
        .unwrap();
    let water = engine.get_goal(id).await.unwrap();
    assert_eq!(water.target_value, GoalTemplate::Water.default_target());
    assert_eq!(water.unit, GoalTemplate::Water.unit());

    let bad = TemplateOverrides {
        target: Some(0.0),
        ..Default::default()
    };
    let err = engine
        .create_from_template("u", GoalTemplate::Sleep, &bad, now)
        .await
        .unwrap_err();
    assert!(matches!(err, GoalError::Validation(_)));
}
