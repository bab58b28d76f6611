//! Interactive shell: reads lines from stdin and dispatches commands.
//!
//! Slash commands go straight to the goal engine and the store. Free text
//! is handed to the orchestrator when one is configured.

use std::fmt::Write as _;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::{Stream, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use uuid::Uuid;

use crate::agent::command::HELP;
use crate::agent::{Command, Orchestrator, RunOutcome, TerminationReason};
use crate::error::Error;
use crate::goals::{
    Goal, GoalEngine, GoalTemplate, NewGoal, ProgressBand, TemplateOverrides, deadline_after,
    generate_insights, motivation_message,
};
use crate::health::{HealthRecord, RecordType, UserProfile, stats};
use crate::store::Database;

/// Number of goals in the quick view shown by `/stats`.
const QUICK_VIEW_SIZE: usize = 3;

pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Non-empty, trimmed stdin lines until EOF.
pub fn stdin_lines() -> LineStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    }))
}

/// What the shell wants printed, and whether to stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellReply {
    pub text: String,
    pub quit: bool,
}

impl ShellReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

pub struct Shell {
    goals: GoalEngine,
    store: Arc<dyn Database>,
    orchestrator: Option<Orchestrator>,
    user_id: String,
    session_id: String,
}

impl Shell {
    pub fn new(
        store: Arc<dyn Database>,
        orchestrator: Option<Orchestrator>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            goals: GoalEngine::new(Arc::clone(&store)),
            store,
            orchestrator,
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub async fn handle(&self, command: Command, now: DateTime<Utc>) -> Result<ShellReply, Error> {
        let text = match command {
            Command::Chat(text) => self.chat(&text).await,
            Command::Goals => self.active_goals(now).await?,
            Command::Completed => self.completed_goals(now).await?,
            Command::NewGoal {
                template,
                target,
                days,
            } => self.new_goal(template, target, days, now).await?,
            Command::NewCustomGoal {
                category,
                target,
                unit,
                days,
                title,
                description,
            } => {
                let input = NewGoal {
                    title,
                    description,
                    category,
                    target_value: target,
                    unit,
                    deadline: deadline_after(now, days)?,
                };
                let id = self.goals.create_goal(&self.user_id, input, now).await?;
                self.created(id, now).await?
            }
            Command::Progress { goal, value } => self.progress(&goal, value, now).await?,
            Command::Pause { goal } => {
                let goal = self.goals.resolve_goal(&self.user_id, &goal).await?;
                let goal = self.goals.pause_goal(goal.id).await?;
                format!("Paused \"{}\".", goal.title)
            }
            Command::Log {
                record_type,
                value,
                numeric_value,
                notes,
            } => {
                let mut record = HealthRecord::new(&self.user_id, record_type, value).at(now);
                if let Some(n) = numeric_value {
                    record = record.with_numeric(n);
                }
                if !notes.is_empty() {
                    record = record.with_notes(notes);
                }
                self.store.insert_record(&record).await?;
                let mut text = format!("Logged {} = {}.", record.record_type, record.value);
                if record.record_type == RecordType::Exercise && record.numeric_value.is_none() {
                    text.push_str(" No minutes recorded; use e.g. /log exercise 30 to count them.");
                }
                text
            }
            Command::Insights => {
                let records = self
                    .store
                    .records_since(&self.user_id, None, now - Duration::days(14))
                    .await?;
                generate_insights(&records, now)
                    .iter()
                    .map(|i| format!("- {i}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Command::Motivation => {
                let active = self.goals.list_active(&self.user_id).await?;
                motivation_message(&active, now).to_string()
            }
            Command::Stats => self.stats(now).await?,
            Command::Profile(None) => format_profile(&self.store.ensure_profile(&self.user_id).await?),
            Command::Profile(Some(update)) => {
                self.store.ensure_profile(&self.user_id).await?;
                let profile = self.store.update_profile(&self.user_id, &update).await?;
                format!("Profile updated.\n{}", format_profile(&profile))
            }
            Command::Templates => GoalTemplate::ALL
                .iter()
                .map(|t| {
                    format!(
                        "{:<12} {} ({} {} in {} days)",
                        t.key(),
                        t.name(),
                        t.default_target(),
                        t.unit(),
                        t.default_days()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Help => HELP.to_string(),
            Command::Quit => {
                return Ok(ShellReply {
                    text: "Goodbye.".to_string(),
                    quit: true,
                });
            }
            Command::Invalid(message) => message,
        };
        Ok(ShellReply::text(text))
    }

    async fn chat(&self, text: &str) -> String {
        match &self.orchestrator {
            Some(orchestrator) => format_run(&orchestrator.run(text, &self.session_id).await),
            None => "Chat is disabled until OPENAI_API_KEY is set. Slash commands still work; try /help."
                .to_string(),
        }
    }

    async fn active_goals(&self, now: DateTime<Utc>) -> Result<String, Error> {
        let active = self.goals.list_active(&self.user_id).await?;
        if active.is_empty() {
            return Ok("No active goals. Create one with /goal <template>.".to_string());
        }
        Ok(active
            .iter()
            .map(|g| format_active(g, now))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn completed_goals(&self, now: DateTime<Utc>) -> Result<String, Error> {
        let completed = self.goals.list_completed(&self.user_id).await?;
        if completed.is_empty() {
            return Ok("No completed goals yet.".to_string());
        }

        let mut out = String::new();
        for goal in &completed {
            let _ = write!(out, "{} {} ({} {})", short_id(goal), goal.title, goal.current_value, goal.unit);
            if let Some(over) = goal.overachievement_percent() {
                let _ = write!(out, ", {over:.0}% over target");
            }
            if let Some(days) = goal.days_taken() {
                let _ = write!(out, ", {days} days");
            }
            out.push('\n');
        }

        let achievements = self.goals.achievement_stats(&self.user_id, now).await?;
        let _ = write!(
            out,
            "Total {}, this month {}, average {:.1} days",
            achievements.total, achievements.completed_this_month, achievements.average_days_taken
        );
        if let Some(category) = achievements.top_category {
            let _ = write!(out, ", mostly {category}");
        }
        Ok(out)
    }

    async fn new_goal(
        &self,
        template: GoalTemplate,
        target: Option<f64>,
        days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        let overrides = TemplateOverrides {
            title: None,
            target,
            days,
        };
        let id = self
            .goals
            .create_from_template(&self.user_id, template, &overrides, now)
            .await?;
        self.created(id, now).await
    }

    async fn created(&self, id: Uuid, now: DateTime<Utc>) -> Result<String, Error> {
        let goal = self.goals.get_goal(id).await?;
        Ok(format!("Created goal {}.\n{}", goal.id, format_active(&goal, now)))
    }

    async fn progress(&self, reference: &str, value: f64, now: DateTime<Utc>) -> Result<String, Error> {
        let goal = self.goals.resolve_goal(&self.user_id, reference).await?;
        let update = self.goals.update_progress(goal.id, value, now).await?;
        let goal = &update.goal;
        let mut text = format!(
            "{}: {} / {} {} ({:.0}%)",
            goal.title,
            goal.current_value,
            goal.target_value,
            goal.unit,
            goal.progress_percent()
        );
        if update.just_completed {
            text.push_str("\nGoal complete, well done!");
        }
        Ok(text)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<String, Error> {
        let dashboard = stats::dashboard_stats(self.store.as_ref(), &self.user_id, now).await?;
        let week = self
            .store
            .records_since(&self.user_id, None, now - Duration::days(7))
            .await?;
        let today: Vec<HealthRecord> = week
            .iter()
            .filter(|r| r.recorded_at >= stats::start_of_day(now))
            .cloned()
            .collect();
        let week_stats = stats::week_stats(&week);
        let daily = stats::daily_progress(&today);
        let goal_stats = self.goals.goal_stats(&self.user_id, now).await?;
        let quick = self.goals.quick_view(&self.user_id, now, QUICK_VIEW_SIZE).await?;

        let mut out = String::new();
        let _ = writeln!(out, "Weight: {:.1} kg   Mood: {:.1}", dashboard.current_weight, dashboard.latest_mood);
        let _ = writeln!(
            out,
            "Exercise: {} today, {} this week",
            dashboard.today_exercises, dashboard.week_exercises
        );
        if let Some(mood) = week_stats.average_mood {
            let _ = writeln!(out, "Average mood this week: {mood:.1}");
        }
        let _ = writeln!(
            out,
            "Today: {:.0} exercise minutes ({:.0}%), {} cups of water ({:.0}%)",
            daily.exercise_minutes, daily.exercise_percent, daily.water_cups, daily.water_percent
        );
        let _ = writeln!(
            out,
            "Goals: {} active, {} completed ({} this month), average progress {:.0}%",
            goal_stats.active, goal_stats.completed, goal_stats.completed_this_month, goal_stats.average_progress
        );
        for entry in &quick.entries {
            let _ = writeln!(
                out,
                "  {} {:.0}% [{}]",
                entry.goal.title,
                entry.progress_percent.min(100.0),
                entry.urgency.label()
            );
        }
        if quick.remaining > 0 {
            let _ = writeln!(out, "  ...and {} more", quick.remaining);
        }
        Ok(out.trim_end().to_string())
    }
}

fn short_id(goal: &Goal) -> String {
    goal.id.to_string().chars().take(8).collect()
}

fn band_marker(percent: f64) -> &'static str {
    match ProgressBand::from_percent(percent) {
        ProgressBand::Done => "done",
        ProgressBand::Good => "good",
        ProgressBand::Fair => "fair",
        ProgressBand::Low => "low",
    }
}

fn format_active(goal: &Goal, now: DateTime<Utc>) -> String {
    let percent = goal.progress_percent();
    format!(
        "{} {} {}/{} {} ({:.0}%, {}) [{}] due {}",
        short_id(goal),
        goal.title,
        goal.current_value,
        goal.target_value,
        goal.unit,
        percent.min(100.0),
        band_marker(percent),
        goal.urgency(now).label(),
        goal.deadline.format("%Y-%m-%d")
    )
}

fn format_profile(profile: &UserProfile) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let num = |v: Option<f64>| v.map(|n| format!("{n}")).unwrap_or_else(|| "-".to_string());
    format!(
        "Name: {}\nAge: {}\nGender: {}\nHeight: {} cm\nWeight: {} kg\nActivity: {}\nGoal: {}\nConditions: {}\nDiet: {}",
        profile.name,
        profile.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
        opt(&profile.gender),
        num(profile.height_cm),
        num(profile.weight_kg),
        opt(&profile.activity_level),
        opt(&profile.fitness_goal),
        opt(&profile.health_conditions),
        opt(&profile.dietary_preferences),
    )
}

/// Render an orchestration run for the terminal.
pub fn format_run(outcome: &RunOutcome) -> String {
    let mut parts: Vec<String> = outcome
        .responses
        .iter()
        .map(|(kind, text)| format!("[{kind}]\n{text}"))
        .collect();
    if let Some(ref notice) = outcome.notice {
        parts.push(notice.clone());
    }
    if outcome.termination == TerminationReason::FinishedByStepLimit {
        parts.push("(This conversation reached its step limit and may be incomplete.)".to_string());
    }
    parts.join("\n\n")
}
