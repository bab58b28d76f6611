//! REPL command parsing.
//!
//! Slash commands act on the goal engine and store directly. Anything else
//! is a chat message for the orchestrator.

use crate::goals::{GoalCategory, GoalTemplate, MAX_GOAL_DAYS};
use crate::health::{ProfileUpdate, RecordType};

/// Parsed REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free text for the orchestrator.
    Chat(String),

    /// List active goals, soonest deadline first.
    Goals,

    /// List completed goals.
    Completed,

    /// Create a goal from a template.
    NewGoal {
        template: GoalTemplate,
        target: Option<f64>,
        days: Option<i64>,
    },

    /// Create a goal with user-chosen fields.
    NewCustomGoal {
        category: GoalCategory,
        target: f64,
        unit: String,
        days: i64,
        title: String,
        description: String,
    },

    /// Set a goal's current value.
    Progress {
        /// Full goal id or a unique prefix of it.
        goal: String,
        value: f64,
    },

    /// Pause a goal.
    Pause { goal: String },

    /// Add a health record.
    Log {
        record_type: RecordType,
        value: String,
        numeric_value: Option<f64>,
        notes: String,
    },

    Insights,
    Motivation,
    Stats,

    /// Show the profile, or merge the given fields into it.
    Profile(Option<ProfileUpdate>),

    Templates,
    Help,
    Quit,

    /// Recognised command with bad arguments.
    Invalid(String),
}

impl Command {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

pub const HELP: &str = "\
Commands:
  /goals                          active goals
  /completed                      completed goals
  /goal <template> [target] [days] create a goal from a template
  /goal custom <category> <target> <unit> <days> <title> [| description]
                                  create a goal of your own
  /progress <id> <value>          update a goal's progress
  /pause <id>                     pause a goal
  /log <type> <value> [note]      log a health record (weight, exercise, mood, water, sleep, ...)
  /insights                       insights from recent records
  /motivation                     a motivational nudge
  /stats                          dashboard and goal statistics
  /profile [field=value ...]      show or update your profile
  /templates                      list goal templates
  /help                           this help
  /quit                           exit
Anything else is sent to the assistant.";

/// Parses REPL lines into commands.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(input: &str) -> Command {
        let trimmed = input.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/goals" | "/active" => Command::Goals,
            "/completed" | "/achievements" => Command::Completed,
            "/insights" => Command::Insights,
            "/motivation" | "/motivate" => Command::Motivation,
            "/stats" | "/dashboard" => Command::Stats,
            "/profile" => Command::Profile(None),
            "/templates" => Command::Templates,
            "/help" | "/?" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Self::parse_complex(trimmed),
        }
    }

    fn parse_complex(content: &str) -> Command {
        Self::parse_new_goal(content)
            .or_else(|| Self::parse_progress(content))
            .or_else(|| Self::parse_pause(content))
            .or_else(|| Self::parse_log(content))
            .or_else(|| Self::parse_profile(content))
            .unwrap_or_else(|| {
                if content.starts_with('/') {
                    let name = content.split_whitespace().next().unwrap_or(content);
                    Command::invalid(format!("Unknown command {name}. Type /help."))
                } else {
                    Command::Chat(content.to_string())
                }
            })
    }

    /// Split `/name rest...` when the command name matches.
    fn args<'a>(content: &'a str, name: &str) -> Option<Vec<&'a str>> {
        let mut parts = content.split_whitespace();
        let head = parts.next()?;
        head.eq_ignore_ascii_case(name).then(|| parts.collect())
    }

    fn parse_new_goal(content: &str) -> Option<Command> {
        let args = Self::args(content, "/goal")?;
        let Some(key) = args.first() else {
            return Some(Command::invalid("Usage: /goal <template> [target] [days]"));
        };
        if key.eq_ignore_ascii_case("custom") {
            return Some(Self::parse_custom_goal(&args[1..]));
        }
        let template = match key.parse::<GoalTemplate>() {
            Ok(t) => t,
            Err(e) => return Some(Command::invalid(e)),
        };
        let target = match args.get(1).map(|v| v.parse::<f64>()) {
            None => None,
            Some(Ok(v)) => Some(v),
            Some(Err(_)) => return Some(Command::invalid("Target must be a number")),
        };
        let days = match args.get(2).map(|v| parse_days(v)) {
            None => None,
            Some(Ok(v)) => Some(v),
            Some(Err(e)) => return Some(e),
        };
        Some(Command::NewGoal {
            template,
            target,
            days,
        })
    }

    /// `<category> <target> <unit> <days> <title...> [| description...]`
    fn parse_custom_goal(args: &[&str]) -> Command {
        const USAGE: &str =
            "Usage: /goal custom <category> <target> <unit> <days> <title> [| description]";
        let [category, target, unit, days, rest @ ..] = args else {
            return Command::invalid(USAGE);
        };
        let Ok(target) = target.parse::<f64>() else {
            return Command::invalid("Target must be a number");
        };
        let days = match parse_days(days) {
            Ok(days) => days,
            Err(e) => return e,
        };
        let text = rest.join(" ");
        let (title, description) = match text.split_once('|') {
            Some((title, description)) => (title.trim(), description.trim()),
            None => (text.trim(), ""),
        };
        if title.is_empty() {
            return Command::invalid(USAGE);
        }
        Command::NewCustomGoal {
            category: GoalCategory::from(*category),
            target,
            unit: unit.to_string(),
            days,
            title: title.to_string(),
            description: if description.is_empty() {
                title.to_string()
            } else {
                description.to_string()
            },
        }
    }

    fn parse_progress(content: &str) -> Option<Command> {
        let args = Self::args(content, "/progress")?;
        let [goal, value] = args.as_slice() else {
            return Some(Command::invalid("Usage: /progress <id> <value>"));
        };
        Some(match value.parse::<f64>() {
            Ok(value) => Command::Progress {
                goal: goal.to_string(),
                value,
            },
            Err(_) => Command::invalid(format!("Progress must be a number, got '{value}'")),
        })
    }

    fn parse_pause(content: &str) -> Option<Command> {
        let args = Self::args(content, "/pause")?;
        Some(match args.as_slice() {
            [goal] => Command::Pause {
                goal: goal.to_string(),
            },
            _ => Command::invalid("Usage: /pause <id>"),
        })
    }

    fn parse_log(content: &str) -> Option<Command> {
        let args = Self::args(content, "/log")?;
        let [record_type, value, notes @ ..] = args.as_slice() else {
            return Some(Command::invalid("Usage: /log <type> <value> [note]"));
        };
        let record_type = RecordType::from(*record_type);
        let numeric_value = parse_measurement(value);
        if numeric_value.is_none() && needs_number(&record_type) {
            return Some(Command::invalid(format!(
                "{record_type} needs a number, e.g. /log {record_type} {}",
                example_value(&record_type)
            )));
        }
        Some(Command::Log {
            record_type,
            value: value.to_string(),
            numeric_value,
            notes: notes.join(" "),
        })
    }

    fn parse_profile(content: &str) -> Option<Command> {
        let args = Self::args(content, "/profile")?;
        let mut update = ProfileUpdate::default();
        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                return Some(Command::invalid(format!(
                    "Expected field=value, got '{arg}'"
                )));
            };
            // Underscores stand in for spaces in values.
            let value = value.replace('_', " ");
            if let Err(e) = update.set_field(&key.to_lowercase(), &value) {
                return Some(Command::invalid(e));
            }
        }
        Some(Command::Profile(Some(update)))
    }
}

fn parse_days(value: &str) -> Result<i64, Command> {
    match value.parse::<i64>() {
        Ok(days) if (1..=MAX_GOAL_DAYS).contains(&days) => Ok(days),
        _ => Err(Command::invalid(format!(
            "Days must be a whole number from 1 to {MAX_GOAL_DAYS}"
        ))),
    }
}

/// Number with an optional trailing unit, e.g. `70kg` or `30min`.
fn parse_measurement(value: &str) -> Option<f64> {
    value
        .trim_end_matches(|c: char| c.is_alphabetic() || c == '/')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Weight, mood and water readings are meaningless without a number.
fn needs_number(record_type: &RecordType) -> bool {
    matches!(
        record_type,
        RecordType::Weight | RecordType::Mood | RecordType::Water
    )
}

fn example_value(record_type: &RecordType) -> &'static str {
    match record_type {
        RecordType::Weight => "70.5",
        RecordType::Mood => "7",
        _ => "8",
    }
}
