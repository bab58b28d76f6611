//! Router: picks the next responder or ends the run.
//!
//! The classifier's raw label is parsed into a closed `RoutingDecision` at
//! this boundary. Anything outside the configured vocabulary is rejected.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::agent::state::ConversationState;
use crate::error::{Error, RoutingError};
use crate::llm::{ChatMessage, Classifier};

/// Sentinel label that ends a run.
pub const FINISH_LABEL: &str = "FINISH";

/// Specialist capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResponderKind {
    Fitness,
    Nutrition,
    Wellness,
}

impl ResponderKind {
    pub const ALL: [ResponderKind; 3] = [Self::Fitness, Self::Nutrition, Self::Wellness];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Nutrition => "nutrition",
            Self::Wellness => "wellness",
        }
    }

    /// One-line description used in the routing prompt.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Fitness => "fitness, exercise, and workout questions",
            Self::Nutrition => "nutrition, diet, and meal planning questions",
            Self::Wellness => "mental health, stress management, and lifestyle questions",
        }
    }
}

impl fmt::Display for ResponderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResponderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown responder: {s}"))
    }
}

/// What to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Dispatch(ResponderKind),
    Finish,
}

impl RoutingDecision {
    /// Parse a classifier label against the allowed responders.
    ///
    /// Matching is case-insensitive. Known responders that are not in
    /// `allowed` are rejected like any other unknown label.
    pub fn parse(label: &str, allowed: &[ResponderKind]) -> Result<Self, RoutingError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(RoutingError::EmptyDecision);
        }
        if label.eq_ignore_ascii_case(FINISH_LABEL) {
            return Ok(Self::Finish);
        }
        match label.parse::<ResponderKind>() {
            Ok(kind) if allowed.contains(&kind) => Ok(Self::Dispatch(kind)),
            _ => Err(RoutingError::UnknownLabel {
                label: label.to_string(),
                allowed: allowed_labels(allowed).join(", "),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dispatch(kind) => kind.label(),
            Self::Finish => FINISH_LABEL,
        }
    }
}

fn allowed_labels(allowed: &[ResponderKind]) -> Vec<&'static str> {
    allowed
        .iter()
        .map(ResponderKind::label)
        .chain(std::iter::once(FINISH_LABEL))
        .collect()
}

/// Build the supervisor instructions for a responder set.
pub fn system_prompt(allowed: &[ResponderKind]) -> String {
    let mut prompt = String::from(
        "You are the supervisor of a health assistant, managing a conversation between these specialists:\n",
    );
    for kind in allowed {
        prompt.push_str(&format!("- {}: {}\n", kind.label(), kind.summary()));
    }
    prompt.push_str(&format!(
        "\nRules:\n\
         1. Read the user's request carefully and pick the most suitable specialist.\n\
         2. If several specialists are needed, call them one at a time in a sensible order.\n\
         3. Once every part of the request has been addressed, answer {FINISH_LABEL}.\n\
         4. Focus on the user's main need and goal.\n\
         \nValid answers: {}",
        allowed_labels(allowed).join(", ")
    ));
    prompt
}

/// Makes one classification call per decision. Retries belong to the caller.
pub struct Router {
    classifier: Arc<dyn Classifier>,
    allowed: Vec<ResponderKind>,
    prompt: String,
}

impl Router {
    pub fn new(classifier: Arc<dyn Classifier>, allowed: Vec<ResponderKind>) -> Self {
        let prompt = system_prompt(&allowed);
        Self {
            classifier,
            allowed,
            prompt,
        }
    }

    pub fn allowed(&self) -> &[ResponderKind] {
        &self.allowed
    }

    /// Decide the next step. Service failures surface as `Error::Llm`,
    /// protocol violations as `Error::Routing`.
    pub async fn decide(&self, state: &ConversationState) -> Result<RoutingDecision, Error> {
        let mut history = vec![ChatMessage::system(self.prompt.clone())];
        history.extend(state.to_chat_messages());

        let labels = allowed_labels(&self.allowed);
        let raw = self.classifier.classify(&history, &labels).await?;
        let decision = RoutingDecision::parse(&raw, &self.allowed)?;
        debug!(raw = %raw, next = decision.label(), "Routing decision");
        Ok(decision)
    }
}
