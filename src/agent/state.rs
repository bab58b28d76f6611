//! Per-run conversation state shared by the router and the responders.

use std::fmt;
use std::str::FromStr;

use crate::agent::router::{ResponderKind, RoutingDecision};
use crate::llm::ChatMessage;
use crate::store::ConversationMessage;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Responder(ResponderKind),
    /// Routing bookkeeping. Never shown to the user or sent to a model.
    Control,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Responder(kind) => write!(f, "responder:{kind}"),
            Self::Control => f.write_str("control"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "control" => Ok(Self::Control),
            other => other
                .strip_prefix("responder:")
                .ok_or_else(|| format!("unknown message role: {other}"))?
                .parse()
                .map(Self::Responder),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Ordered, append-only message log plus the latest routing decision.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<StateMessage>,
    /// Most recent routing decision, if any was made this run.
    pub next: Option<RoutingDecision>,
}

impl ConversationState {
    /// Rebuild from stored messages. Rows with roles this build does not
    /// know are skipped.
    pub fn from_stored(stored: &[ConversationMessage]) -> Self {
        let messages = stored
            .iter()
            .filter_map(|m| match m.role.parse::<MessageRole>() {
                Ok(role) => Some(StateMessage {
                    role,
                    content: m.content.clone(),
                }),
                Err(e) => {
                    tracing::warn!(message_id = %m.id, "Skipping stored message: {e}");
                    None
                }
            })
            .collect();
        Self {
            messages,
            next: None,
        }
    }

    pub fn messages(&self) -> &[StateMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) -> &StateMessage {
        self.messages.push(StateMessage {
            role,
            content: content.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &StateMessage {
        self.push(MessageRole::User, content)
    }

    pub fn user_texts(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    /// Model-facing view: control messages dropped, responder turns tagged
    /// with the responder's name.
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter_map(|m| match m.role {
                MessageRole::User => Some(ChatMessage::user(m.content.clone())),
                MessageRole::Responder(kind) => {
                    Some(ChatMessage::assistant(m.content.clone()).with_name(kind.label()))
                }
                MessageRole::Control => None,
            })
            .collect()
    }
}
