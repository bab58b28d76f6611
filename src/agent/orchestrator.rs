//! Conversation orchestrator.
//!
//! Drives the router/responder loop as an explicit state machine:
//! `Routing -> Dispatching(kind) -> Routing -> ... -> Done`. One responder
//! runs at a time and sees every earlier reply of the run.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::responder::ResponderRegistry;
use crate::agent::router::{ResponderKind, Router, RoutingDecision};
use crate::agent::state::{ConversationState, MessageRole};
use crate::error::{Error, LlmError};
use crate::store::Database;

pub const DEGRADED_NOTICE: &str =
    "Sorry, I had trouble deciding how to continue, so this answer may be incomplete.";
pub const APOLOGY_NOTICE: &str =
    "Sorry, the assistant service is unavailable right now. Please try again in a moment.";

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The router returned `FINISH`.
    FinishedNormally,
    /// The step bound was reached before `FINISH`.
    FinishedByStepLimit,
    /// The router broke protocol; treated as a forced finish.
    RoutingRejected,
    /// A model call failed after retries; the step was aborted.
    ServiceUnavailable,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FinishedNormally => "finished_normally",
            Self::FinishedByStepLimit => "finished_by_step_limit",
            Self::RoutingRejected => "routing_rejected",
            Self::ServiceUnavailable => "service_unavailable",
        })
    }
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Replies in dispatch order. Control messages are never included.
    pub responses: Vec<(ResponderKind, String)>,
    pub termination: TerminationReason,
    /// User-visible notice for degraded or aborted runs.
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub user_id: String,
    pub max_steps: usize,
    pub service_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            user_id: "default".to_string(),
            max_steps: 15,
            service_retries: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Routing,
    Dispatching(ResponderKind),
}

pub struct Orchestrator {
    router: Router,
    registry: ResponderRegistry,
    store: Arc<dyn Database>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        router: Router,
        registry: ResponderRegistry,
        store: Arc<dyn Database>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            router,
            registry,
            store,
            config,
        }
    }

    /// Handle one user message within a session.
    ///
    /// Earlier turns of the session are loaded from the conversation log so
    /// the router and responders see them. Log failures are logged and do
    /// not fail the run.
    pub async fn run(&self, user_text: &str, session_id: &str) -> RunOutcome {
        let mut state = self.hydrate(session_id).await;
        self.record(&mut state, session_id, MessageRole::User, user_text)
            .await;

        let mut responses = Vec::new();
        let mut notice = None;
        let mut steps = 0usize;
        let mut phase = Phase::Routing;

        let termination = loop {
            match phase {
                Phase::Routing => {
                    if steps >= self.config.max_steps {
                        warn!(step = steps, "Step limit reached before FINISH");
                        break TerminationReason::FinishedByStepLimit;
                    }

                    let current = &state;
                    let decision = self
                        .with_retries(
                            "router",
                            move || self.router.decide(current),
                            is_retryable_route,
                        )
                        .await;
                    match decision {
                        Ok(decision) => {
                            state.next = Some(decision);
                            let note = format!("next: {}", decision.label());
                            self.record(&mut state, session_id, MessageRole::Control, &note)
                                .await;
                            match decision {
                                RoutingDecision::Finish => break TerminationReason::FinishedNormally,
                                RoutingDecision::Dispatch(kind) => phase = Phase::Dispatching(kind),
                            }
                        }
                        Err(Error::Routing(e)) => {
                            warn!(step = steps, "Routing rejected, finishing: {e}");
                            notice = Some(DEGRADED_NOTICE.to_string());
                            break TerminationReason::RoutingRejected;
                        }
                        Err(e) => {
                            warn!(step = steps, "Router unavailable, aborting step: {e}");
                            notice = Some(APOLOGY_NOTICE.to_string());
                            break TerminationReason::ServiceUnavailable;
                        }
                    }
                }
                Phase::Dispatching(kind) => {
                    steps += 1;
                    let Some(responder) = self.registry.get(kind) else {
                        warn!(step = steps, responder = %kind, "No responder registered");
                        notice = Some(DEGRADED_NOTICE.to_string());
                        break TerminationReason::RoutingRejected;
                    };

                    debug!(step = steps, responder = %kind, "Dispatching");
                    let current = &state;
                    let reply = self
                        .with_retries(
                            kind.label(),
                            move || responder.respond(current),
                            LlmError::is_service_unavailable,
                        )
                        .await;
                    match reply {
                        Ok(text) => {
                            self.record(&mut state, session_id, MessageRole::Responder(kind), &text)
                                .await;
                            responses.push((kind, text));
                            phase = Phase::Routing;
                        }
                        Err(e) => {
                            warn!(step = steps, responder = %kind, "Responder unavailable, aborting step: {e}");
                            notice = Some(APOLOGY_NOTICE.to_string());
                            break TerminationReason::ServiceUnavailable;
                        }
                    }
                }
            }
        };

        if let Some(ref text) = notice {
            self.record(&mut state, session_id, MessageRole::Control, text)
                .await;
        }

        info!(
            session_id,
            steps,
            responses = responses.len(),
            termination = %termination,
            "Run finished"
        );

        RunOutcome {
            responses,
            termination,
            notice,
        }
    }

    /// Retry a model call while `retryable` accepts its error.
    async fn with_retries<T, E, F, Fut>(
        &self,
        service: &str,
        mut call: F,
        retryable: fn(&E) -> bool,
    ) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Err(e) if retryable(&e) && attempt < self.config.service_retries => {
                    attempt += 1;
                    warn!(service, attempt, "Model call failed, retrying: {e}");
                }
                other => return other,
            }
        }
    }

    async fn hydrate(&self, session_id: &str) -> ConversationState {
        if let Err(e) = self
            .store
            .ensure_conversation(session_id, &self.config.user_id)
            .await
        {
            warn!("Failed to ensure conversation {}: {}", session_id, e);
            return ConversationState::default();
        }

        match self.store.list_conversation_messages(session_id).await {
            Ok(stored) => {
                let state = ConversationState::from_stored(&stored);
                if !state.is_empty() {
                    debug!(session_id, messages = state.len(), "Restored conversation");
                }
                state
            }
            Err(e) => {
                warn!("Failed to load conversation {}: {}", session_id, e);
                ConversationState::default()
            }
        }
    }

    /// Append to the in-memory state and the session log.
    async fn record(
        &self,
        state: &mut ConversationState,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) {
        state.push(role, content);
        if let Err(e) = self
            .store
            .add_conversation_message(session_id, &role.to_string(), content)
            .await
        {
            warn!("Failed to persist {} message: {}", role, e);
        }
    }
}

fn is_retryable_route(e: &Error) -> bool {
    matches!(e, Error::Llm(e) if e.is_service_unavailable())
}
