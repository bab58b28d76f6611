//! Specialist responders and the registry the orchestrator dispatches into.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agent::router::ResponderKind;
use crate::agent::state::ConversationState;
use crate::catalog::{PlanDetector, fitness, nutrition, wellness};
use crate::error::LlmError;
use crate::llm::{ChatMessage, Generator};

/// Produces the reply for one capability.
#[async_trait]
pub trait Responder: Send + Sync {
    fn kind(&self) -> ResponderKind;

    /// Write a reply for the conversation so far. Must not touch the store.
    async fn respond(&self, state: &ConversationState) -> Result<String, LlmError>;
}

const FITNESS_INSTRUCTIONS: &str = "You are a professional fitness coach. \
Give safe, practical exercise advice based on the user's situation and the reference plan below. \
Keep the plan's structure and its safety notes, tailor the wording to the user, and be encouraging.";

const NUTRITION_INSTRUCTIONS: &str = "You are a registered nutritionist. \
Give balanced, practical dietary advice based on the user's goals, preferences, and the reference plan below. \
Respect any dietary restrictions and keep the hydration and safety notes.";

const WELLNESS_INSTRUCTIONS: &str = "You are a supportive mental health and lifestyle advisor. \
Respond with empathy, use the tips and techniques below, and suggest professional help when appropriate.";

fn instructions(kind: ResponderKind) -> &'static str {
    match kind {
        ResponderKind::Fitness => FITNESS_INSTRUCTIONS,
        ResponderKind::Nutrition => NUTRITION_INSTRUCTIONS,
        ResponderKind::Wellness => WELLNESS_INSTRUCTIONS,
    }
}

/// Builds a catalog plan for its capability, then has the generator turn
/// it into a reply.
pub struct CatalogResponder {
    kind: ResponderKind,
    generator: Arc<dyn Generator>,
    detector: Arc<PlanDetector>,
    rng: Mutex<StdRng>,
}

impl CatalogResponder {
    pub fn new(
        kind: ResponderKind,
        generator: Arc<dyn Generator>,
        detector: Arc<PlanDetector>,
        rng: StdRng,
    ) -> Self {
        Self {
            kind,
            generator,
            detector,
            rng: Mutex::new(rng),
        }
    }

    /// The reference plan for the current conversation.
    pub fn build_plan(&self, state: &ConversationState) -> String {
        let request = self.detector.detect(state.user_texts());
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        match self.kind {
            ResponderKind::Fitness => fitness::build_plan(&request, &mut *rng),
            ResponderKind::Nutrition => nutrition::build_plan(&request),
            ResponderKind::Wellness => wellness::build_advice(&mut *rng),
        }
    }
}

#[async_trait]
impl Responder for CatalogResponder {
    fn kind(&self) -> ResponderKind {
        self.kind
    }

    async fn respond(&self, state: &ConversationState) -> Result<String, LlmError> {
        let plan = self.build_plan(state);

        let mut context = vec![ChatMessage::system(instructions(self.kind))];
        context.extend(state.to_chat_messages());
        context.push(ChatMessage::system(format!("Reference plan:\n{plan}")));

        self.generator.generate(&context).await
    }
}

/// Fixed mapping from capability to handler.
#[derive(Default)]
pub struct ResponderRegistry {
    responders: BTreeMap<ResponderKind, Arc<dyn Responder>>,
}

impl ResponderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register all three catalog responders over one generator.
    ///
    /// Each responder gets its own RNG seeded from `seed` when given,
    /// otherwise from OS entropy.
    pub fn with_catalog_responders(
        generator: Arc<dyn Generator>,
        detector: Arc<PlanDetector>,
        seed: Option<u64>,
    ) -> Self {
        let mut registry = Self::new();
        for (i, kind) in ResponderKind::ALL.into_iter().enumerate() {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                None => StdRng::from_entropy(),
            };
            registry.register(Arc::new(CatalogResponder::new(
                kind,
                Arc::clone(&generator),
                Arc::clone(&detector),
                rng,
            )));
        }
        registry
    }

    /// Register a responder, replacing any previous one of the same kind.
    pub fn register(&mut self, responder: Arc<dyn Responder>) {
        self.responders.insert(responder.kind(), responder);
    }

    pub fn get(&self, kind: ResponderKind) -> Option<&Arc<dyn Responder>> {
        self.responders.get(&kind)
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<ResponderKind> {
        self.responders.keys().copied().collect()
    }
}
