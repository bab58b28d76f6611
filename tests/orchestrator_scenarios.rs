//! End-to-end orchestration runs against stub model services and an
//! in-memory store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use health_assist::agent::orchestrator::{APOLOGY_NOTICE, DEGRADED_NOTICE};
use health_assist::agent::{
    Orchestrator, OrchestratorConfig, ResponderKind, ResponderRegistry, Router, TerminationReason,
};
use health_assist::catalog::PlanDetector;
use health_assist::error::LlmError;
use health_assist::llm::{ChatMessage, Classifier, Generator};
use health_assist::store::{Database, LibSqlBackend};

/// Replays scripted replies, then repeats `fallback` forever.
struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: String,
    histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClassifier {
    fn new(script: Vec<Result<&str, LlmError>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            fallback: fallback.to_string(),
            histories: Mutex::new(Vec::new()),
        }
    }

    fn labels(labels: &[&str]) -> Self {
        Self::new(labels.iter().map(|l| Ok(*l)).collect(), "FINISH")
    }

    fn calls(&self) -> usize {
        self.histories.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        history: &[ChatMessage],
        _allowed_labels: &[&str],
    ) -> Result<String, LlmError> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Numbers its replies; fails every call after `succeed_for` successes.
struct CountingGenerator {
    calls: AtomicUsize,
    succeed_for: usize,
}

impl CountingGenerator {
    fn reliable() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed_for: usize::MAX,
        }
    }

    fn failing_after(succeed_for: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed_for,
        }
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, _context: &[ChatMessage]) -> Result<String, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.succeed_for {
            return Err(LlmError::Timeout {
                service: "generator".to_string(),
                timeout: Duration::from_secs(1),
            });
        }
        Ok(format!("reply {}", n + 1))
    }
}

struct Harness {
    orchestrator: Orchestrator,
    classifier: Arc<ScriptedClassifier>,
    generator: Arc<CountingGenerator>,
    db: Arc<dyn Database>,
}

async fn harness(
    classifier: ScriptedClassifier,
    generator: CountingGenerator,
    max_steps: usize,
    service_retries: u32,
) -> Harness {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let classifier = Arc::new(classifier);
    let generator = Arc::new(generator);
    let registry = ResponderRegistry::with_catalog_responders(
        generator.clone(),
        Arc::new(PlanDetector::new().unwrap()),
        Some(42),
    );
    let router = Router::new(classifier.clone(), registry.kinds());
    let orchestrator = Orchestrator::new(
        router,
        registry,
        Arc::clone(&db),
        OrchestratorConfig {
            user_id: "tester".to_string(),
            max_steps,
            service_retries,
        },
    );
    Harness {
        orchestrator,
        classifier,
        generator,
        db,
    }
}

fn kinds(responses: &[(ResponderKind, String)]) -> Vec<ResponderKind> {
    responses.iter().map(|(k, _)| *k).collect()
}

#[tokio::test]
async fn two_specialists_then_finish() {
    let h = harness(
        ScriptedClassifier::labels(&["fitness", "wellness", "FINISH"]),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;

    let outcome = h
        .orchestrator
        .run("I want to lose weight and feel less stressed", "s1")
        .await;

    assert_eq!(
        kinds(&outcome.responses),
        vec![ResponderKind::Fitness, ResponderKind::Wellness]
    );
    assert_eq!(outcome.responses[0].1, "reply 1");
    assert_eq!(outcome.responses[1].1, "reply 2");
    assert_eq!(outcome.termination, TerminationReason::FinishedNormally);
    assert!(outcome.notice.is_none());
    assert_eq!(h.classifier.calls(), 3);
}

#[tokio::test]
async fn never_finishing_hits_step_limit() {
    let h = harness(
        ScriptedClassifier::new(vec![], "fitness"),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;

    let outcome = h.orchestrator.run("train me", "s1").await;

    assert_eq!(outcome.responses.len(), 15);
    assert!(outcome.responses.iter().all(|(k, _)| *k == ResponderKind::Fitness));
    assert_eq!(outcome.termination, TerminationReason::FinishedByStepLimit);
    assert!(outcome.notice.is_none());
    assert_eq!(h.classifier.calls(), 15);
}

#[tokio::test]
async fn unknown_label_forces_finish_with_notice() {
    let h = harness(
        ScriptedClassifier::labels(&["nutrition", "astrology"]),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;

    let outcome = h.orchestrator.run("what should I eat", "s1").await;

    assert_eq!(kinds(&outcome.responses), vec![ResponderKind::Nutrition]);
    assert_eq!(outcome.termination, TerminationReason::RoutingRejected);
    assert_eq!(outcome.notice.as_deref(), Some(DEGRADED_NOTICE));
    // Protocol violations are not retried.
    assert_eq!(h.classifier.calls(), 2);
}

#[tokio::test]
async fn empty_label_is_rejected() {
    let h = harness(
        ScriptedClassifier::labels(&["  "]),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;

    let outcome = h.orchestrator.run("hi", "s1").await;
    assert!(outcome.responses.is_empty());
    assert_eq!(outcome.termination, TerminationReason::RoutingRejected);
}

#[tokio::test]
async fn generator_outage_keeps_earlier_replies() {
    let h = harness(
        ScriptedClassifier::labels(&["fitness", "nutrition", "FINISH"]),
        CountingGenerator::failing_after(1),
        15,
        1,
    )
    .await;

    let outcome = h.orchestrator.run("plan my week", "s1").await;

    assert_eq!(kinds(&outcome.responses), vec![ResponderKind::Fitness]);
    assert_eq!(outcome.termination, TerminationReason::ServiceUnavailable);
    assert_eq!(outcome.notice.as_deref(), Some(APOLOGY_NOTICE));
    // One success, then the failed call plus one retry.
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn transient_router_failure_is_retried() {
    let failure = || LlmError::RequestFailed {
        provider: "stub".to_string(),
        reason: "connection reset".to_string(),
    };

    let h = harness(
        ScriptedClassifier::new(vec![Err(failure()), Ok("FINISH")], "FINISH"),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;
    let outcome = h.orchestrator.run("hello", "s1").await;
    assert_eq!(outcome.termination, TerminationReason::FinishedNormally);
    assert_eq!(h.classifier.calls(), 2);

    let h = harness(
        ScriptedClassifier::new(vec![Err(failure()), Ok("FINISH")], "FINISH"),
        CountingGenerator::reliable(),
        15,
        0,
    )
    .await;
    let outcome = h.orchestrator.run("hello", "s1").await;
    assert_eq!(outcome.termination, TerminationReason::ServiceUnavailable);
    assert_eq!(outcome.notice.as_deref(), Some(APOLOGY_NOTICE));
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let h = harness(
        ScriptedClassifier::new(
            vec![Err(LlmError::AuthFailed {
                provider: "stub".to_string(),
            })],
            "FINISH",
        ),
        CountingGenerator::reliable(),
        15,
        3,
    )
    .await;

    let outcome = h.orchestrator.run("hello", "s1").await;
    assert_eq!(outcome.termination, TerminationReason::ServiceUnavailable);
    assert_eq!(h.classifier.calls(), 1);
}

#[tokio::test]
async fn session_history_carries_across_runs() {
    let h = harness(
        ScriptedClassifier::labels(&["fitness", "FINISH", "FINISH"]),
        CountingGenerator::reliable(),
        15,
        1,
    )
    .await;

    h.orchestrator.run("I want to build muscle", "s1").await;

    let stored = h.db.list_conversation_messages("s1").await.unwrap();
    let roles: Vec<&str> = stored.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "control", "responder:fitness", "control"]);
    assert_eq!(stored[2].content, "reply 1");

    h.orchestrator.run("and what about rest days?", "s1").await;

    // System prompt, first user turn, fitness reply, second user turn.
    let histories = h.classifier.histories.lock().unwrap();
    let last = histories.last().unwrap();
    assert_eq!(last.len(), 4);
    assert_eq!(last[1].content, "I want to build muscle");
    assert_eq!(last[2].name.as_deref(), Some("fitness"));
    assert_eq!(last[3].content, "and what about rest days?");

    // A different session starts empty.
    drop(histories);
    h.orchestrator.run("hello", "s2").await;
    let histories = h.classifier.histories.lock().unwrap();
    assert_eq!(histories.last().unwrap().len(), 2);
}
