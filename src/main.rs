use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use uuid::Uuid;

use health_assist::agent::{
    CommandParser, Orchestrator, OrchestratorConfig, ResponderRegistry, Router,
};
use health_assist::catalog::PlanDetector;
use health_assist::config::{AssistConfig, LlmSettings};
use health_assist::llm::{LlmClassifier, LlmGenerator, create_provider};
use health_assist::shell::{Shell, stdin_lines};
use health_assist::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AssistConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    eprintln!("Health Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   User: {}", config.user_id);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    db.ensure_profile(&config.user_id).await?;
    eprintln!("   Database: {}", config.db_path.display());

    // ── Assistant ────────────────────────────────────────────────────────
    let orchestrator = match LlmSettings::from_env() {
        Ok(settings) => {
            eprintln!("   Model: {}", settings.model);
            let llm = create_provider(&settings);
            let classifier = Arc::new(LlmClassifier::new(Arc::clone(&llm), config.llm_timeout));
            let generator = Arc::new(LlmGenerator::new(llm, config.llm_timeout));
            let registry = ResponderRegistry::with_catalog_responders(
                generator,
                Arc::new(PlanDetector::new()?),
                None,
            );
            let router = Router::new(classifier, registry.kinds());
            Some(Orchestrator::new(
                router,
                registry,
                Arc::clone(&db),
                OrchestratorConfig {
                    user_id: config.user_id.clone(),
                    max_steps: config.max_steps,
                    service_retries: config.service_retries,
                },
            ))
        }
        Err(e) => {
            eprintln!("   Chat: disabled ({})", e);
            None
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let shell = Shell::new(db, orchestrator, config.user_id.clone(), session_id);
    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    let mut lines = stdin_lines();
    prompt();
    while let Some(line) = lines.next().await {
        match shell.handle(CommandParser::parse(&line), Utc::now()).await {
            Ok(reply) => {
                println!("\n{}\n", reply.text);
                if reply.quit {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Command failed: {}", e);
                println!("\nError: {}\n", e);
            }
        }
        prompt();
    }

    tracing::info!("Shutting down");
    Ok(())
}

fn prompt() {
    eprint!("> ");
    let _ = std::io::stderr().flush();
}
