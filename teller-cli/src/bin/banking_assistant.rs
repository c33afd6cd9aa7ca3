//! Interactive banking assistant
//!
//! Run with: cargo run -p teller-cli --bin banking_assistant
//!
//! Reads `GOOGLE_API_KEY` and `OPENAI_API_KEY` from the environment or a
//! `.env` file. Set `TELLER_CHECKPOINT_DB` to keep conversations across runs.

use std::sync::Arc;

use teller_cli::assistant::{self, BankingModels, Collaborators, DEFAULT_THREAD_ID};
use teller_cli::{run_shell, Settings, SqliteCheckpointer};
use teller_core::{Checkpointer, InMemoryCheckpointer, LogHook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let settings = Settings::load();

    let models = BankingModels::from_settings(&settings)?;
    let embedder = assistant::embedder(&settings)?;
    let collaborators =
        Collaborators::from_data_dir(&settings.data_dir, embedder.clone(), models.worker.clone())
            .await?;

    let checkpointer: Arc<dyn Checkpointer> = match &settings.checkpoint_db {
        Some(path) => Arc::new(SqliteCheckpointer::new(path)?),
        None => Arc::new(InMemoryCheckpointer::new()),
    };

    let app = assistant::compile(
        &models,
        &collaborators,
        assistant::memory_store(embedder),
        checkpointer,
    )
    .await?;
    app.add_hook(LogHook);

    run_shell(app, DEFAULT_THREAD_ID).await?;
    Ok(())
}
