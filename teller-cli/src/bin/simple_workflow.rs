//! Three experts behind a supervisor, queried on one thread
//!
//! Run with: cargo run -p teller-cli --bin simple_workflow

use std::sync::Arc;

use teller_cli::assistant;
use teller_cli::research::{openai_model, simple_workflow};
use teller_cli::Settings;
use teller_core::{Gpt4o, InMemoryCheckpointer, LogHook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let settings = Settings::load();

    let app = simple_workflow::compile(
        openai_model(&settings, Gpt4o)?,
        assistant::memory_store(assistant::embedder(&settings)?),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await?;
    app.add_hook(LogHook);

    for (query, answer) in simple_workflow::QUERIES
        .iter()
        .zip(simple_workflow::run(&app).await?)
    {
        println!("> {}\n{}\n", query, answer);
    }
    Ok(())
}
