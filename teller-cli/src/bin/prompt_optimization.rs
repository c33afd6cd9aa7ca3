//! Email and tweet assistants, before and after prompt optimization
//!
//! Run with: cargo run -p teller-cli --bin prompt_optimization

use std::sync::Arc;

use teller_cli::research::{openai_model, prompt_optimization};
use teller_cli::Settings;
use teller_core::{print_conversation, Gpt4oMini, InMemoryStore, LogHook, MultiPromptOptimizer, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let settings = Settings::load();

    let model = openai_model(&settings, Gpt4oMini)?;
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    prompt_optimization::seed_instructions(store.as_ref()).await?;

    let app = prompt_optimization::compile(model.clone(), store.clone()).await?;
    app.add_hook(LogHook);
    let optimizer = MultiPromptOptimizer::from_shared(model);

    let report = prompt_optimization::run(&app, &optimizer, store.as_ref()).await?;

    print_conversation(
        "Conversation messages:",
        &report.before,
        "Total number of messages",
    );
    for prompt in &report.prompts {
        println!("\n{}:\n{}", prompt.name, prompt.prompt);
    }
    print_conversation(
        "Optimized conversation messages:",
        &report.after,
        "Total number of messages after optimization",
    );
    Ok(())
}
