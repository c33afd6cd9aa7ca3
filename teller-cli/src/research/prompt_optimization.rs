//! Email and social media assistants whose prompts live in the store
//!
//! The script drafts an email, feeds the conversation and user feedback to
//! the prompt optimizer, stores the rewritten email prompt and drafts the
//! same email again. The email agent reads its instructions on every
//! invocation, so the second draft follows the new prompt without
//! rebuilding anything.

use std::sync::Arc;

use serde_json::{json, Value};
use teller_core::{
    namespace, Agent, App, InvokeConfig, Message, ModelProvider, MultiPromptOptimizer, Namespace,
    PromptSpec, Store, Supervisor, Trajectory, Workflow,
};

use crate::prelude::*;

pub const INSTRUCTIONS_NAMESPACE: &str = "instructions";
pub const EMAIL_AGENT_KEY: &str = "email_agent";
pub const TWITTER_AGENT_KEY: &str = "twitter_agent";

pub const EMAIL_SEED_PROMPT: &str =
    "Write good emails. Repeat your draft content to the user after submitting.";
pub const TWITTER_SEED_PROMPT: &str =
    "Write fire tweets. Repeat the tweet content to the user upon submission.";

pub const SUPERVISOR_PROMPT: &str =
    "You are a team supervisor managing email and tweet assistants to help with correspondance.";

pub const REQUEST: &str = "Draft an email to joe@langchain.dev saying that we want to schedule a followup meeting for thursday at noon.";

pub const FEEDBACK: &str = "Always sign off emails from 'William'; for meeting requests, offer to schedule on Zoom or Google Meet";

pub const EMAIL_WHEN_TO_UPDATE: &str =
    "Only if feedback is provided indicating email writing performance needs improved.";
pub const TWEET_WHEN_TO_UPDATE: &str = "Only if tweet writing generation needs improvement.";

fn instructions() -> Namespace {
    namespace([INSTRUCTIONS_NAMESPACE])
}

/// Input for drafting an email or posting a tweet
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CorrespondenceInput {
    /// Recipient
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Submit an email draft
pub struct DraftEmailTool;

impl Tool for DraftEmailTool {
    type Input = CorrespondenceInput;

    fn name(&self) -> &str {
        "draft_email"
    }

    fn description(&self) -> &str {
        "Submit an email draft."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        log::info!("email draft to {}: {}", input.to, input.subject);
        Ok("Draft saved succesfully.".into())
    }
}

/// Post a tweet
pub struct TweetTool;

impl Tool for TweetTool {
    type Input = CorrespondenceInput;

    fn name(&self) -> &str {
        "tweet"
    }

    fn description(&self) -> &str {
        "Poast a tweet."
    }

    async fn execute(&self, input: Self::Input, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        log::info!("tweet to {}: {}", input.to, input.body);
        Ok("Legendary.".into())
    }
}

/// Write the initial instruction records
pub async fn seed_instructions(store: &dyn Store) -> teller_core::Result<()> {
    store
        .put(&instructions(), EMAIL_AGENT_KEY, json!({"prompt": EMAIL_SEED_PROMPT}))
        .await?;
    store
        .put(&instructions(), TWITTER_AGENT_KEY, json!({"prompt": TWITTER_SEED_PROMPT}))
        .await?;
    Ok(())
}

/// Current text of an instruction record
pub async fn stored_prompt(store: &dyn Store, key: &str) -> teller_core::Result<String> {
    let item = store.get(&instructions(), key).await?;
    item.as_ref()
        .and_then(|item| item.value.get("prompt"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| teller_core::Error::Config(format!("no instruction record '{}'", key)))
}

/// Build both assistants and the supervisor; no checkpointer, each run is fresh
pub async fn compile(
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn Store>,
) -> teller_core::Result<App> {
    let email_agent = Agent::builder()
        .name("email_assistant")
        .shared_provider(provider.clone())
        .add_tool(DraftEmailTool)
        .with_stored_prompt(instructions(), EMAIL_AGENT_KEY)
        .build()
        .await?;

    let social_media_agent = Agent::builder()
        .name("social_media_agent")
        .shared_provider(provider.clone())
        .add_tool(TweetTool)
        .with_stored_prompt(instructions(), TWITTER_AGENT_KEY)
        .build()
        .await?;

    let supervisor = Supervisor::builder()
        .add_workers([email_agent, social_media_agent])
        .shared_provider(provider)
        .with_system_prompt(SUPERVISOR_PROMPT)
        .build()
        .await?;
    Ok(supervisor.compile(Some(store), None))
}

/// Run [`REQUEST`] once and return the full conversation
pub async fn draft(app: &App) -> teller_core::Result<Vec<Message>> {
    let state = app
        .invoke(vec![Message::user(REQUEST)], &InvokeConfig::default())
        .await?;
    Ok(state.messages)
}

/// The prompts handed to the optimizer, tweet first as in the experiment
pub async fn prompt_specs(store: &dyn Store) -> teller_core::Result<Vec<PromptSpec>> {
    Ok(vec![
        PromptSpec::new("tweet_prompt", stored_prompt(store, TWITTER_AGENT_KEY).await?)
            .when_to_update(TWEET_WHEN_TO_UPDATE),
        PromptSpec::new("email_prompt", stored_prompt(store, EMAIL_AGENT_KEY).await?)
            .when_to_update(EMAIL_WHEN_TO_UPDATE),
    ])
}

/// Optimize the prompts against `conversation` with [`FEEDBACK`] and store
/// the new email prompt
///
/// Returns every prompt as the optimizer left it.
pub async fn optimize(
    optimizer: &MultiPromptOptimizer,
    store: &dyn Store,
    conversation: Vec<Message>,
) -> teller_core::Result<Vec<PromptSpec>> {
    let prompts = prompt_specs(store).await?;
    let trajectories = [Trajectory::new(
        conversation,
        Some(json!({"request": FEEDBACK})),
    )];
    let updated = optimizer.optimize(&trajectories, &prompts).await?;

    if let Some(email) = updated.iter().find(|p| p.name == "email_prompt") {
        store
            .put(&instructions(), EMAIL_AGENT_KEY, json!({"prompt": email.prompt}))
            .await?;
    }
    Ok(updated)
}

/// Conversations and prompts produced by [`run`]
#[derive(Debug, Clone)]
pub struct OptimizationReport {
    pub before: Vec<Message>,
    pub prompts: Vec<PromptSpec>,
    pub after: Vec<Message>,
}

/// The whole experiment: draft, optimize, draft again
pub async fn run(
    app: &App,
    optimizer: &MultiPromptOptimizer,
    store: &dyn Store,
) -> teller_core::Result<OptimizationReport> {
    let before = draft(app).await?;
    let prompts = optimize(optimizer, store, before.clone()).await?;
    let after = draft(app).await?;
    Ok(OptimizationReport {
        before,
        prompts,
        after,
    })
}
