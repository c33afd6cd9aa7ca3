//! Research scripts: scripted runs printed to the console

pub mod prompt_optimization;
pub mod simple_workflow;

use std::sync::Arc;

use teller_core::{Model, ModelProvider, OpenAiCompatProvider};

use crate::config::Settings;
use crate::error::CliError;

/// An OpenAI model configured from `settings`
pub fn openai_model(
    settings: &Settings,
    model: impl Model,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    let mut provider = OpenAiCompatProvider::new(model, settings.openai_api_key.clone())?;
    if let Some(url) = &settings.openai_base_url {
        provider = provider.with_base_url(url);
    }
    Ok(Arc::new(provider))
}
