//! CLI-specific error types

use teller_core::CheckpointError;
use teller_tools::retrieval::RetrievalError;
use teller_tools::sqlite::SqliteToolError;
use thiserror::Error;

/// Errors that can occur while setting up or running the assistant
#[derive(Debug, Error)]
pub enum CliError {
    /// Agent, supervisor or app error
    #[error(transparent)]
    Core(#[from] teller_core::Error),

    /// Checkpoint storage error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Bundled data could not be loaded
    #[error("Data error: {0}")]
    Data(String),

    /// Readline/input error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// IO error (filesystem, stdout, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SqliteToolError> for CliError {
    fn from(err: SqliteToolError) -> Self {
        CliError::Data(err.to_string())
    }
}

impl From<RetrievalError> for CliError {
    fn from(err: RetrievalError) -> Self {
        CliError::Data(err.to_string())
    }
}

impl From<teller_core::ProviderError> for CliError {
    fn from(err: teller_core::ProviderError) -> Self {
        CliError::Core(err.into())
    }
}
