//! Banking assistant shell and research scripts for teller
//!
//! This crate provides:
//! - The banking assistant: three workers behind a supervisor, wired to the
//!   bundled data in [`assistant`]
//! - SQLite-backed conversation checkpoints
//! - An interactive shell with history and slash commands
//! - The two research scripts under [`research`]

pub mod assistant;
pub mod checkpoint;
pub mod config;
mod error;
pub mod repl;
pub mod research;

pub use checkpoint::SqliteCheckpointer;
pub use config::Settings;
pub use error::CliError;
pub use repl::{respond, run_shell, PresentationHook, Reply, Verbosity};

/// Imports for tool implementations in this crate
pub(crate) mod prelude {
    pub use teller_tools::prelude::*;
}
