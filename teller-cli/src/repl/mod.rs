//! Interactive banking shell

mod commands;
mod presentation;
mod spinner;

use crate::assistant::SAMPLE_QUESTIONS;
use crate::config::Settings;
use crate::error::CliError;
use commands::{handle_special_command, ShellState, SpecialCommandResult};
use parking_lot::Mutex;
use presentation::{new_event_queue, EventPresenter};
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use spinner::Spinner;
use std::sync::Arc;
use teller_core::App;

pub use commands::{new_thread_id, Verbosity};
pub use presentation::PresentationHook;

/// Shown instead of calling the assistant when the input is blank
pub const EMPTY_QUERY_WARNING: &str = "Please enter a query first.";

const INPUT_PROMPT: &str = "  ❯ ";

/// Outcome of one submitted query
#[derive(Debug)]
pub enum Reply {
    /// Nothing was sent
    Warning(&'static str),
    /// The assistant's final message
    Answer(String),
    /// The turn failed; the thread is left as it was
    Failed(teller_core::Error),
}

/// Send `query` on `thread_id`, or warn if there is nothing to send
///
/// Surrounding whitespace is trimmed first, so a whitespace-only query gets
/// the warning and the model only ever sees the trimmed text.
pub async fn respond(app: &App, query: &str, thread_id: &str) -> Reply {
    let query = query.trim();
    if query.is_empty() {
        return Reply::Warning(EMPTY_QUERY_WARNING);
    }
    match crate::assistant::chat(app, query, thread_id).await {
        Ok(answer) => Reply::Answer(answer),
        Err(e) => {
            log::warn!("turn on thread {} failed: {}", thread_id, e);
            Reply::Failed(e)
        }
    }
}

pub fn format_welcome() -> String {
    let mut out = format!(
        "\nBanking Assistant v{}\nHow can I help you today?\n\nsample questions:\n",
        env!("CARGO_PKG_VERSION")
    );
    for question in SAMPLE_QUESTIONS {
        out.push_str(&format!("  - {}\n", question));
    }
    out.push_str("\nType /help for commands\n");
    out
}

/// Run the interactive shell until `/exit` or Ctrl+D
///
/// A failed turn prints the error and the loop continues.
///
/// # Errors
///
/// Returns `CliError` for input or history failures; assistant errors are
/// reported in the shell instead.
pub async fn run_shell(app: App, thread_id: impl Into<String>) -> Result<(), CliError> {
    let verbosity = Arc::new(Mutex::new(Verbosity::Normal));
    let queue = new_event_queue();
    app.add_hook(PresentationHook::new(queue.clone()));
    let presenter = EventPresenter::new(app.workflow().clone(), verbosity.clone(), queue);
    let mut state = ShellState::new(thread_id, verbosity);

    print!("{}", format_welcome());

    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(Config::default())?;
    let history_path = Settings::history_path();
    if history_path.exists() {
        rl.load_history(&history_path).ok();
    }
    log::info!("shell started on thread {}", state.thread_id);

    loop {
        match rl.readline(INPUT_PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line)?;
                }

                if let Some(result) = handle_special_command(line, &mut state) {
                    match result {
                        SpecialCommandResult::Exit => break,
                        SpecialCommandResult::Continue => continue,
                    }
                }

                let spinner = (!line.is_empty()).then(|| Spinner::new("Thinking..."));
                let reply = respond(&app, line, &state.thread_id).await;
                if let Some(spinner) = spinner {
                    spinner.stop().await;
                }

                match reply {
                    Reply::Warning(message) => println!("\x1b[33m{}\x1b[0m", message),
                    Reply::Answer(answer) => {
                        presenter.flush();
                        println!("\n{}\n", answer);
                    }
                    Reply::Failed(e) => {
                        presenter.discard();
                        eprintln!("Error: {}\n", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    rl.save_history(&history_path)?;
    log::info!("shell exited on thread {}", state.thread_id);

    println!("\nGoodbye!\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_lists_sample_questions() {
        let welcome = format_welcome();
        assert!(welcome.contains("How can I help you today?"));
        for question in SAMPLE_QUESTIONS {
            assert!(welcome.contains(question));
        }
    }
}
