use parking_lot::Mutex;
use std::sync::Arc;

/// How much of the agents' tool activity the shell prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Answers only
    Quiet,
    /// Handoffs and tool calls
    Normal,
    /// Handoffs, tool calls and their full output
    Verbose,
}

impl Verbosity {
    /// Parse a verbosity level from a string
    ///
    /// Returns Some(Verbosity) for valid inputs, None for invalid.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quiet" => Some(Self::Quiet),
            "normal" => Some(Self::Normal),
            "verbose" => Some(Self::Verbose),
            _ => None,
        }
    }
}

/// Classify an input line as a slash command or a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType<'a> {
    /// Slash command with name and arguments
    Slash {
        command: &'a str,
        args: Vec<&'a str>,
    },
    /// Query for the assistant
    Query,
}

impl<'a> CommandType<'a> {
    pub fn parse(input: &'a str) -> Self {
        if input.starts_with('/') {
            let parts: Vec<&str> = input.split_whitespace().collect();
            if let Some((command, args)) = parts.split_first() {
                return Self::Slash {
                    command,
                    args: args.to_vec(),
                };
            }
        }
        Self::Query
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SpecialCommandResult {
    Exit,
    Continue,
}

/// Mutable shell state the commands act on
pub struct ShellState {
    pub thread_id: String,
    pub verbosity: Arc<Mutex<Verbosity>>,
}

impl ShellState {
    pub fn new(thread_id: impl Into<String>, verbosity: Arc<Mutex<Verbosity>>) -> Self {
        Self {
            thread_id: thread_id.into(),
            verbosity,
        }
    }
}

/// Handle slash commands
///
/// Returns Some(result) if this was a command, None if it should be sent to
/// the assistant.
pub fn handle_special_command(input: &str, state: &mut ShellState) -> Option<SpecialCommandResult> {
    let CommandType::Slash { command, args } = CommandType::parse(input) else {
        return None;
    };

    let result = match command {
        "/exit" | "/quit" => SpecialCommandResult::Exit,
        "/help" => {
            print!("{}", help::full_text());
            SpecialCommandResult::Continue
        }
        "/thread" => {
            println!("Thread: {}", state.thread_id);
            SpecialCommandResult::Continue
        }
        "/new" => {
            state.thread_id = new_thread_id();
            log::info!("started thread {}", state.thread_id);
            println!("Started thread {}", state.thread_id);
            SpecialCommandResult::Continue
        }
        "/verbosity" => {
            update_verbosity(&state.verbosity, &args);
            SpecialCommandResult::Continue
        }
        _ => {
            eprintln!(
                "Unknown command: {}. Type /help for available commands.",
                command
            );
            SpecialCommandResult::Continue
        }
    };
    Some(result)
}

/// A fresh thread id, `thread-<uuid>`
pub fn new_thread_id() -> String {
    format!("thread-{}", uuid::Uuid::new_v4())
}

fn update_verbosity(verbosity: &Arc<Mutex<Verbosity>>, args: &[&str]) {
    let Some(level) = args.first() else {
        println!("Verbosity: {:?}", *verbosity.lock());
        return;
    };

    match Verbosity::parse(level) {
        Some(level) => {
            *verbosity.lock() = level;
            println!("Verbosity set to {:?}", level);
        }
        None => println!("Unknown verbosity level: {} (quiet|normal|verbose)", level),
    }
}

/// Help text sections for the shell
pub mod help {
    pub const HEADER: &str = "\nAvailable Commands:\n";

    pub const CONVERSATION: &str = "\
Conversation:
  /thread             Show the current thread id
  /new                Start a new thread; earlier answers are forgotten
  /verbosity [level]  Set output verbosity (quiet|normal|verbose)
";

    pub const EXIT: &str = "\
Exit:
  /exit, /quit        Exit
  Ctrl+D              Exit
";

    pub const KEYBOARD: &str = "\
Keyboard Shortcuts:
  Up/Down             Navigate query history
  Ctrl+R              Reverse search history
  Ctrl+C              Clear the current line
";

    pub fn full_text() -> String {
        format!("{}{}\n{}\n{}", HEADER, CONVERSATION, EXIT, KEYBOARD)
    }
}
