//! Handoff and tool call presentation for the shell

use super::commands::Verbosity;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use teller_core::{AgentEvent, AgentHook, ToolResult, Workflow};

const BOX_WIDTH: usize = 80;

/// Queue for events that need to be printed
pub type EventQueue = Arc<Mutex<VecDeque<AgentEvent>>>;

pub fn new_event_queue() -> EventQueue {
    Arc::new(Mutex::new(VecDeque::new()))
}

/// Hook that queues handoff and tool events for later presentation
///
/// Events are queued rather than printed so nothing is written while the
/// spinner owns the line.
pub struct PresentationHook {
    queue: EventQueue,
}

impl PresentationHook {
    pub fn new(queue: EventQueue) -> Self {
        Self { queue }
    }
}

impl AgentHook for PresentationHook {
    fn on_event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::ToolRequested { .. }
            | AgentEvent::ToolCompleted { .. }
            | AgentEvent::ToolFailed { .. }
            | AgentEvent::Handoff { .. }
            | AgentEvent::HandoffBack { .. } => {
                self.queue.lock().push_back(event.clone());
            }
            _ => {}
        }
    }
}

/// Renders tool inputs and outputs
pub trait ToolFormatter: Send + Sync {
    fn format_tool_input(&self, name: &str, input: &Value) -> Option<String>;

    fn format_tool_output(&self, name: &str, output: &ToolResult) -> Option<String>;
}

impl<W: Workflow + ?Sized> ToolFormatter for W {
    fn format_tool_input(&self, name: &str, input: &Value) -> Option<String> {
        Workflow::format_tool_input(self, name, input)
    }

    fn format_tool_output(&self, name: &str, output: &ToolResult) -> Option<String> {
        Workflow::format_tool_output(self, name, output)
    }
}

/// Formats and prints queued events
pub struct EventPresenter<F: ToolFormatter + ?Sized = dyn Workflow> {
    formatter: Arc<F>,
    verbosity: Arc<Mutex<Verbosity>>,
    queue: EventQueue,
}

impl<F: ToolFormatter + ?Sized> EventPresenter<F> {
    pub fn new(formatter: Arc<F>, verbosity: Arc<Mutex<Verbosity>>, queue: EventQueue) -> Self {
        Self {
            formatter,
            verbosity,
            queue,
        }
    }

    /// Drain and print all queued events
    pub fn flush(&self) {
        let events: Vec<AgentEvent> = self.queue.lock().drain(..).collect();
        for event in &events {
            if let Some(text) = self.render(event) {
                println!("{}", text);
            }
        }
    }

    /// Drop queued events without printing them
    pub fn discard(&self) {
        self.queue.lock().clear();
    }

    fn render(&self, event: &AgentEvent) -> Option<String> {
        let verbosity = *self.verbosity.lock();
        if verbosity == Verbosity::Quiet {
            return None;
        }

        match event {
            AgentEvent::Handoff { to, .. } => Some(dim_text(&format!("→ {}", to))),
            AgentEvent::HandoffBack { from, .. } => {
                (verbosity == Verbosity::Verbose).then(|| dim_text(&format!("← {}", from)))
            }
            AgentEvent::ToolRequested { name, input, .. } => {
                let mut out = tool_header(name);
                let formatted = self
                    .formatter
                    .format_tool_input(name, input)
                    .unwrap_or_else(|| input.to_string());
                for line in formatted.lines() {
                    out.push_str(&format!("\n│  {}", line));
                }
                Some(out)
            }
            AgentEvent::ToolCompleted { name, output, .. } => {
                let mut out = result_separator();
                match verbosity {
                    Verbosity::Verbose => {
                        let formatted = self
                            .formatter
                            .format_tool_output(name, output)
                            .unwrap_or_else(|| output.as_text());
                        if formatted.trim().is_empty() {
                            out.push_str("\n│  \x1b[2m(no output)\x1b[0m");
                        }
                        for line in formatted.lines() {
                            out.push_str(&format!("\n│  {}", line));
                        }
                    }
                    _ => out.push_str("\n│  \x1b[32m✓\x1b[0m"),
                }
                out.push_str(&tool_footer(name));
                Some(out)
            }
            AgentEvent::ToolFailed { name, error, .. } => Some(format!(
                "{}\n│  \x1b[31m{}\x1b[0m{}",
                result_separator(),
                error,
                tool_footer(name)
            )),
            _ => None,
        }
    }
}

fn dim_text(text: &str) -> String {
    format!("\x1b[2m{}\x1b[0m", text)
}

/// `┌─ name ───...───┐`
fn tool_header(name: &str) -> String {
    let prefix = format!("┌─ {} ", name);
    let fill = BOX_WIDTH.saturating_sub(prefix.chars().count() + 1);
    format!("{}{}┐\n│", prefix, "─".repeat(fill))
}

/// `└───...─── name ─┘`
fn tool_footer(name: &str) -> String {
    let suffix = format!(" {} ─┘", name);
    let fill = BOX_WIDTH.saturating_sub(suffix.chars().count() + 1);
    format!("\n│\n└{}{}", "─".repeat(fill), suffix)
}

fn result_separator() -> String {
    "│\n├─ Result\n│".to_string()
}
