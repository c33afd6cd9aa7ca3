//! Plain-text rendering of conversations for console output
//!
//! Each message gets an 80-column banner naming its kind, an optional
//! `Name:` line and its content:
//!
//! ```text
//! ================================ Human Message =================================
//!
//! What is my name?
//! ```

use crate::types::{ContentBlock, Message, Role};

const BANNER_WIDTH: usize = 80;

fn banner(kind: &str) -> String {
    let title = format!(" {} Message ", kind);
    let side = BANNER_WIDTH.saturating_sub(title.chars().count()) / 2;
    let left = "=".repeat(side);
    let right = if title.chars().count() % 2 == 1 {
        format!("{}=", left)
    } else {
        left.clone()
    };
    format!("{}{}{}", left, title, right)
}

/// Render one message; a message with several tool results renders one
/// block per result.
pub fn format_message(message: &Message) -> String {
    if message.is_tool_result() {
        return message
            .tool_results_iter()
            .map(|result| {
                format!(
                    "{}\n\n{}",
                    banner("Tool"),
                    result.content.as_text()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let kind = match message.role {
        Role::User => "Human",
        Role::Assistant => "Ai",
    };
    let mut out = banner(kind);
    if let Some(name) = &message.name {
        out.push_str(&format!("\nName: {}", name));
    }
    out.push_str("\n\n");
    out.push_str(&message.text());

    let tool_uses: Vec<_> = message
        .content
        .iter()
        .filter_map(|c| match c {
            ContentBlock::ToolUse(t) => Some(t),
            _ => None,
        })
        .collect();
    if !tool_uses.is_empty() {
        out.push_str("\nTool Calls:");
        for call in tool_uses {
            out.push_str(&format!("\n  {} ({})\n Call ID: {}\n  Args:", call.name, call.id, call.id));
            if let Some(args) = call.input.as_object() {
                for (key, value) in args {
                    let rendered = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    out.push_str(&format!("\n    {}: {}", key, rendered));
                }
            }
        }
    }
    out
}

/// Print one message to stdout
pub fn pretty_print(message: &Message) {
    println!("{}", format_message(message));
}

/// Print a numbered conversation followed by its message count
///
/// `heading` is printed first, e.g. `"Conversation messages:"`.
pub fn print_conversation(heading: &str, messages: &[Message], count_label: &str) {
    println!("\n{}", heading);
    for (i, message) in messages.iter().enumerate() {
        println!("\nMessage {}:", i);
        pretty_print(message);
    }
    println!("\n{}: {}", count_label, messages.len());
}
