//! Terminal prompts for the rationale and settings dialogs.

use crate::input::Console;
use permit_core::{ConfirmPrompt, PromptChoice, PromptKind, Prompter};

/// Shows [`ConfirmPrompt`]s on the terminal and reads a y/n answer.
///
/// Displays:
/// - y: accept
/// - n: decline
///
/// A closed input or a read failure declines.
#[derive(Clone)]
pub struct TerminalPrompter {
    console: Console,
}

impl TerminalPrompter {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &ConfirmPrompt) -> PromptChoice {
        print_prompt_header(prompt);

        match self.console.confirm("\nChoice [y/n]: ") {
            Ok(true) => {
                print_confirmation("Accepted");
                PromptChoice::Accept
            }
            Ok(false) => {
                print_confirmation("Declined");
                PromptChoice::Decline
            }
            Err(err) => {
                log::warn!("prompt input failed, declining: {}", err);
                PromptChoice::Decline
            }
        }
    }
}

fn title(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Rationale => "Permissions needed",
        PromptKind::Settings => "Open settings",
    }
}

/// Print the prompt's title, message and capabilities.
pub fn print_prompt_header(prompt: &ConfirmPrompt) {
    println!("\n\x1b[33m{}\x1b[0m", title(prompt.kind));
    println!("  {}", prompt.message);
    for capability in &prompt.capabilities {
        println!("    \x1b[1m{}\x1b[0m", capability.short_name());
    }
}

/// Print a confirmation message
pub fn print_confirmation(message: &str) {
    println!("  \x1b[32m✓\x1b[0m {}", message);
}
