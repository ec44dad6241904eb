//! The simulated system permission dialog.

use crate::error::CliError;
use crate::input::Console;
use crate::profile::{DialogAnswer, PendingRequest};

/// Asks the user about each capability of a pending request, the way the
/// platform's own dialog would.
#[derive(Clone)]
pub struct SystemDialog {
    console: Console,
    package: String,
}

impl SystemDialog {
    pub fn new(console: Console, package: impl Into<String>) -> Self {
        Self {
            console,
            package: package.into(),
        }
    }

    /// One answer per shown capability, in request order.
    ///
    /// Blocked capabilities are not shown. A closed input denies the
    /// remaining capabilities.
    pub fn ask(&self, request: &PendingRequest) -> Result<Vec<DialogAnswer>, CliError> {
        println!("\n\x1b[36m[system]\x1b[0m permission request {}", request.code);
        if request.shown().next().is_none() {
            println!("  answered without a dialog: every capability is blocked");
        }

        let mut answers = Vec::new();
        for capability in request.shown() {
            println!(
                "  Allow \x1b[1m{}\x1b[0m to use \x1b[1m{}\x1b[0m?",
                self.package,
                capability.short_name()
            );
            println!("    \x1b[1ma\x1b[0m  allow");
            println!("    \x1b[1md\x1b[0m  deny");
            println!("    \x1b[1mn\x1b[0m  deny, don't ask again");

            let choice = self.console.choose(
                "  Choice: ",
                &[&["a", "allow"], &["d", "deny"], &["n", "never"]],
            )?;
            let answer = match choice {
                Some(0) => DialogAnswer::Allow,
                Some(2) => DialogAnswer::DenyAlways,
                _ => DialogAnswer::Deny,
            };
            log::debug!("{}: {:?}", capability, answer);
            answers.push(answer);
        }
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedReader;
    use permit_core::capability::{READ_CONTACTS, READ_SMS};
    use permit_core::RequestCode;

    fn request() -> PendingRequest {
        PendingRequest {
            capabilities: vec![READ_SMS, READ_CONTACTS],
            code: RequestCode(123),
            blocked: vec![false, false],
        }
    }

    #[test]
    fn test_answers_in_request_order() {
        let console = Console::new(ScriptedReader::new(["n", "allow"]));
        let dialog = SystemDialog::new(console, "com.example.app");

        let answers = dialog.ask(&request()).unwrap();
        assert_eq!(answers, vec![DialogAnswer::DenyAlways, DialogAnswer::Allow]);
    }

    #[test]
    fn test_blocked_capabilities_are_not_shown() {
        let console = Console::new(ScriptedReader::new(["a"]));
        let dialog = SystemDialog::new(console, "com.example.app");
        let request = PendingRequest {
            blocked: vec![true, false],
            ..request()
        };

        let answers = dialog.ask(&request).unwrap();
        assert_eq!(answers, vec![DialogAnswer::Allow]);
    }

    #[test]
    fn test_closed_input_denies_rest() {
        let console = Console::new(ScriptedReader::new(["a"]));
        let dialog = SystemDialog::new(console, "com.example.app");

        let answers = dialog.ask(&request()).unwrap();
        assert_eq!(answers, vec![DialogAnswer::Allow, DialogAnswer::Deny]);
    }
}
