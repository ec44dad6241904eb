//! One negotiation against a simulated device.

use crate::dialog::SystemDialog;
use crate::error::CliError;
use crate::input::Console;
use crate::profile::{DeviceProfile, SimulatedHost};
use crate::prompt::TerminalPrompter;
use permit_core::{outcome_channel, NegotiationEvent, Negotiator, NegotiatorConfig, Outcome};

/// What one run produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: Outcome,
    /// Whether every requested capability is granted after the run, read
    /// from live device state rather than the outcome.
    pub satisfied: bool,
    pub settings_opened: bool,
}

/// Drives negotiations for a simulated device from the terminal.
///
/// The session plays the lifecycle collaborator: it starts a negotiation,
/// shows the system dialog for whatever the host was asked, and forwards
/// the answers back with the request code the host received.
pub struct Session {
    host: SimulatedHost,
    negotiator: Negotiator,
    dialog: SystemDialog,
}

impl Session {
    pub fn new(
        profile: &DeviceProfile,
        config: NegotiatorConfig,
        console: Console,
    ) -> Result<Self, CliError> {
        let host = SimulatedHost::new(profile);
        let negotiator = Negotiator::new(
            host.clone(),
            profile.probe(),
            TerminalPrompter::new(console.clone()),
        )
        .with_config(config)?;
        negotiator.add_hook(|event: &NegotiationEvent| log::debug!("{:?}", event));

        Ok(Self {
            dialog: SystemDialog::new(console, profile.package.clone()),
            host,
            negotiator,
        })
    }

    pub fn host(&self) -> &SimulatedHost {
        &self.host
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    /// Negotiate the configured capabilities once.
    ///
    /// When something is still missing afterwards, the settings redirect is
    /// offered.
    pub async fn run(&mut self) -> Result<SessionReport, CliError> {
        let (tx, rx) = outcome_channel();
        let mut negotiation = self.negotiator.request_configured_permissions(tx);

        if let Some(pending) = self.host.take_pending() {
            let answers = self.dialog.ask(&pending)?;
            let codes = self.host.apply(&pending, &answers);
            negotiation.on_request_permissions_result(pending.code, &pending.capabilities, &codes);
        }
        drop(negotiation);

        let outcome = rx
            .await
            .map_err(|_| CliError::Session("negotiation ended without an outcome".into()))?;
        print_outcome(&outcome);

        let satisfied = self.negotiator.classify(outcome.requested()).is_satisfied();
        let settings_opened = if satisfied {
            false
        } else {
            self.negotiator.open_settings()?
        };

        Ok(SessionReport {
            outcome,
            satisfied,
            settings_opened,
        })
    }
}

/// Print the result vector, one capability per line.
pub fn print_outcome(outcome: &Outcome) {
    println!(
        "\n\x1b[1mRequest {}\x1b[0m ({:?})",
        outcome.request_code(),
        outcome.path()
    );
    for (capability, result) in &outcome.result_vector() {
        if result.is_granted() {
            println!("  \x1b[32m✓\x1b[0m {} {}", capability.short_name(), result);
        } else {
            println!("  \x1b[31m✗\x1b[0m {} {}", capability.short_name(), result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedReader;
    use crate::profile::ProfileState;
    use permit_core::capability::{ACCESS_FINE_LOCATION, READ_CONTACTS, READ_SMS};
    use permit_core::{DeclinedRationalePolicy, OutcomePath, RequestCode};

    const PROFILE: &str = r#"{
        "api_level": 30,
        "capabilities": {
            "android.permission.ACCESS_FINE_LOCATION": { "state": "granted" },
            "android.permission.READ_CONTACTS": { "state": "rationale" }
        }
    }"#;

    fn session(lines: &[&str], capabilities: Vec<permit_core::Capability>) -> Session {
        let profile = DeviceProfile::from_json(PROFILE).unwrap();
        let config = NegotiatorConfig {
            capabilities,
            ..NegotiatorConfig::default()
        };
        let console = Console::new(ScriptedReader::new(lines.iter().copied()));
        Session::new(&profile, config, console).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_request_is_answered() {
        let mut session = session(&["a"], vec![ACCESS_FINE_LOCATION, READ_SMS]);

        let report = session.run().await.unwrap();

        assert_eq!(report.outcome.path(), OutcomePath::FreshRequest);
        assert_eq!(report.outcome.asked(), &[READ_SMS]);
        assert_eq!(report.outcome.result_vector().codes(), vec![0, 0]);
        assert!(report.satisfied);
        assert!(!report.settings_opened);
        assert_eq!(session.host().state_of(&READ_SMS), ProfileState::Granted);
    }

    #[tokio::test]
    async fn test_denial_offers_settings() {
        // deny SMS, then accept the settings redirect
        let mut session = session(&["d", "y"], vec![READ_SMS]);

        let report = session.run().await.unwrap();

        assert_eq!(report.outcome.result_codes(), vec![-1]);
        assert!(!report.satisfied);
        assert!(report.settings_opened);
        assert_eq!(session.host().settings_opened(), 1);
    }

    #[tokio::test]
    async fn test_rationale_accepted_then_allowed() {
        // accept rationale, allow contacts
        let mut session = session(&["y", "a"], vec![ACCESS_FINE_LOCATION, READ_CONTACTS]);

        let report = session.run().await.unwrap();

        assert_eq!(report.outcome.path(), OutcomePath::RationaleRequest);
        assert_eq!(report.outcome.asked(), &[READ_CONTACTS]);
        assert!(report.satisfied);
    }

    #[tokio::test]
    async fn test_declined_rationale_still_offers_settings() {
        // decline rationale, decline settings
        let mut session = session(&["n", "n"], vec![READ_CONTACTS]);

        let report = session.run().await.unwrap();

        assert_eq!(report.outcome.path(), OutcomePath::RationaleDeclined);
        assert_eq!(report.outcome.result_codes(), vec![0]);
        assert!(!report.satisfied);
        assert!(!report.settings_opened);
    }

    #[tokio::test]
    async fn test_second_run_sees_new_state() {
        let mut session = session(&["d", "n", "y", "a"], vec![READ_SMS]);

        let first = session.run().await.unwrap();
        assert_eq!(first.outcome.request_code(), RequestCode(123));
        assert_eq!(session.host().state_of(&READ_SMS), ProfileState::Rationale);

        let second = session.run().await.unwrap();
        assert_eq!(second.outcome.request_code(), RequestCode(124));
        assert_eq!(second.outcome.path(), OutcomePath::RationaleRequest);
        assert!(second.satisfied);
    }

    #[tokio::test]
    async fn test_deny_always_is_not_asked_again() {
        // never SMS, decline settings; second run only answers settings
        let mut session = session(&["n", "n", "y"], vec![READ_SMS]);

        let first = session.run().await.unwrap();
        assert_eq!(first.outcome.result_codes(), vec![-1]);
        assert!(!first.settings_opened);
        assert_eq!(session.host().state_of(&READ_SMS), ProfileState::Blocked);

        let second = session.run().await.unwrap();
        assert_eq!(second.outcome.path(), OutcomePath::FreshRequest);
        assert_eq!(second.outcome.result_codes(), vec![-1]);
        assert!(!second.satisfied);
        assert!(second.settings_opened);
        assert_eq!(session.host().state_of(&READ_SMS), ProfileState::Blocked);
    }

    #[tokio::test]
    async fn test_mark_denied_policy_from_config() {
        let profile = DeviceProfile::from_json(PROFILE).unwrap();
        let config = NegotiatorConfig {
            capabilities: vec![READ_CONTACTS],
            declined_rationale: DeclinedRationalePolicy::MarkDenied,
            ..NegotiatorConfig::default()
        };
        let console = Console::new(ScriptedReader::new(["n", "n"]));
        let mut session = Session::new(&profile, config, console).unwrap();

        let report = session.run().await.unwrap();
        assert_eq!(report.outcome.result_codes(), vec![-1]);
    }
}
