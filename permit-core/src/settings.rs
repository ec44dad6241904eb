//! Redirect to the host's settings page.
//!
//! Once the user has permanently blocked a capability the host stops showing
//! its dialog, and the only way forward is the application's page in system
//! settings. This shares the prompt primitive with the rationale path.

use crate::host::{ConfirmPrompt, HostError, PermissionHost, PromptKind, Prompter};

/// Ask whether to open system settings and do so if the user accepts.
///
/// Returns `Ok(true)` when the settings page was opened and `Ok(false)` when
/// the user declined.
pub fn open_settings<H, Q>(host: &H, prompter: &Q, message: &str) -> Result<bool, HostError>
where
    H: PermissionHost + ?Sized,
    Q: Prompter + ?Sized,
{
    let prompt = ConfirmPrompt {
        kind: PromptKind::Settings,
        message: message.to_string(),
        capabilities: Vec::new(),
    };

    if !prompter.confirm(&prompt).is_accept() {
        log::debug!("settings redirect declined");
        return Ok(false);
    }

    host.open_app_settings()?;
    log::info!("opened settings for {}", host.package_name());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PromptChoice;
    use crate::test_utils::{FakeHost, ScriptedPrompter};

    #[test]
    fn test_accept_opens_settings() {
        let host = FakeHost::new();
        let prompter = ScriptedPrompter::new().answer(PromptChoice::Accept);

        assert!(open_settings(&host, &prompter, "Open settings?").unwrap());
        assert_eq!(host.settings_opened(), 1);

        let prompts = prompter.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].kind, PromptKind::Settings);
        assert_eq!(prompts[0].message, "Open settings?");
    }

    #[test]
    fn test_decline_leaves_settings_closed() {
        let host = FakeHost::new();
        let prompter = ScriptedPrompter::new().answer(PromptChoice::Decline);

        assert!(!open_settings(&host, &prompter, "Open settings?").unwrap());
        assert_eq!(host.settings_opened(), 0);
    }

    #[test]
    fn test_host_failure_propagates() {
        let host = FakeHost::new().with_settings_failure("no settings activity");
        let prompter = ScriptedPrompter::new().answer(PromptChoice::Accept);

        let err = open_settings(&host, &prompter, "Open settings?").unwrap_err();
        assert!(matches!(err, HostError::Settings(_)));
    }
}
