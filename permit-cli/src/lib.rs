//! Terminal front end for permit
//!
//! This crate provides:
//! - A simulated device host driven by a JSON profile
//! - Terminal prompts for the rationale and settings dialogs
//! - A stand-in for the platform's permission dialog
//! - A session runner that forwards dialog answers back into negotiations

mod config;
mod dialog;
mod error;
pub mod input;
pub mod profile;
mod prompt;
pub mod session;

pub use config::{default_config_path, resolve_config};
pub use dialog::SystemDialog;
pub use error::CliError;
pub use input::{Console, EditorReader, LineReader, ScriptedReader};
pub use profile::{
    load_profile, CapabilityProfile, DeviceProfile, DialogAnswer, PendingRequest, ProfileState,
    SimulatedHost,
};
pub use prompt::{print_confirmation, print_prompt_header, TerminalPrompter};
pub use session::{print_outcome, Session, SessionReport};
