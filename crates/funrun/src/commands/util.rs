//! Shared helpers for command handlers.

use std::io::IsTerminal;

use chrono::Utc;
use dialoguer::{Confirm, Input};

use funrun_core::{Restored, StaffIdentity, StoredSession};

use crate::config::Context;
use crate::error::{CliError, prompt_err};

/// Whether prompts can be shown: both stdin and stderr are terminals.
pub fn interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Free-text prompt, pre-filled with `initial`.
pub fn prompt_text(label: &str, initial: &str) -> Result<String, CliError> {
    Input::<String>::new()
        .with_prompt(label)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)
}

/// Restore the stored session and re-check it against the allow-list.
///
/// A session whose owner is no longer authorized is cleared.
pub fn require_session(ctx: &Context) -> Result<StoredSession, CliError> {
    let store = ctx.session_store();
    match store.restore(Utc::now())? {
        Restored::Active(session) => {
            if let Err(e) = ctx.access_policy().verify(&session.identity) {
                store.clear()?;
                return Err(e.into());
            }
            Ok(session)
        }
        Restored::Expired => Err(CliError::SessionExpired {
            max_age_hours: store.max_age().num_hours(),
        }),
        Restored::Missing => Err(CliError::NotSignedIn),
    }
}

/// The signed-in staff member, for commands that act on their behalf.
pub fn require_staff(ctx: &Context) -> Result<StaffIdentity, CliError> {
    require_session(ctx).map(|session| session.identity)
}
