//! Sign-in, sign-out, and session inspection.

use std::io::Read;

use chrono::{DateTime, Utc};
use dialoguer::Password;
use secrecy::SecretString;
use serde::Serialize;

use funrun_core::{RateLimiter, StaffIdentity, StoredSession};

use crate::cli::LoginArgs;
use crate::config::Context;
use crate::error::{CliError, prompt_err};
use crate::output;

use super::util;

/// Limiter key for interactive sign-in attempts.
const LOGIN_KEY: &str = "login_attempt";

/// What `whoami` and `login` print.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    name: String,
    email: String,
    google_id: String,
    session_id: String,
    signed_in_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionView {
    fn new(session: StoredSession, ctx: &Context) -> Self {
        let expires_at = session.expires_at(ctx.session_store().max_age());
        Self {
            name: session.identity.name,
            email: session.identity.email,
            google_id: session.identity.google_id,
            session_id: session.session_id,
            signed_in_at: session.saved_at,
            expires_at,
        }
    }
}

fn render(view: &SessionView, ctx: &Context) -> Result<String, CliError> {
    let color = ctx.color;
    output::render_single(
        ctx.output,
        view,
        |v| {
            output::detail(
                &[
                    ("Name", v.name.clone()),
                    ("Email", v.email.clone()),
                    ("Google ID", v.google_id.clone()),
                    ("Signed in", v.signed_in_at.to_rfc3339()),
                    ("Expires", v.expires_at.to_rfc3339()),
                ],
                color,
            )
        },
        |v| v.email.clone(),
    )
}

// ── Handlers ─────────────────────────────────────────────────────────

pub fn login(args: &LoginArgs, ctx: &Context) -> Result<(), CliError> {
    let policy = ctx.access_policy();
    if policy.authorized_count() == 0 {
        tracing::warn!(config = %ctx.path.display(), "no authorized users configured");
    }

    let identity = match args.id_token.as_deref() {
        Some("-") => authenticate(&policy, read_stdin_token()?)?,
        Some(token) => authenticate(&policy, SecretString::from(token.trim().to_owned()))?,
        None if util::interactive() => prompt_until_signed_in(ctx)?,
        None => {
            return Err(CliError::Validation {
                field: "id-token".into(),
                reason: "no token given; pass --id-token, '-' for stdin, or set FUNRUN_ID_TOKEN"
                    .into(),
            });
        }
    };

    let session = ctx.session_store().save(&identity, Utc::now())?;
    output::print_status(
        &output::success(&format!("Signed in as {}", identity.received_by()), ctx.color),
        ctx.quiet,
    );
    output::print_output(&render(&SessionView::new(session, ctx), ctx)?, ctx.quiet);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.session_store().clear()?;
    output::print_status(&output::success("Signed out", ctx.color), ctx.quiet);
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<(), CliError> {
    let session = util::require_session(ctx)?;
    output::print_output(&render(&SessionView::new(session, ctx), ctx)?, ctx.quiet);
    Ok(())
}

// ── Token sources ────────────────────────────────────────────────────

fn authenticate(
    policy: &funrun_core::AccessPolicy,
    token: SecretString,
) -> Result<StaffIdentity, CliError> {
    Ok(policy.authenticate(&token, Utc::now())?)
}

fn read_stdin_token() -> Result<SecretString, CliError> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(SecretString::from(buf.trim().to_owned()))
}

/// Keep asking for a token until one is accepted, the staff member gives
/// up with an empty answer, or the sign-in rate limit trips.
fn prompt_until_signed_in(ctx: &Context) -> Result<StaffIdentity, CliError> {
    let policy = ctx.access_policy();
    let limit = ctx.config.general_rate_limit();
    let limiter = RateLimiter::in_memory();

    loop {
        if !limiter.check(LOGIN_KEY, limit) {
            let status = limiter.status(LOGIN_KEY, limit);
            let retry_after_secs = status
                .reset_at
                .signed_duration_since(Utc::now())
                .num_seconds()
                .max(1)
                .unsigned_abs();
            return Err(CliError::RateLimited { retry_after_secs });
        }

        let token = Password::new()
            .with_prompt("Google ID token (empty to cancel)")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_err)?;
        if token.trim().is_empty() {
            return Err(CliError::NotSignedIn);
        }

        match authenticate(&policy, SecretString::from(token.trim().to_owned())) {
            Ok(identity) => return Ok(identity),
            Err(e) => output::print_status(&output::warning(&e.to_string(), ctx.color), false),
        }
    }
}
