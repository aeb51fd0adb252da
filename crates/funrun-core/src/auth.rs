// ── Staff authentication ──
//
// Turns a Google ID token into a `StaffIdentity`. The token is decoded and
// its claims checked (structure, expiry, issuer, required fields), then the
// email is held against the school domain and the authorized-users list.
//
// Signatures are NOT verified here. The token comes straight from Google's
// sign-in flow and the backend is the final authority on what it accepts.

use std::collections::HashSet;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::StaffIdentity;
use crate::security::{is_valid_domain, log_security_event};

/// Base64url, padded or not.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Substring every Google issuer contains.
const GOOGLE_ISSUER: &str = "accounts.google.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Malformed ID token: {reason}")]
    Malformed { reason: &'static str },

    #[error("ID token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("ID token was not issued by Google (issuer: {issuer})")]
    InvalidIssuer { issuer: String },

    #[error("ID token is missing required claims: {missing}")]
    MissingClaims { missing: String },

    #[error("Access denied. Only @{domain} accounts are allowed. Your email: {email}")]
    DomainNotAllowed { email: String, domain: String },

    #[error(
        "Access denied. You are not authorized to receive payments. Your email: {email}. \
         Contact the administrator to be added to the authorized users list."
    )]
    NotAuthorized { email: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session expired. Please sign in again.")]
    SessionExpired,
}

/// Claims read from the ID token payload. Unknown claims are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iss: Option<String>,
    /// Expiry, seconds since the epoch.
    pub exp: Option<i64>,
}

/// Decode an ID token's payload without verifying its signature.
///
/// The token must have three non-empty, base64url-decodable parts, and the
/// middle one must be a JSON object.
pub fn decode_claims(token: &str) -> Result<IdTokenClaims, AuthError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        return Err(AuthError::Malformed {
            reason: "expected three dot-separated parts",
        });
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(AuthError::Malformed {
            reason: "empty token part",
        });
    }

    for part in [header, signature] {
        TOKEN_ENGINE.decode(part).map_err(|_| AuthError::Malformed {
            reason: "token part is not base64url",
        })?;
    }

    let payload = TOKEN_ENGINE
        .decode(payload)
        .map_err(|_| AuthError::Malformed {
            reason: "payload is not base64url",
        })?;

    serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed {
        reason: "payload is not a JSON object",
    })
}

/// Who may sign in: the school domain plus an explicit allow-list.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    domain: String,
    authorized: HashSet<String>,
}

impl AccessPolicy {
    /// `authorized_users` is compared case-insensitively.
    pub fn new<I, S>(domain: impl Into<String>, authorized_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domain: domain.into().trim_start_matches('@').to_ascii_lowercase(),
            authorized: authorized_users
                .into_iter()
                .map(|email| email.as_ref().trim().to_ascii_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_authorized(&self, email: &str) -> bool {
        self.authorized.contains(&email.to_ascii_lowercase())
    }

    /// How many staff accounts are on the allow-list.
    pub fn authorized_count(&self) -> usize {
        self.authorized.len()
    }

    /// Decode and check a Google ID token, returning the staff identity.
    pub fn authenticate(
        &self,
        id_token: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<StaffIdentity, AuthError> {
        let claims = decode_claims(id_token.expose_secret()).inspect_err(|e| {
            log_security_event("invalid_token", &serde_json::json!({ "reason": e.to_string() }));
        })?;

        if let Some(exp) = claims.exp.filter(|exp| *exp < now.timestamp()) {
            let expired_at = DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
            log_security_event("expired_token", &serde_json::json!({ "exp": exp }));
            return Err(AuthError::Expired { expired_at });
        }

        if let Some(issuer) = claims.iss.as_ref().filter(|iss| !iss.contains(GOOGLE_ISSUER)) {
            log_security_event("invalid_token_issuer", &serde_json::json!({ "iss": issuer }));
            return Err(AuthError::InvalidIssuer {
                issuer: issuer.clone(),
            });
        }

        let identity = match (claims.email, claims.name, claims.sub) {
            (Some(email), Some(name), Some(sub))
                if !email.is_empty() && !name.is_empty() && !sub.is_empty() =>
            {
                StaffIdentity {
                    name,
                    email,
                    google_id: sub,
                    picture: claims.picture,
                }
            }
            (email, name, sub) => {
                let missing: Vec<&str> = [("email", email), ("name", name), ("sub", sub)]
                    .into_iter()
                    .filter(|(_, v)| v.as_deref().is_none_or(str::is_empty))
                    .map(|(claim, _)| claim)
                    .collect();
                return Err(AuthError::MissingClaims {
                    missing: missing.join(", "),
                });
            }
        };

        self.verify(&identity)?;
        debug!(email = %identity.email, "staff authenticated");
        Ok(identity)
    }

    /// Re-check an identity against the current domain and allow-list.
    ///
    /// Applied to restored sessions too, so removing someone from the list
    /// takes effect without waiting for their session to expire.
    pub fn verify(&self, identity: &StaffIdentity) -> Result<(), AuthError> {
        if !is_valid_domain(&identity.email, &self.domain) {
            log_security_event(
                "domain_not_allowed",
                &serde_json::json!({ "email": identity.email }),
            );
            return Err(AuthError::DomainNotAllowed {
                email: identity.email.clone(),
                domain: self.domain.clone(),
            });
        }

        if !self.is_authorized(&identity.email) {
            log_security_event(
                "unauthorized_user",
                &serde_json::json!({ "email": identity.email }),
            );
            return Err(AuthError::NotAuthorized {
                email: identity.email.clone(),
            });
        }

        Ok(())
    }
}
