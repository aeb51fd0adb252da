// ── Persisted staff session ──
//
// A small JSON key-value file holding the signed-in staff member between
// invocations. Values are strings, so the file can sit next to other
// client state without a schema of its own.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::StaffIdentity;

/// Staff identity JSON plus the session id.
pub const USER_KEY: &str = "funrun_auth_user";
/// Milliseconds since the epoch at sign-in.
pub const TIMESTAMP_KEY: &str = "funrun_auth_timestamp";
/// The session id on its own.
pub const SESSION_KEY: &str = "funrun_auth_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A restored, still-valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub identity: StaffIdentity,
    pub session_id: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    /// When this session stops being accepted.
    pub fn expires_at(&self, max_age: TimeDelta) -> DateTime<Utc> {
        self.saved_at
            .checked_add_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Outcome of [`SessionStore::restore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    Active(StoredSession),
    /// A session existed but was too old; it has been cleared.
    Expired,
    /// Nothing usable was stored.
    Missing,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    identity: StaffIdentity,
    #[serde(default)]
    session_id: Option<String>,
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    max_age: TimeDelta,
}

impl SessionStore {
    /// Sessions older than this are discarded on restore.
    pub const DEFAULT_MAX_AGE: TimeDelta = TimeDelta::hours(24);

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_age: Self::DEFAULT_MAX_AGE,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: TimeDelta) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age(&self) -> TimeDelta {
        self.max_age
    }

    /// Load the stored session, clearing it if it is unusable.
    ///
    /// Malformed data and structurally invalid users are cleared and
    /// reported as [`Restored::Missing`]; sessions at or past `max_age` are
    /// cleared and reported as [`Restored::Expired`].
    pub fn restore(&self, now: DateTime<Utc>) -> Result<Restored, SessionError> {
        let Some(entries) = self.read()? else {
            return Ok(Restored::Missing);
        };

        let (Some(user), Some(timestamp)) = (entries.get(USER_KEY), entries.get(TIMESTAMP_KEY))
        else {
            if entries.contains_key(USER_KEY) || entries.contains_key(TIMESTAMP_KEY) {
                warn!(path = %self.path.display(), "incomplete session, clearing");
                self.clear()?;
            }
            return Ok(Restored::Missing);
        };

        let Some(stored) = parse_user(user) else {
            warn!(path = %self.path.display(), "invalid stored user, clearing session");
            self.clear()?;
            return Ok(Restored::Missing);
        };

        let Some(saved_at) = timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
        else {
            warn!(path = %self.path.display(), "invalid session timestamp, clearing");
            self.clear()?;
            return Ok(Restored::Missing);
        };

        if now.signed_duration_since(saved_at) >= self.max_age {
            debug!(email = %stored.identity.email, "session expired");
            self.clear()?;
            return Ok(Restored::Expired);
        }

        let session_id = stored
            .session_id
            .or_else(|| entries.get(SESSION_KEY).cloned())
            .unwrap_or_default();

        Ok(Restored::Active(StoredSession {
            identity: stored.identity,
            session_id,
            saved_at,
        }))
    }

    /// Persist `identity` under a fresh session id.
    pub fn save(
        &self,
        identity: &StaffIdentity,
        now: DateTime<Utc>,
    ) -> Result<StoredSession, SessionError> {
        let session_id = Uuid::new_v4().simple().to_string();
        let user = serde_json::to_string(&StoredUser {
            identity: identity.clone(),
            session_id: Some(session_id.clone()),
        })?;

        let mut entries = self.read()?.unwrap_or_default();
        entries.insert(USER_KEY.into(), user);
        entries.insert(TIMESTAMP_KEY.into(), now.timestamp_millis().to_string());
        entries.insert(SESSION_KEY.into(), session_id.clone());
        self.write(&entries)?;

        debug!(email = %identity.email, path = %self.path.display(), "session saved");
        Ok(StoredSession {
            identity: identity.clone(),
            session_id,
            saved_at: now,
        })
    }

    /// Remove the session keys. Other keys in the file are kept.
    pub fn clear(&self) -> Result<(), SessionError> {
        let Some(mut entries) = self.read_lenient()? else {
            return Ok(());
        };
        for key in [USER_KEY, TIMESTAMP_KEY, SESSION_KEY] {
            entries.remove(key);
        }

        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(self.io_error(source)),
            };
        }
        self.write(&entries)
    }

    // ── File access ──────────────────────────────────────────────────

    /// `None` if the file is absent. A corrupt file is cleared.
    fn read(&self) -> Result<Option<BTreeMap<String, String>>, SessionError> {
        let Some(contents) = self.read_raw()? else {
            return Ok(None);
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt session file, removing");
                self.remove_file()?;
                Ok(None)
            }
        }
    }

    /// Like `read`, but a corrupt file is removed and reported as empty.
    fn read_lenient(&self) -> Result<Option<BTreeMap<String, String>>, SessionError> {
        let Some(contents) = self.read_raw()? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&contents).unwrap_or_default()))
    }

    fn read_raw(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let contents = serde_json::to_string_pretty(entries)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

        // `mode` only applies on creation; tighten an older file before writing.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        file.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))
    }

    fn remove_file(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parse the stored user, rejecting identities with blank required fields.
fn parse_user(raw: &str) -> Option<StoredUser> {
    let stored: StoredUser = serde_json::from_str(raw).ok()?;
    let id = &stored.identity;
    if id.email.is_empty() || id.name.is_empty() || id.google_id.is_empty() {
        return None;
    }
    Some(stored)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn staff() -> StaffIdentity {
        StaffIdentity {
            name: "Finance Office".into(),
            email: "finance@g.cjc.edu.ph".into(),
            google_id: "109876543210".into(),
            picture: None,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("state").join("session.json"))
    }

    #[test]
    fn missing_file_is_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).restore(now()).unwrap(), Restored::Missing);
    }

    #[test]
    fn save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let saved = store.save(&staff(), now()).unwrap();
        assert_eq!(saved.session_id.len(), 32);

        let restored = store.restore(now() + TimeDelta::hours(23)).unwrap();
        assert_eq!(restored, Restored::Active(saved));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&staff(), now()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();
        store.save(&staff(), now()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let saved = store.save(&staff(), now()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let entries: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries[TIMESTAMP_KEY], now().timestamp_millis().to_string());
        assert_eq!(entries[SESSION_KEY], saved.session_id);

        let user: serde_json::Value = serde_json::from_str(&entries[USER_KEY]).unwrap();
        assert_eq!(user["googleId"], "109876543210");
        assert_eq!(user["sessionId"], saved.session_id.as_str());
    }

    #[test]
    fn sessions_expire_after_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&staff(), now()).unwrap();

        let restored = store.restore(now() + TimeDelta::hours(24)).unwrap();
        assert_eq!(restored, Restored::Expired);
        assert!(!store.path().exists());
        assert_eq!(store.restore(now()).unwrap(), Restored::Missing);
    }

    #[test]
    fn custom_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).with_max_age(TimeDelta::minutes(5));
        store.save(&staff(), now()).unwrap();
        assert_eq!(
            store.restore(now() + TimeDelta::minutes(6)).unwrap(),
            Restored::Expired
        );
    }

    #[test]
    fn invalid_user_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let entries = BTreeMap::from([
            (USER_KEY.to_owned(), r#"{"name":"X","email":"","googleId":"1"}"#.to_owned()),
            (TIMESTAMP_KEY.to_owned(), now().timestamp_millis().to_string()),
        ]);
        std::fs::write(store.path(), serde_json::to_string(&entries).unwrap()).unwrap();

        assert_eq!(store.restore(now()).unwrap(), Restored::Missing);
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.restore(now()).unwrap(), Restored::Missing);
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&staff(), now()).unwrap();

        let mut entries: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        entries.insert("theme".into(), "dark".into());
        std::fs::write(store.path(), serde_json::to_string(&entries).unwrap()).unwrap();

        store.clear().unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.trim(), "{\n  \"theme\": \"dark\"\n}");
        assert_eq!(store.restore(now()).unwrap(), Restored::Missing);
    }

    #[test]
    fn clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        store(&dir).clear().unwrap();
    }
}
