//! Configuration for the funrun CLI.
//!
//! TOML file + `FUNRUN_` environment variables, layered with figment, and
//! translation to the runtime policies in `funrun_core`. The binary adds
//! flag-aware overrides on top.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use funrun_core::{
    AccessPolicy, PaymentMethod, PaymentPolicy, RateLimitPolicy, RecorderConfig, SchoolPolicy,
    SessionStore, SubmitPolicy,
};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `FUNRUN_BACKEND__SUBMIT_URL`.
pub const ENV_PREFIX: &str = "FUNRUN_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{field} is not set (add it to {} or set {env})", path.display())]
    Missing {
        field: &'static str,
        env: &'static str,
        path: PathBuf,
    },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub school: School,
    #[serde(default)]
    pub payment: Payment,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub session: Session,
}

/// Output preferences for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Where the backend lives and how hard to try reaching it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Backend {
    /// Web-app URL payment records are POSTed to.
    pub submit_url: Option<String>,

    /// Statistics endpoint. Falls back to `submit_url`.
    pub stats_url: Option<String>,

    /// Overall budget for one submission, retries included (seconds).
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Per-request HTTP timeout (seconds).
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff step between attempts (milliseconds).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            submit_url: None,
            stats_url: None,
            timeout: default_timeout(),
            request_timeout: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct School {
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Hours east of UTC used for display timestamps and stats dates.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for School {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_domain() -> String {
    funrun_core::config::DEFAULT_SCHOOL_DOMAIN.into()
}
fn default_utc_offset_hours() -> i32 {
    funrun_core::config::DEFAULT_UTC_OFFSET_HOURS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payment {
    #[serde(default = "default_amount")]
    pub amount: u32,

    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            method: default_method(),
        }
    }
}

fn default_amount() -> u32 {
    funrun_core::config::DEFAULT_PAYMENT_AMOUNT
}
fn default_method() -> String {
    PaymentMethod::Cash.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimit {
    /// General limit, applied to interactive sign-in attempts.
    #[serde(default = "default_rl_max")]
    pub max_attempts: u32,

    #[serde(default = "default_rl_window")]
    pub window_secs: u64,

    /// Payment submissions per staff member per window.
    #[serde(default = "default_rl_form_max")]
    pub form_max_attempts: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_attempts: default_rl_max(),
            window_secs: default_rl_window(),
            form_max_attempts: default_rl_form_max(),
        }
    }
}

fn default_rl_max() -> u32 {
    RateLimitPolicy::DEFAULT.max_attempts
}
fn default_rl_window() -> u64 {
    RateLimitPolicy::DEFAULT.window.as_secs()
}
fn default_rl_form_max() -> u32 {
    RateLimitPolicy::FORM_SUBMISSION.max_attempts
}

/// Staff allowed to take payments. The only place this list lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Auth {
    #[serde(default)]
    pub authorized_users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    /// Session file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            path: None,
            max_age_hours: default_max_age_hours(),
        }
    }
}

fn default_max_age_hours() -> u32 {
    24
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("ph", "csg", "funrun")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("funrun");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the session file lives unless `[session] path` says otherwise.
pub fn default_session_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("session.json"),
        |dirs| dirs.data_local_dir().join("session.json"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file (which need not exist) + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write the commented starter config to `path`, creating directories.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_template(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::Validation {
            field: "path".into(),
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, TEMPLATE)?;
    Ok(())
}

/// Starter configuration written by `funrun config init`.
pub const TEMPLATE: &str = r#"# funrun configuration
#
# Every key can also be set through the environment, e.g.
#   FUNRUN_BACKEND__SUBMIT_URL=https://script.google.com/macros/s/.../exec

[backend]
# Web-app deployment that appends payment rows.
submit_url = "https://script.google.com/macros/s/REPLACE_ME/exec"
# Statistics endpoint; defaults to submit_url.
# stats_url = ""
timeout = 30
request_timeout = 30
max_attempts = 3
backoff_ms = 1000

[school]
domain = "g.cjc.edu.ph"
utc_offset_hours = 8

[payment]
amount = 200
method = "Cash"

[rate_limit]
max_attempts = 5
window_secs = 60
form_max_attempts = 10

[auth]
# Staff accounts allowed to receive payments.
authorized_users = [
    "finance@g.cjc.edu.ph",
]

[session]
max_age_hours = 24
"#;

// ── Translation to runtime policies ─────────────────────────────────

impl Config {
    /// Build the recorder's runtime config. `source` names the file in
    /// error messages.
    pub fn to_recorder_config(&self, source: &Path) -> Result<RecorderConfig, ConfigError> {
        let submit_raw = self
            .backend
            .submit_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "backend.submit_url",
                env: "FUNRUN_BACKEND__SUBMIT_URL",
                path: source.to_path_buf(),
            })?;
        let submit_url = parse_url("backend.submit_url", submit_raw)?;

        let stats_url = match self.backend.stats_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_url("backend.stats_url", raw)?,
            _ => submit_url.clone(),
        };

        if self.backend.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "backend.timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let mut config = RecorderConfig::new(submit_url, stats_url);
        config.request_timeout = Duration::from_secs(self.backend.request_timeout.max(1));
        config.school = self.school_policy()?;
        config.payment = self.payment_policy()?;
        config.submit = SubmitPolicy {
            max_attempts: self.backend.max_attempts.max(1),
            backoff_step: Duration::from_millis(self.backend.backoff_ms),
            timeout: Duration::from_secs(self.backend.timeout),
        };
        config.form_rate_limit = RateLimitPolicy::new(
            self.rate_limit.form_max_attempts,
            Duration::from_secs(self.rate_limit.window_secs),
        );
        Ok(config)
    }

    pub fn school_policy(&self) -> Result<SchoolPolicy, ConfigError> {
        SchoolPolicy::new(self.school.domain.clone(), self.school.utc_offset_hours).map_err(|e| {
            ConfigError::Validation {
                field: "school".into(),
                reason: e.to_string(),
            }
        })
    }

    pub fn payment_policy(&self) -> Result<PaymentPolicy, ConfigError> {
        if self.payment.amount == 0 {
            return Err(ConfigError::Validation {
                field: "payment.amount".into(),
                reason: "must be greater than zero".into(),
            });
        }
        let method =
            PaymentMethod::from_str(self.payment.method.trim()).map_err(|_| ConfigError::Validation {
                field: "payment.method".into(),
                reason: format!("unknown payment method '{}'", self.payment.method),
            })?;
        Ok(PaymentPolicy {
            amount: self.payment.amount,
            method,
        })
    }

    /// General-purpose limit from `[rate_limit]`.
    pub fn general_rate_limit(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.rate_limit.max_attempts,
            Duration::from_secs(self.rate_limit.window_secs),
        )
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(&self.school.domain, &self.auth.authorized_users)
    }

    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(default_session_path)
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(self.session_path())
            .with_max_age(TimeDelta::hours(i64::from(self.session.max_age_hours)))
    }
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_policy_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.payment.amount, 200);
        assert_eq!(cfg.payment.method, "Cash");
        assert_eq!(cfg.rate_limit.form_max_attempts, 10);
        assert_eq!(cfg.rate_limit.max_attempts, 5);
        assert_eq!(cfg.school.utc_offset_hours, 8);
        assert_eq!(cfg.session.max_age_hours, 24);
        assert_eq!(cfg.general_rate_limit(), RateLimitPolicy::DEFAULT);
    }

    #[test]
    fn missing_submit_url_is_reported() {
        let err = Config::default()
            .to_recorder_config(Path::new("/tmp/funrun.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "backend.submit_url", .. }));
        assert!(err.to_string().contains("FUNRUN_BACKEND__SUBMIT_URL"));
    }

    #[test]
    fn stats_url_falls_back_to_submit_url() {
        let mut cfg = Config::default();
        cfg.backend.submit_url = Some("https://script.google.com/macros/s/abc/exec".into());
        let recorder = cfg.to_recorder_config(Path::new("config.toml")).unwrap();
        assert_eq!(recorder.stats_url, recorder.submit_url);
        assert_eq!(recorder.submit.max_attempts, 3);
        assert_eq!(recorder.submit.timeout, Duration::from_secs(30));
        assert_eq!(recorder.form_rate_limit, RateLimitPolicy::FORM_SUBMISSION);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.backend.submit_url = Some("ftp://example.com".into());
        assert!(cfg.to_recorder_config(Path::new("c.toml")).is_err());

        cfg.backend.submit_url = Some("https://example.com/exec".into());
        cfg.payment.method = "Barter".into();
        let err = cfg.to_recorder_config(Path::new("c.toml")).unwrap_err();
        assert!(err.to_string().contains("payment.method"));
    }

    #[test]
    fn access_policy_uses_configured_list() {
        let mut cfg = Config::default();
        cfg.auth.authorized_users = vec!["Finance@g.cjc.edu.ph".into()];
        let policy = cfg.access_policy();
        assert!(policy.is_authorized("finance@g.cjc.edu.ph"));
        assert!(!policy.is_authorized("admin@g.cjc.edu.ph"));
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [backend]
                submit_url = "https://file.example.com/exec"
                max_attempts = 5

                [auth]
                authorized_users = ["finance@g.cjc.edu.ph"]
                "#,
            )?;
            jail.set_env("FUNRUN_BACKEND__SUBMIT_URL", "https://env.example.com/exec");
            jail.set_env("FUNRUN_PAYMENT__AMOUNT", "250");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(
                cfg.backend.submit_url.as_deref(),
                Some("https://env.example.com/exec")
            );
            assert_eq!(cfg.backend.max_attempts, 5);
            assert_eq!(cfg.payment.amount, 250);
            assert_eq!(cfg.auth.authorized_users, vec!["finance@g.cjc.edu.ph"]);
            Ok(())
        });
    }

    #[test]
    fn template_parses_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_template(&path, false).unwrap();
        assert!(write_template(&path, false).is_err());

        let cfg: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cfg.auth.authorized_users, vec!["finance@g.cjc.edu.ph"]);

        save_config_to(&cfg, &path).unwrap();
        let again: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(again, cfg);
    }

    #[test]
    fn session_path_override() {
        let mut cfg = Config::default();
        cfg.session.path = Some(PathBuf::from("/tmp/funrun-session.json"));
        cfg.session.max_age_hours = 8;
        let store = cfg.session_store();
        assert_eq!(store.path(), Path::new("/tmp/funrun-session.json"));
        assert_eq!(store.max_age(), TimeDelta::hours(8));
    }
}
