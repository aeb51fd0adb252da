//! CLI-side configuration: file location, flag overrides, and the
//! per-invocation context handed to every command.
//!
//! The file format itself lives in `funrun_config`; this module only
//! layers `--config`, `--backend-url`, `--timeout`, and the output flags
//! on top.

use std::path::PathBuf;

use clap::ValueEnum;

use funrun_config::Config;
use funrun_core::{AccessPolicy, RecorderConfig, SessionStore};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// The config file this invocation reads: `--config` / `FUNRUN_CONFIG`,
/// else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(funrun_config::config_path)
}

/// Load file + environment, then apply command-line overrides.
pub fn load(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = config_path(global);
    let mut cfg = funrun_config::load_config_from(&path)?;
    apply_overrides(&mut cfg, global);
    Ok((cfg, path))
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.backend_url {
        cfg.backend.submit_url = Some(url.clone());
    }
    if let Some(secs) = global.timeout {
        cfg.backend.timeout = secs;
    }
}

// ── Per-invocation context ───────────────────────────────────────────

/// Everything a command handler needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub path: PathBuf,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let (config, path) = load(global)?;

        // Flags beat the [defaults] section; unparseable defaults fall back
        // to the built-in ones.
        let output = global.output.unwrap_or_else(|| {
            OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
        });
        let color_mode = global.color.unwrap_or_else(|| {
            ColorMode::from_str(&config.defaults.color, true).unwrap_or(ColorMode::Auto)
        });

        Ok(Self {
            output,
            color: output::should_color(color_mode),
            quiet: global.quiet,
            config,
            path,
        })
    }

    pub fn recorder_config(&self) -> Result<RecorderConfig, CliError> {
        Ok(self.config.to_recorder_config(&self.path)?)
    }

    pub fn session_store(&self) -> SessionStore {
        self.config.session_store()
    }

    pub fn access_policy(&self) -> AccessPolicy {
        self.config.access_policy()
    }
}
