//! Config subcommand handlers.
//!
//! These run without a command context so they work before the config
//! file exists or while it is invalid.

use crate::cli::{ColorMode, ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);
    let color = output::should_color(global.color.unwrap_or(ColorMode::Auto));

    match &args.command {
        ConfigCommand::Init { force } => {
            let overwrite = *force
                || (path.exists()
                    && (global.yes
                        || (util::interactive()
                            && util::confirm(
                                &format!("{} exists. Overwrite?", path.display()),
                                false,
                            )?)));
            funrun_config::write_template(&path, overwrite)?;
            output::print_status(
                &output::success(&format!("Wrote {}", path.display()), color),
                global.quiet,
            );
            output::print_status(
                "Set backend.submit_url and auth.authorized_users before recording payments.",
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let (cfg, _) = config::load(global)?;
            // Effective values print as TOML unless a structured format was asked for
            let rendered = match global.output.unwrap_or(OutputFormat::Table) {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Serialize(e.to_string()))?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), false);
            Ok(())
        }
    }
}
