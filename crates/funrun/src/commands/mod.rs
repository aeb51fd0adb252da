//! Command handlers, one module per subcommand group.

pub mod config_cmd;
pub mod record;
pub mod session;
pub mod stats;
pub mod util;
pub mod validate;

use crate::cli::Command;
use crate::config::Context;
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Record(args) => record::handle(args, ctx).await,
        Command::Validate(args) => validate::handle(&args, ctx),
        Command::Stats(args) => stats::handle(&args, ctx).await,
        Command::Login(args) => session::login(&args, ctx),
        Command::Logout => session::logout(ctx),
        Command::Whoami => session::whoami(ctx),
        // Handled in main before a context is built
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
