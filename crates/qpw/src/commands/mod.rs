//! Command dispatch: bridges CLI args -> core connection -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod criteria;
pub mod lookups;

use qpw_core::Connection;

use crate::cli::{Command, CriteriaCommand, GlobalOpts};
use crate::error::CliError;

/// Dispatch a connection-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    connection: &Connection,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(connection, args, global).await,
        Command::Logout => {
            auth::logout(connection, global);
            Ok(())
        }
        Command::Status => {
            auth::status(connection, profile, global);
            Ok(())
        }
        Command::Whoami => auth::whoami(connection, global).await,
        Command::Lookups(args) => lookups::handle(connection, args, global).await,
        Command::Criteria(args) => match args.command {
            CriteriaCommand::Check { file } => criteria::check(connection, &file, global).await,
            // Offline criteria commands are handled before a connection exists
            CriteriaCommand::New { .. } | CriteriaCommand::Effective { .. } => unreachable!(),
        },
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
