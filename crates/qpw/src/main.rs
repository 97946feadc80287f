mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qpw_config::KeyringStorage;
use qpw_core::Connection;

use crate::cli::{Cli, Command, CriteriaCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { mut global, command } = cli;

    match command {
        // Config commands load (or repair) the file themselves
        Command::Config(args) => return commands::config_cmd::handle(args, &global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "qpw", &mut std::io::stdout());
            return Ok(());
        }

        _ => {}
    }

    let cfg = config::load_config()?;
    global.output = Some(config::output_format(&global, &cfg)?);

    match command {
        // Criteria documents can be built and inspected offline
        Command::Criteria(cli::CriteriaArgs {
            command: CriteriaCommand::New { today },
        }) => {
            commands::criteria::new(today, &global);
            Ok(())
        }
        Command::Criteria(cli::CriteriaArgs {
            command: CriteriaCommand::Effective { file },
        }) => commands::criteria::effective(&file, &global),

        // Everything else talks to the platform
        cmd => {
            let profile = config::active_profile_name(&global, &cfg);
            let conn_config = config::resolve_connection(&global, &cfg, &profile)?;
            let connection = Connection::new(conn_config, KeyringStorage::new(profile.clone()))?;

            tracing::debug!(command = ?cmd, %profile, "dispatching command");
            commands::dispatch(cmd, &connection, &profile, &global).await
        }
    }
}
