//! Pterodactyl CLI - command-line access to the Pterodactyl Panel APIs
//!
//! Entry point for the `pterodactyl` binary. Every panel call goes through
//! the rate-limited, retrying transport in `pterodactyl-core`.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Flushes file logging when dropped
    let _log_guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let result = run(cli).await;

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            drop(_log_guard);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli), fields(command = ?cli.command))]
async fn run(cli: Cli) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let config = {
        let _config_timer = Timer::new("config_loading");
        Config::load_with_file(cli.config.as_deref())?
    };

    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);
    if !config.output.progress {
        output = output.without_progress();
    }

    tracing::info!(
        command = ?cli.command,
        profiles = config.profiles.len(),
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Request(args) => handlers::handle_request(args, &config, &mut output).await,
        Commands::List(args) => handlers::handle_list(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["pterodactyl", "-vv", "list", "/servers"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["pterodactyl", "--quiet", "request", "GET", "/account"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert!(matches!(cli.command, Commands::Request(_)));
    }
}
