mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

use clap::Parser;
use stockwatch_core::messages;
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::CliError;

fn main() {
    match run() {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(error.exit_code());
        }
    }
}

fn run() -> Result<i32, CliError> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    logging::init(&settings.log_level, settings.log_format)?;
    messages::install_locale(settings.locale)?;

    let request_id = Uuid::new_v4();
    let _span = info_span!("command", %request_id).entered();
    debug!(
        locale = %settings.locale,
        db = %settings.warehouse.db_path.display(),
        "settings resolved"
    );

    let outcome = commands::run(&cli, &settings)?;
    output::render(&outcome.result, cli.format, cli.pretty)?;
    debug!(exit_code = outcome.exit_code, "command finished");

    Ok(outcome.exit_code)
}
