mod alert;
mod line;
mod quote;
mod statistic;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stockwatch_core::{into_result, ServiceError, WebServiceMessage, WebServiceResult};
use stockwatch_warehouse::Warehouse;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::error::{service_exit_code, CliError, EXIT_OK};

/// Rendered outcome of one command and the exit code it maps to.
#[derive(Debug)]
pub struct CommandResult {
    pub result: WebServiceResult<Value>,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok<T: Serialize>(data: &T) -> Result<Self, CliError> {
        Ok(Self {
            result: WebServiceResult::with_data(serde_json::to_value(data)?),
            exit_code: EXIT_OK,
        })
    }

    /// Failure already reported as a message.
    pub fn failed(error: &ServiceError) -> Self {
        let mut result = WebServiceResult::empty();
        result.add_message(error.to_message());
        Self {
            result,
            exit_code: service_exit_code(error),
        }
    }

    /// Write outcome with a success message on `Ok`.
    pub fn from_outcome<T: Serialize>(
        outcome: Result<T, ServiceError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<Self, CliError> {
        let exit_code = outcome.as_ref().err().map_or(EXIT_OK, service_exit_code);
        let typed = into_result(outcome, success);

        let mut result = WebServiceResult::new(typed.data().map(serde_json::to_value).transpose()?);
        result.add_messages(typed.messages().iter().cloned());
        Ok(Self { result, exit_code })
    }

    /// Read outcome without a message on `Ok`.
    pub fn from_lookup<T: Serialize>(outcome: Result<T, ServiceError>) -> Result<Self, CliError> {
        match outcome {
            Ok(data) => Self::ok(&data),
            Err(err) => Ok(Self::failed(&err)),
        }
    }

    pub fn with_message(mut self, message: WebServiceMessage) -> Self {
        self.result.add_message(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = WebServiceMessage>) -> Self {
        self.result.add_messages(messages);
        self
    }
}

pub fn run(cli: &Cli, settings: &Settings) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Statistic(command) => statistic::run(command, &open_warehouse(settings)?),
        Command::Alert(command) => alert::run(command, &open_warehouse(settings)?),
        Command::Line(command) => line::run(command, &open_warehouse(settings)?),
        Command::Quote(command) => quote::run(command),
    }
}

fn open_warehouse(settings: &Settings) -> Result<Warehouse, CliError> {
    debug!(path = %settings.warehouse.db_path.display(), "opening warehouse");
    Ok(Warehouse::open(settings.warehouse.clone())?)
}

/// Reads a file, or stdin when the path is `-`.
fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    fs::read_to_string(path)
        .map_err(|err| CliError::Input(format!("cannot read {}: {err}", path.display())))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = read_input(path)?;
    serde_json::from_str(&source)
        .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))
}
