use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout only carries results.
pub fn init(level: &str, format: LogFormat) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|err| CliError::Config(format!("invalid log level '{level}': {err}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.with_ansi(false).try_init(),
    };
    installed.map_err(|err| CliError::Config(format!("cannot install logger: {err}")))
}
