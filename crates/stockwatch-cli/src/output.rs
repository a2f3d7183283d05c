use serde_json::Value;
use stockwatch_core::WebServiceResult;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    result: &WebServiceResult<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    println!("{}", format_result(result, format, pretty)?);
    Ok(())
}

pub fn format_result(
    result: &WebServiceResult<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Table => format_table(result),
    }
}

fn format_table(result: &WebServiceResult<Value>) -> Result<String, CliError> {
    let mut lines = Vec::new();
    if !result.messages().is_empty() {
        lines.push(String::from("messages:"));
        for message in result.messages() {
            lines.push(format!("  [{}] {}", message.message_type, message.text));
        }
    }

    if let Some(data) = result.data() {
        lines.push(String::from("data:"));
        let pretty_data = serde_json::to_string_pretty(data)?;
        lines.extend(pretty_data.lines().map(|line| format!("  {line}")));
    }

    Ok(lines.join("\n"))
}
