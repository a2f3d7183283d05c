use stockwatch_core::{
    normalize_quote, QuoteProvider, RetrievalError, WebServiceMessage, WebServiceResult,
    YahooQuotePayload, YahooQuoteProvider,
};
use tracing::debug;

use super::{read_input, CommandResult};
use crate::cli::{FetchArgs, NormalizeArgs, QuoteCommand};
use crate::error::{CliError, EXIT_RETRIEVAL};

pub fn run(command: &QuoteCommand) -> Result<CommandResult, CliError> {
    match command {
        QuoteCommand::Normalize(args) => normalize(args),
        QuoteCommand::Fetch(args) => fetch(args),
    }
}

fn normalize(args: &NormalizeArgs) -> Result<CommandResult, CliError> {
    let payload = YahooQuotePayload {
        exchange: args.exchange.clone(),
        symbol: args.ticker.clone(),
        regular_market_price: args.price,
        currency: args.currency.clone(),
    };
    let quote = match normalize_quote(&payload) {
        Ok(quote) => quote,
        Err(err) => return Ok(retrieval_failed(&err)),
    };

    let mut warnings = Vec::new();
    if quote.stock_exchange.is_none() {
        warnings.push(WebServiceMessage::warning(format!(
            "exchange code '{}' is not supported",
            args.exchange
        )));
    }
    if quote.currency.is_none() {
        warnings.push(WebServiceMessage::warning(format!(
            "currency code '{}' is not supported",
            args.currency
        )));
    }
    Ok(CommandResult::ok(&quote)?.with_messages(warnings))
}

fn fetch(args: &FetchArgs) -> Result<CommandResult, CliError> {
    let provider = YahooQuoteProvider::from_json(&read_input(&args.feed.feed)?)?;
    debug!(provider = provider.name(), quotes = provider.len(), "quote feed loaded");

    match provider.quote(&args.symbol, args.exchange) {
        Ok(quote) => CommandResult::ok(&quote),
        Err(err) => Ok(retrieval_failed(&err)),
    }
}

fn retrieval_failed(error: &RetrievalError) -> CommandResult {
    let mut result = WebServiceResult::empty();
    result.add_message(WebServiceMessage::error(error.to_string()));
    CommandResult {
        result,
        exit_code: EXIT_RETRIEVAL,
    }
}
