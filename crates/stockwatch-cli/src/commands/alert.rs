use serde::Serialize;
use stockwatch_core::{
    Action, EntityService, PriceAlert, PriceAlertFilter, QuoteProvider, RetrievalErrorKind,
    StockQuote, WebServiceMessage, YahooQuoteProvider,
};
use stockwatch_warehouse::Warehouse;
use tracing::{debug, info};

use super::{read_input, CommandResult};
use crate::cli::{AlertArgs, AlertCommand, AlertUpdateArgs, FeedArgs, IdArgs, ListingArgs};
use crate::error::CliError;

type AlertService = EntityService<PriceAlert, Warehouse>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggeredAlert {
    alert: PriceAlert,
    quote: StockQuote,
}

pub fn run(command: &AlertCommand, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let service = AlertService::new(warehouse.clone());
    match command {
        AlertCommand::Insert(args) => {
            let outcome = service.create(&alert_of(None, args));
            CommandResult::from_outcome(outcome, |stored| Action::Created.describe(stored))
        }
        AlertCommand::Update(AlertUpdateArgs { id, alert }) => {
            let alert = alert_of(Some(*id), alert);
            let outcome = service.modify(&alert).map(|()| alert);
            CommandResult::from_outcome(outcome, |stored| Action::Updated.describe(stored))
        }
        AlertCommand::Delete(IdArgs { id }) => {
            let outcome = service
                .find(id)
                .and_then(|stored| service.remove(&stored).map(|()| stored));
            CommandResult::from_outcome(outcome, |removed| Action::Deleted.describe(removed))
        }
        AlertCommand::Get(IdArgs { id }) => CommandResult::from_lookup(service.find(id)),
        AlertCommand::List(args) => CommandResult::from_lookup(service.list(&filter_of(args))),
        AlertCommand::Check(args) => check(&service, args),
    }
}

fn alert_of(id: Option<i64>, args: &AlertArgs) -> PriceAlert {
    PriceAlert {
        id,
        symbol: args.symbol.clone(),
        stock_exchange: args.exchange,
        alert_type: args.alert_type,
        price: args.price,
    }
}

fn filter_of(args: &ListingArgs) -> PriceAlertFilter {
    PriceAlertFilter {
        symbol: args.symbol.clone(),
        stock_exchange: args.exchange,
    }
}

/// Evaluates every stored alert against the feed. Listings missing from the feed
/// are reported as warnings and do not fail the check.
fn check(service: &AlertService, args: &FeedArgs) -> Result<CommandResult, CliError> {
    let provider = YahooQuoteProvider::from_json(&read_input(&args.feed)?)?;
    let alerts = match service.list(&PriceAlertFilter::default()) {
        Ok(alerts) => alerts,
        Err(err) => return Ok(CommandResult::failed(&err)),
    };
    debug!(alerts = alerts.len(), quotes = provider.len(), "checking price alerts");

    let mut triggered = Vec::new();
    let mut warnings = Vec::new();
    for alert in &alerts {
        let Some(exchange) = alert.stock_exchange else {
            continue;
        };
        match provider.quote(&alert.symbol, exchange) {
            Ok(quote) if alert.is_triggered_by(&quote) => {
                info!(
                    id = ?alert.id,
                    symbol = %alert.symbol,
                    price = %quote.price,
                    "price alert triggered"
                );
                triggered.push(TriggeredAlert {
                    alert: alert.clone(),
                    quote,
                });
            }
            Ok(_) => {}
            Err(err) if err.kind() == RetrievalErrorKind::NotFound => {
                warnings.push(WebServiceMessage::warning(err.message()));
            }
            Err(err) => return Err(err.into()),
        }
    }

    let summary = format!(
        "{} of {} price alerts triggered.",
        triggered.len(),
        alerts.len()
    );
    Ok(CommandResult::ok(&triggered)?
        .with_messages(warnings)
        .with_message(WebServiceMessage::info(summary)))
}
