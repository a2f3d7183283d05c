use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Currency, StockExchange, StockQuote};
use crate::quote_source::{QuoteProvider, RetrievalError};

/// Quote fields as delivered by the Yahoo quote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuotePayload {
    pub exchange: String,
    pub symbol: String,
    pub regular_market_price: f64,
    pub currency: String,
}

pub fn exchange_from_code(code: &str) -> Option<StockExchange> {
    match code.trim().to_ascii_uppercase().as_str() {
        "VAN" => Some(StockExchange::Tsxv),
        "TOR" => Some(StockExchange::Tsx),
        "NYQ" | "NMS" => Some(StockExchange::Nyse),
        _ => None,
    }
}

pub fn currency_from_code(code: &str) -> Option<Currency> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some(Currency::Usd),
        "CAD" => Some(Currency::Cad),
        _ => None,
    }
}

/// Ticker without the exchange suffix, e.g. `ABC` for `ABC.V`.
pub fn bare_symbol(ticker: &str) -> &str {
    let ticker = ticker.trim();
    ticker.split_once('.').map_or(ticker, |(symbol, _)| symbol)
}

/// Ticker under which Yahoo lists a symbol on an exchange.
pub fn yahoo_ticker(symbol: &str, exchange: StockExchange) -> String {
    let symbol = symbol.trim().to_ascii_uppercase();
    match exchange {
        StockExchange::Nyse => symbol,
        StockExchange::Tsx => format!("{symbol}.TO"),
        StockExchange::Tsxv => format!("{symbol}.V"),
    }
}

/// Converts the provider price through its shortest decimal representation, so
/// `12.345` stays `12.345` instead of picking up binary rounding noise.
pub fn price_to_decimal(price: f64) -> Result<Decimal, RetrievalError> {
    if !price.is_finite() {
        return Err(RetrievalError::invalid_payload(format!(
            "price '{price}' is not a finite number"
        )));
    }
    Decimal::from_str(&price.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{price:e}")))
        .map_err(|err| RetrievalError::invalid_payload(format!("price '{price}': {err}")))
}

/// Maps a raw payload onto [`StockQuote`]. Unknown exchange and currency codes map to `None`.
pub fn normalize_quote(payload: &YahooQuotePayload) -> Result<StockQuote, RetrievalError> {
    let symbol = bare_symbol(&payload.symbol);
    if symbol.is_empty() {
        return Err(RetrievalError::invalid_payload(format!(
            "ticker '{}' has no symbol",
            payload.symbol
        )));
    }

    Ok(StockQuote {
        symbol: symbol.to_owned(),
        stock_exchange: exchange_from_code(&payload.exchange),
        price: price_to_decimal(payload.regular_market_price)?,
        currency: currency_from_code(&payload.currency),
    })
}

/// Serves quotes from payloads fetched ahead of time, keyed by Yahoo ticker.
#[derive(Debug, Clone, Default)]
pub struct YahooQuoteProvider {
    payloads: HashMap<String, YahooQuotePayload>,
}

impl YahooQuoteProvider {
    pub fn new(payloads: impl IntoIterator<Item = YahooQuotePayload>) -> Self {
        let payloads = payloads
            .into_iter()
            .map(|payload| (payload.symbol.trim().to_ascii_uppercase(), payload))
            .collect();
        Self { payloads }
    }

    pub fn from_json(json: &str) -> Result<Self, RetrievalError> {
        let payloads: Vec<YahooQuotePayload> = serde_json::from_str(json)
            .map_err(|err| RetrievalError::invalid_payload(format!("quote feed: {err}")))?;
        Ok(Self::new(payloads))
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn quote(&self, symbol: &str, exchange: StockExchange) -> Result<StockQuote, RetrievalError> {
        let ticker = yahoo_ticker(symbol, exchange);
        let payload = self
            .payloads
            .get(&ticker)
            .ok_or_else(|| RetrievalError::not_found(symbol, exchange))?;
        normalize_quote(payload)
    }
}
