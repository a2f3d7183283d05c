use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Currency, StockExchange};

/// Canonical quote shape produced at the provider boundary.
///
/// Exchange and currency are `None` when the provider sent a code outside the
/// supported set, so callers can skip such quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub stock_exchange: Option<StockExchange>,
    pub price: Decimal,
    pub currency: Option<Currency>,
}

impl StockQuote {
    pub fn is_fully_mapped(&self) -> bool {
        self.stock_exchange.is_some() && self.currency.is_some()
    }
}
