use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::change::{FieldDiff, Tracked};
use crate::domain::price_alert::MIN_ID;
use crate::domain::StockExchange;
use crate::error::{Entity, ValidationError};
use crate::persistence::Record;
use crate::validation::{require, require_optional_min, require_positive, require_text, Validate};

/// Price level drawn on an instrument chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub symbol: String,
    pub stock_exchange: Option<StockExchange>,
    pub price: Decimal,
}

impl HorizontalLine {
    pub fn new(symbol: impl Into<String>, stock_exchange: StockExchange, price: Decimal) -> Self {
        Self {
            id: None,
            symbol: symbol.into(),
            stock_exchange: Some(stock_exchange),
            price,
        }
    }
}

impl Validate for HorizontalLine {
    fn validate(&self) -> Result<(), ValidationError> {
        require_optional_min(Entity::HorizontalLine, "id", self.id, MIN_ID)?;
        require_text(Entity::HorizontalLine, "symbol", &self.symbol)?;
        require(Entity::HorizontalLine, "stockExchange", self.stock_exchange.as_ref())?;
        require_positive(Entity::HorizontalLine, "price", self.price)
    }
}

impl Tracked for HorizontalLine {
    type Key = i64;

    const ENTITY: Entity = Entity::HorizontalLine;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn changed_fields(&self, stored: &Self) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &stored.id)
            .field("symbol", self.symbol.as_str(), stored.symbol.as_str())
            .field("stockExchange", &self.stock_exchange, &stored.stock_exchange)
            .field("price", &self.price, &stored.price)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HorizontalLineFilter {
    pub symbol: Option<String>,
    pub stock_exchange: Option<StockExchange>,
}

impl Record for HorizontalLine {
    type Filter = HorizontalLineFilter;

    const GENERATED_KEY: bool = true;

    fn matches(&self, filter: &HorizontalLineFilter) -> bool {
        filter
            .symbol
            .as_deref()
            .is_none_or(|symbol| symbol.eq_ignore_ascii_case(&self.symbol))
            && filter
                .stock_exchange
                .is_none_or(|exchange| self.stock_exchange == Some(exchange))
    }

    fn with_generated_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Constraint;

    #[test]
    fn validates_in_declaration_order() {
        let line = HorizontalLine {
            id: Some(0),
            symbol: String::new(),
            stock_exchange: None,
            price: Decimal::ZERO,
        };
        assert_eq!(line.validate().expect_err("id").field(), "id");

        let line = HorizontalLine { id: None, ..line };
        assert_eq!(line.validate().expect_err("symbol").field(), "symbol");

        let line = HorizontalLine {
            symbol: String::from("SHOP"),
            ..line
        };
        assert_eq!(
            line.validate().expect_err("exchange").field(),
            "stockExchange"
        );

        let line = HorizontalLine {
            stock_exchange: Some(StockExchange::Tsx),
            ..line
        };
        let err = line.validate().expect_err("price");
        assert_eq!(err.field(), "price");
        assert_eq!(err.constraint(), Constraint::Positive);
    }

    #[test]
    fn single_field_change_is_detected() {
        let stored = HorizontalLine::new("SHOP", StockExchange::Tsx, Decimal::new(9_800, 2))
            .with_generated_id(3);
        assert!(stored.changed_fields(&stored).is_empty());

        let moved = HorizontalLine {
            symbol: String::from("SHOP.U"),
            ..stored.clone()
        };
        assert_eq!(moved.changed_fields(&stored), vec!["symbol"]);
    }
}
