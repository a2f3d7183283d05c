use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::change::{FieldDiff, Tracked};
use crate::domain::{AlertType, StockExchange, StockQuote};
use crate::error::{Entity, ValidationError};
use crate::persistence::Record;
use crate::validation::{require, require_optional_min, require_positive, require_text, Validate};

/// Smallest identity storage hands out.
pub const MIN_ID: i64 = 1;

/// Threshold on the price of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub symbol: String,
    pub stock_exchange: Option<StockExchange>,
    pub alert_type: Option<AlertType>,
    pub price: Decimal,
}

impl PriceAlert {
    pub fn new(
        symbol: impl Into<String>,
        stock_exchange: StockExchange,
        alert_type: AlertType,
        price: Decimal,
    ) -> Self {
        Self {
            id: None,
            symbol: symbol.into(),
            stock_exchange: Some(stock_exchange),
            alert_type: Some(alert_type),
            price,
        }
    }

    /// Whether the quote is for this instrument and reaches the threshold.
    pub fn is_triggered_by(&self, quote: &StockQuote) -> bool {
        if !quote.symbol.eq_ignore_ascii_case(self.symbol.trim()) {
            return false;
        }
        if self.stock_exchange.is_none() || quote.stock_exchange != self.stock_exchange {
            return false;
        }
        match self.alert_type {
            Some(AlertType::GreaterOrEqual) => quote.price >= self.price,
            Some(AlertType::LessOrEqual) => quote.price <= self.price,
            None => false,
        }
    }
}

impl Validate for PriceAlert {
    /// Checks `id`, `symbol`, `stockExchange`, `alertType` and `price`, in that order.
    fn validate(&self) -> Result<(), ValidationError> {
        require_optional_min(Entity::PriceAlert, "id", self.id, MIN_ID)?;
        require_text(Entity::PriceAlert, "symbol", &self.symbol)?;
        require(Entity::PriceAlert, "stockExchange", self.stock_exchange.as_ref())?;
        require(Entity::PriceAlert, "alertType", self.alert_type.as_ref())?;
        require_positive(Entity::PriceAlert, "price", self.price)
    }
}

impl Tracked for PriceAlert {
    type Key = i64;

    const ENTITY: Entity = Entity::PriceAlert;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn changed_fields(&self, stored: &Self) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &stored.id)
            .field("symbol", self.symbol.as_str(), stored.symbol.as_str())
            .field("stockExchange", &self.stock_exchange, &stored.stock_exchange)
            .field("alertType", &self.alert_type, &stored.alert_type)
            .field("price", &self.price, &stored.price)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceAlertFilter {
    pub symbol: Option<String>,
    pub stock_exchange: Option<StockExchange>,
}

impl Record for PriceAlert {
    type Filter = PriceAlertFilter;

    const GENERATED_KEY: bool = true;

    fn matches(&self, filter: &PriceAlertFilter) -> bool {
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
    use std::str::FromStr;

    use super::*;
    use crate::domain::Currency;
    use crate::error::Constraint;
    use crate::messages::{ENGLISH, GERMAN};

    fn alert() -> PriceAlert {
        PriceAlert::new(
            "RY",
            StockExchange::Tsx,
            AlertType::GreaterOrEqual,
            Decimal::new(12_050, 2),
        )
    }

    fn quote(price: &str) -> StockQuote {
        StockQuote {
            symbol: String::from("RY"),
            stock_exchange: Some(StockExchange::Tsx),
            price: Decimal::from_str(price).expect("decimal"),
            currency: Some(Currency::Cad),
        }
    }

    #[test]
    fn accepts_complete_alert() {
        assert!(alert().validate().is_ok());
        let stored = PriceAlert {
            id: Some(1),
            ..alert()
        };
        assert!(stored.validate().is_ok());
    }

    #[test]
    fn id_below_one_reports_minimum() {
        for id in [0, -3] {
            let err = PriceAlert {
                id: Some(id),
                ..alert()
            }
            .validate()
            .expect_err("must fail");
            assert_eq!(err.field(), "id");
            assert_eq!(err.constraint(), Constraint::Min(1));
            assert_eq!(
                err.message_in(&ENGLISH),
                "The field 'id' of priceAlert must be at least 1."
            );
        }
    }

    #[test]
    fn checks_fields_in_fixed_order() {
        let mut alert = PriceAlert {
            id: Some(0),
            symbol: String::new(),
            stock_exchange: None,
            alert_type: None,
            price: Decimal::ZERO,
        };
        let mut order = Vec::new();
        while let Err(err) = alert.validate() {
            order.push(err.field());
            match err.field() {
                "id" => alert.id = Some(5),
                "symbol" => alert.symbol = String::from("RY"),
                "stockExchange" => alert.stock_exchange = Some(StockExchange::Tsx),
                "alertType" => alert.alert_type = Some(AlertType::LessOrEqual),
                "price" => alert.price = Decimal::ONE,
                other => panic!("unexpected field {other}"),
            }
        }
        assert_eq!(
            order,
            vec!["id", "symbol", "stockExchange", "alertType", "price"]
        );
    }

    #[test]
    fn symbol_message_is_localized() {
        let err = PriceAlert {
            symbol: String::from("  "),
            ..alert()
        }
        .validate()
        .expect_err("must fail");
        assert_eq!(
            err.message_in(&ENGLISH),
            "Please enter the symbol of the instrument to watch."
        );
        assert_eq!(
            err.message_in(&GERMAN),
            "Bitte geben Sie das Symbol des zu beobachtenden Instruments an."
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = PriceAlert {
            price: Decimal::new(-1, 0),
            ..alert()
        }
        .validate()
        .expect_err("must fail");
        assert_eq!(err.constraint(), Constraint::Positive);
    }

    #[test]
    fn triggers_on_threshold_in_alert_direction() {
        let rising = alert();
        assert!(rising.is_triggered_by(&quote("120.50")));
        assert!(rising.is_triggered_by(&quote("121")));
        assert!(!rising.is_triggered_by(&quote("120.49")));

        let falling = PriceAlert {
            alert_type: Some(AlertType::LessOrEqual),
            ..alert()
        };
        assert!(falling.is_triggered_by(&quote("120.5")));
        assert!(!falling.is_triggered_by(&quote("120.51")));
    }

    #[test]
    fn ignores_quotes_for_other_listings() {
        let mut other = quote("130");
        other.stock_exchange = Some(StockExchange::Nyse);
        assert!(!alert().is_triggered_by(&other));

        let mut unknown = quote("130");
        unknown.stock_exchange = None;
        assert!(!alert().is_triggered_by(&unknown));

        let mut symbol = quote("130");
        symbol.symbol = String::from("TD");
        assert!(!alert().is_triggered_by(&symbol));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_change() {
        let stored = alert();
        let incoming = PriceAlert {
            price: Decimal::from_str("120.500").expect("decimal"),
            ..alert()
        };
        assert!(incoming.changed_fields(&stored).is_empty());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(alert()).expect("serialize");
        assert_eq!(json["stockExchange"], "TSX");
        assert_eq!(json["alertType"], "GREATER_OR_EQUAL");
        assert_eq!(json["price"], "120.50");
        assert!(json.get("id").is_none());
    }
}
