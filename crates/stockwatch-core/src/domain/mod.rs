mod horizontal_line;
mod market;
mod price_alert;
mod quote;
mod statistic;

pub use horizontal_line::{HorizontalLine, HorizontalLineFilter};
pub use market::{AlertType, Currency, InstrumentType, StockExchange};
pub use price_alert::{PriceAlert, PriceAlertFilter, MIN_ID};
pub use quote::StockQuote;
pub use statistic::{
    Breadth, Statistic, StatisticFilter, StatisticInput, StatisticKey, StatisticScope,
    SECTOR_AND_IG_DEFINED,
};
