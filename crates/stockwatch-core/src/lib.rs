//! Core contracts for stockwatch.
//!
//! This crate contains:
//! - Market-breadth statistics, price alerts and chart lines
//! - Validation with localizable messages
//! - The change-detection contract and the persistence interface
//! - The web-service result envelope
//! - Quote provider interface and the Yahoo quote normalizer

pub mod adapters;
pub mod change;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod persistence;
pub mod quote_source;
pub mod service;
pub mod validation;

pub use adapters::{normalize_quote, YahooQuotePayload, YahooQuoteProvider};
pub use change::{ensure_changed, is_unchanged, FieldDiff, Tracked};
pub use domain::{
    AlertType, Breadth, Currency, HorizontalLine, HorizontalLineFilter, InstrumentType,
    PriceAlert, PriceAlertFilter, Statistic, StatisticFilter, StatisticInput, StatisticKey,
    StatisticScope, StockExchange, StockQuote,
};
pub use envelope::{MessageType, WebServiceMessage, WebServiceResult};
pub use error::{Constraint, Entity, ParseCodeError, ValidationError};
pub use messages::{Locale, MessageCatalog, MessageKey};
pub use persistence::{Dao, InMemoryDao, PersistenceError, Record};
pub use quote_source::{QuoteProvider, RetrievalError, RetrievalErrorKind};
pub use service::{into_result, Action, EntityService, ServiceError};
pub use validation::Validate;
