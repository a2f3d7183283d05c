use std::fmt::{Display, Formatter};

use crate::domain::{StockExchange, StockQuote};

/// Classification of quote retrieval failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalErrorKind {
    NotFound,
    Unavailable,
    InvalidPayload,
    Internal,
}

/// Opaque failure reported by a quote provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalError {
    kind: RetrievalErrorKind,
    message: String,
    retryable: bool,
}

impl RetrievalError {
    pub fn not_found(symbol: &str, exchange: StockExchange) -> Self {
        Self {
            kind: RetrievalErrorKind::NotFound,
            message: format!("no quote for '{symbol}' on {exchange}"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: RetrievalErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self {
            kind: RetrievalErrorKind::InvalidPayload,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: RetrievalErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> RetrievalErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            RetrievalErrorKind::NotFound => "quote.not_found",
            RetrievalErrorKind::Unavailable => "quote.unavailable",
            RetrievalErrorKind::InvalidPayload => "quote.invalid_payload",
            RetrievalErrorKind::Internal => "quote.internal",
        }
    }
}

impl Display for RetrievalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for RetrievalError {}

/// Source of current quotes.
pub trait QuoteProvider {
    fn name(&self) -> &'static str;

    fn quote(&self, symbol: &str, exchange: StockExchange) -> Result<StockQuote, RetrievalError>;
}
