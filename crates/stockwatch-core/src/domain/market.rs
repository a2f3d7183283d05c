use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseCodeError;

/// Category of instruments a statistic is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    Stock,
    Etf,
}

impl InstrumentType {
    pub const ALL: [Self; 2] = [Self::Stock, Self::Etf];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "STOCK",
            Self::Etf => "ETF",
        }
    }
}

/// Exchanges an instrument can be listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockExchange {
    Nyse,
    Tsx,
    Tsxv,
}

impl StockExchange {
    pub const ALL: [Self; 3] = [Self::Nyse, Self::Tsx, Self::Tsxv];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nyse => "NYSE",
            Self::Tsx => "TSX",
            Self::Tsxv => "TSXV",
        }
    }
}

/// Direction in which a price alert fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    GreaterOrEqual,
    LessOrEqual,
}

impl AlertType {
    pub const ALL: [Self; 2] = [Self::GreaterOrEqual, Self::LessOrEqual];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::LessOrEqual => "LESS_OR_EQUAL",
        }
    }
}

/// Trading currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Currency {
    Usd,
    Cad,
}

impl Currency {
    pub const ALL: [Self; 2] = [Self::Usd, Self::Cad];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Cad => "CAD",
        }
    }
}

macro_rules! closed_set_codes {
    ($($ty:ident => $kind:literal, $expected:literal;)+) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = ParseCodeError;

                fn from_str(value: &str) -> Result<Self, Self::Err> {
                    let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
                    Self::ALL
                        .into_iter()
                        .find(|candidate| candidate.as_str() == normalized)
                        .ok_or_else(|| ParseCodeError {
                            kind: $kind,
                            value: value.to_owned(),
                            expected: $expected,
                        })
                }
            }
        )+
    };
}

closed_set_codes! {
    InstrumentType => "instrument type", "STOCK, ETF";
    StockExchange => "stock exchange", "NYSE, TSX, TSXV";
    AlertType => "alert type", "GREATER_OR_EQUAL, LESS_OR_EQUAL";
    Currency => "currency", "USD, CAD";
}
