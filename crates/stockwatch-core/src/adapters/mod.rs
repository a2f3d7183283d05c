mod yahoo;

pub use yahoo::{
    bare_symbol, currency_from_code, exchange_from_code, normalize_quote, price_to_decimal,
    yahoo_ticker, YahooQuotePayload, YahooQuoteProvider,
};
