// Core structs: TickerSymbol, TickerInfo, PriceHistory and the error enums
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const FIELD_LONG_NAME: &str = "longName";
pub const FIELD_INDUSTRY: &str = "industry";
pub const FIELD_SECTOR: &str = "sector";
pub const FIELD_COUNTRY: &str = "country";
pub const FIELD_MARKET_CAP: &str = "marketCap";
pub const FIELD_TRAILING_PE: &str = "trailingPE";
pub const FIELD_FORWARD_PE: &str = "forwardPE";
pub const FIELD_PEG_RATIO: &str = "pegRatio";
pub const FIELD_PRICE_TO_SALES: &str = "priceToSalesTrailing12Months";
pub const FIELD_PRICE_TO_BOOK: &str = "priceToBook";
pub const FIELD_52W_HIGH: &str = "fiftyTwoWeekHigh";
pub const FIELD_52W_LOW: &str = "fiftyTwoWeekLow";
pub const FIELD_DIVIDEND_YIELD: &str = "dividendYield";

/// A ticker symbol exactly as it will be sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Takes the field text verbatim (form front-end).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Case-folds user input the way the terminal prompt does.
    pub fn from_input(raw: &str) -> Self {
        Self(raw.trim_end_matches(['\r', '\n']).to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fundamentals snapshot keyed by provider field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerInfo {
    fields: BTreeMap<String, Value>,
}

impl TickerInfo {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Result<&Value, AnalysisError> {
        match self.fields.get(field) {
            Some(Value::Null) | None => Err(AnalysisError::MissingField(field.to_string())),
            Some(value) => Ok(value),
        }
    }

    /// Numeric field, for values that get fixed-precision formatting.
    pub fn number(&self, field: &str) -> Result<f64, AnalysisError> {
        self.get(field)?.as_f64().ok_or_else(|| AnalysisError::FieldType {
            field: field.to_string(),
            expected: "number",
        })
    }

    /// Any scalar field rendered the way it would print unformatted.
    pub fn display(&self, field: &str) -> Result<String, AnalysisError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(if *b { "True".into() } else { "False".into() }),
            _ => Err(AnalysisError::FieldType {
                field: field.to_string(),
                expected: "scalar",
            }),
        }
    }
}

impl FromIterator<(String, Value)> for TickerInfo {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// One daily record of the historical series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// Date-ordered price series covering the full available history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self { bars }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("provider error {code}: {description}")]
    Api { code: String, description: String },

    #[error("malformed provider response: {0}")]
    Decode(String),

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' is not a {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    #[error("need at least {needed} data points, got {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> TickerInfo {
        [
            (FIELD_LONG_NAME.to_string(), json!("Apple Inc.")),
            (FIELD_MARKET_CAP.to_string(), json!(2950000000000u64)),
            (FIELD_TRAILING_PE.to_string(), json!(28.5)),
            (FIELD_PEG_RATIO.to_string(), Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn terminal_input_is_uppercased() {
        assert_eq!(TickerSymbol::from_input("aapl\n").as_str(), "AAPL");
        assert_eq!(TickerSymbol::from_input("quit").as_str(), "QUIT");
    }

    #[test]
    fn form_input_is_kept_verbatim() {
        assert_eq!(TickerSymbol::new("msft").as_str(), "msft");
    }

    #[test]
    fn display_keeps_integers_integral() {
        let info = info();
        assert_eq!(info.display(FIELD_MARKET_CAP).unwrap(), "2950000000000");
        assert_eq!(info.display(FIELD_LONG_NAME).unwrap(), "Apple Inc.");
    }

    #[test]
    fn null_and_absent_fields_are_missing() {
        let info = info();
        assert!(matches!(
            info.number(FIELD_PEG_RATIO),
            Err(AnalysisError::MissingField(f)) if f == FIELD_PEG_RATIO
        ));
        assert!(matches!(
            info.number(FIELD_DIVIDEND_YIELD),
            Err(AnalysisError::MissingField(_))
        ));
    }

    #[test]
    fn text_field_is_not_a_number() {
        assert!(matches!(
            info().number(FIELD_LONG_NAME),
            Err(AnalysisError::FieldType { expected: "number", .. })
        ));
    }

    #[test]
    fn history_is_sorted_by_date() {
        let bar = |d: u32, c: f64| PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            open: c,
            close: c,
        };
        let history = PriceHistory::new(vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]);
        assert_eq!(history.closes(), vec![1.0, 2.0, 3.0]);
    }
}
