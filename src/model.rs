//! Report rows and queries as exchanged with the reporting API

use crate::error::{ConnectorError, Result};
use crate::sites::AddressType;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Largest page size the reporting API accepts
pub const MAX_ROW_LIMIT: u32 = 25_000;

/// Field name under which the enricher stores the rendered site address
pub const SITE_FIELD: &str = "site";
/// Field name under which the enricher stores the address-type label
pub const TYPE_FIELD: &str = "type";

/// Query parameters shared read-only by every split of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
}

impl FetchQuery {
    /// Query with the API's maximum page size
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, dimensions: Vec<String>) -> Self {
        Self {
            start_date,
            end_date,
            dimensions,
            row_limit: MAX_ROW_LIMIT,
        }
    }

    /// Override the page size, enforcing `1..=MAX_ROW_LIMIT`
    pub fn with_row_limit(mut self, row_limit: u32) -> Result<Self> {
        if row_limit == 0 || row_limit > MAX_ROW_LIMIT {
            return Err(ConnectorError::InvalidQuery(format!(
                "row limit {} outside 1..={}",
                row_limit, MAX_ROW_LIMIT
            )));
        }
        self.row_limit = row_limit;
        Ok(self)
    }

    /// Request body for the page starting at `start_row`
    pub fn page(&self, start_row: u64) -> SearchAnalyticsRequest {
        SearchAnalyticsRequest {
            start_date: self.start_date,
            end_date: self.end_date,
            dimensions: self.dimensions.clone(),
            row_limit: self.row_limit,
            start_row,
        }
    }
}

/// Body of one `searchAnalytics/query` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
    pub start_row: u64,
}

/// Report metrics every row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Clicks,
    Impressions,
    Ctr,
    Position,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "clicks" => Some(Self::Clicks),
            "impressions" => Some(Self::Impressions),
            "ctr" => Some(Self::Ctr),
            "position" => Some(Self::Position),
            _ => None,
        }
    }
}

/// One row as returned by the reporting API.
///
/// Metrics are fixed; `keys` holds dimension values aligned with
/// [`FetchQuery::dimensions`]; anything else the API sends lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDataRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ApiDataRow {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Clicks => self.clicks,
            Metric::Impressions => self.impressions,
            Metric::Ctr => self.ctr,
            Metric::Position => self.position,
        }
    }

    /// Dimension value at `index`, if the row has one
    pub fn dimension(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }
}

/// A row annotated with the site it came from
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub row: ApiDataRow,
}

impl EnrichedRow {
    /// Value of an injected or unknown field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.row.extra.get(name)
    }

    pub fn site(&self) -> Option<&str> {
        self.field(SITE_FIELD).and_then(Value::as_str)
    }

    pub fn site_type(&self) -> Option<AddressType> {
        self.field(TYPE_FIELD)
            .and_then(Value::as_str)
            .and_then(|label| label.parse().ok())
    }
}

/// A loosely typed value on its way into a typed record
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Text(String),
    /// A JSON integer, kept exact
    Integer(i128),
    Number(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl DynamicValue {
    /// Map a JSON value; `null` has no dynamic counterpart
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Number)),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            other => Some(Self::Text(other.to_string())),
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Bytes(b) => write!(f, "{:?}", b),
        }
    }
}
