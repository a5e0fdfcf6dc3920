use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

pub const DEFAULT_PERIOD_DAYS: NonZeroU32 = match NonZeroU32::new(30) {
    Some(days) => days,
    None => unreachable!(),
};

/// Sentinel produced when no query template matches the intent.
pub const FALLBACK_QUERY: &str = "-- SHOPIFYQL: fallback/unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Sales,
    Inventory,
    Customers,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentDetail {
    ProductPerformance,
    TopProducts,
    InventoryProjection,
    RepeatCustomers,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub product: Option<String>,
    pub period_days: NonZeroU32,
}

impl Default for EntitySet {
    fn default() -> Self {
        Self {
            product: None,
            period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

/// Structured reading of a question. Built once by the classifier and only
/// read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: IntentKind,
    pub detail: IntentDetail,
    pub entities: EntitySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumption: Option<String>,
}

impl Intent {
    pub fn unknown(entities: EntitySet) -> Self {
        Self {
            intent: IntentKind::Unknown,
            detail: IntentDetail::Unknown,
            entities,
            assumption: None,
        }
    }

    /// The request kind shared by generator, fetcher and explainer, if this
    /// intent maps onto one.
    pub fn request_kind(&self) -> Option<RequestKind> {
        match (self.intent, self.detail) {
            (IntentKind::Sales, IntentDetail::ProductPerformance)
                if self.entities.product.is_some() =>
            {
                Some(RequestKind::ProductPerformance)
            }
            (IntentKind::Sales, IntentDetail::TopProducts) => Some(RequestKind::TopProducts),
            (IntentKind::Inventory, IntentDetail::InventoryProjection) => {
                Some(RequestKind::InventoryProjection)
            }
            (IntentKind::Customers, IntentDetail::RepeatCustomers) => {
                Some(RequestKind::RepeatCustomers)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    ProductPerformance,
    TopProducts,
    InventoryProjection,
    RepeatCustomers,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::ProductPerformance => "product_performance",
            RequestKind::TopProducts => "top_products",
            RequestKind::InventoryProjection => "inventory_projection",
            RequestKind::RepeatCustomers => "repeat_customers",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value bound to a `:name` placeholder in a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryParam {
    /// A window reaching back N days, rendered as `-Nd`.
    RelativeDays(NonZeroU32),
    /// A LIKE pattern, rendered single-quoted.
    Pattern(String),
}

impl QueryParam {
    pub fn render(&self) -> String {
        match self {
            QueryParam::RelativeDays(days) => format!("-{}d", days),
            QueryParam::Pattern(pattern) => format!("'{}'", pattern.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    kind: Option<RequestKind>,
    text: String,
    params: BTreeMap<String, QueryParam>,
}

impl Query {
    pub fn new(kind: RequestKind, text: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    /// A hand-written query with no request kind and no bound parameters.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            kind: None,
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn fallback() -> Self {
        Self::raw(FALLBACK_QUERY)
    }

    pub fn bind(mut self, name: &str, value: QueryParam) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn kind(&self) -> Option<RequestKind> {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, QueryParam> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&QueryParam> {
        self.params.get(name)
    }

    pub fn is_fallback(&self) -> bool {
        self.kind.is_none() && self.text == FALLBACK_QUERY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_title: String,
    pub total_sold: u64,
    pub period_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_title: String,
    pub total_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSales {
    pub product_id: u64,
    pub product_title: String,
    pub total_sold_period: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sales30d {
    pub product_id: u64,
    pub product_title: String,
    pub total_sold_30d: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatCustomer {
    pub customer_id: u64,
    pub orders_count: u32,
}

/// Why a query was refused before it reached the data source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("query must start with SELECT")]
    MissingSelect,

    #[error("query must contain a FROM clause")]
    MissingFrom,

    #[error("forbidden keyword detected: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("unbalanced parentheses ({open} open, {close} close)")]
    UnbalancedParentheses { open: usize, close: usize },

    #[error("placeholder :{name} has no bound value")]
    UnboundParameter { name: String },
}

/// Aggregated result of a fetch. One variant per result shape; the serialized
/// tag is the semantic result key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawData {
    ProductPerformance(ProductPerformance),
    TopProducts {
        items: Vec<ProductSales>,
        period_days: u32,
    },
    SalesPeriod {
        items: Vec<PeriodSales>,
        period_days: u32,
    },
    #[serde(rename = "sales_30d")]
    Sales30d {
        items: Vec<Sales30d>,
        period_days: u32,
    },
    RepeatCustomers {
        items: Vec<RepeatCustomer>,
        period_days: u32,
    },
    Empty,
}

impl RawData {
    pub fn key(&self) -> &'static str {
        match self {
            RawData::ProductPerformance(_) => "product_performance",
            RawData::TopProducts { .. } => "top_products",
            RawData::SalesPeriod { .. } => "sales_period",
            RawData::Sales30d { .. } => "sales_30d",
            RawData::RepeatCustomers { .. } => "repeat_customers",
            RawData::Empty => "empty",
        }
    }

    pub fn period_days(&self) -> Option<u32> {
        match self {
            RawData::ProductPerformance(record) => Some(record.period_days),
            RawData::TopProducts { period_days, .. }
            | RawData::SalesPeriod { period_days, .. }
            | RawData::Sales30d { period_days, .. }
            | RawData::RepeatCustomers { period_days, .. } => Some(*period_days),
            RawData::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawData::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

pub type DebugInfo = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub answer: String,
    pub confidence: Confidence,
    pub debug: DebugInfo,
}

/// Reorder parameters used for inventory projections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplainerSettings {
    pub lead_time_days: u32,
    pub safety_stock_ratio: f64,
}

impl Default for ExplainerSettings {
    fn default() -> Self {
        Self {
            lead_time_days: 7,
            safety_stock_ratio: 0.2,
        }
    }
}

/// Missing fields deserialize as blank so they fail request validation
/// instead of the JSON extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub question: String,
}

impl AskRequest {
    pub fn new(store_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            question: question.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub confidence: Confidence,
    pub debug: DebugInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(intent: IntentKind, detail: IntentDetail, product: Option<&str>) -> Intent {
        Intent {
            intent,
            detail,
            entities: EntitySet {
                product: product.map(str::to_string),
                ..EntitySet::default()
            },
            assumption: None,
        }
    }

    #[test]
    fn test_request_kind_mapping() {
        assert_eq!(
            intent(IntentKind::Sales, IntentDetail::TopProducts, None).request_kind(),
            Some(RequestKind::TopProducts)
        );
        assert_eq!(
            intent(IntentKind::Sales, IntentDetail::ProductPerformance, Some("mug"))
                .request_kind(),
            Some(RequestKind::ProductPerformance)
        );
        assert_eq!(
            intent(IntentKind::Sales, IntentDetail::ProductPerformance, None).request_kind(),
            None
        );
        assert_eq!(
            intent(IntentKind::Inventory, IntentDetail::InventoryProjection, None)
                .request_kind(),
            Some(RequestKind::InventoryProjection)
        );
        assert_eq!(
            intent(IntentKind::Customers, IntentDetail::RepeatCustomers, None).request_kind(),
            Some(RequestKind::RepeatCustomers)
        );
        assert_eq!(
            Intent::unknown(EntitySet::default()).request_kind(),
            None
        );
    }

    #[test]
    fn test_intent_serializes_with_lowercase_tags() {
        let value = serde_json::to_value(intent(
            IntentKind::Inventory,
            IntentDetail::InventoryProjection,
            None,
        ))
        .unwrap();
        assert_eq!(value["intent"], "inventory");
        assert_eq!(value["detail"], "inventory_projection");
        assert_eq!(value["entities"]["period_days"], 30);
        assert!(value.get("assumption").is_none());
    }

    #[test]
    fn test_pattern_param_quotes_are_doubled() {
        let param = QueryParam::Pattern("%o'brien%".to_string());
        assert_eq!(param.render(), "'%o''brien%'");
        let days = QueryParam::RelativeDays(NonZeroU32::new(7).unwrap());
        assert_eq!(days.render(), "-7d");
    }

    #[test]
    fn test_raw_data_keys() {
        let raw = RawData::Sales30d {
            items: vec![],
            period_days: 30,
        };
        assert_eq!(raw.key(), "sales_30d");
        assert_eq!(raw.period_days(), Some(30));
        let value = serde_json::to_value(&raw).unwrap();
        assert!(value.get("sales_30d").is_some());
        assert!(RawData::Empty.is_empty());
        assert_eq!(RawData::Empty.period_days(), None);
    }

    #[test]
    fn test_validation_failure_messages() {
        let failure = ValidationFailure::UnbalancedParentheses { open: 2, close: 1 };
        assert_eq!(failure.to_string(), "unbalanced parentheses (2 open, 1 close)");
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["reason"], "unbalanced_parentheses");
        assert_eq!(value["open"], 2);
    }

    #[test]
    fn test_fallback_query() {
        let query = Query::fallback();
        assert!(query.is_fallback());
        assert_eq!(query.text(), FALLBACK_QUERY);
        assert!(!Query::raw("SELECT 1 FROM orders").is_fallback());
    }
}
