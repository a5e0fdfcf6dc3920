use crate::domain::model::{
    PeriodSales, ProductPerformance, ProductSales, Query, RawData, RepeatCustomer, RequestKind,
    Sales30d,
};
use crate::domain::ports::AnalyticsSource;
use crate::utils::error::{AgentError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Result shapes the stub backend knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRoute {
    ProductPerformance,
    TopProducts,
    InventoryPeriod,
    InventoryLegacy30d,
    RepeatCustomers,
}

pub struct RouteRule {
    pub route: FetchRoute,
    pub requires: &'static [&'static str],
    pub excludes: &'static [&'static str],
}

impl RouteRule {
    fn matches(&self, text: &str) -> bool {
        self.requires.iter().all(|s| text.contains(s))
            && !self.excludes.iter().any(|s| text.contains(s))
    }
}

/// Routing for queries without a request kind, evaluated top to bottom.
pub const TEXT_ROUTES: &[RouteRule] = &[
    RouteRule {
        route: FetchRoute::ProductPerformance,
        requires: &["LIKE", "total_sold"],
        excludes: &["LIMIT"],
    },
    RouteRule {
        route: FetchRoute::TopProducts,
        requires: &["SUM(quantity) AS total_sold", "LIMIT 5"],
        excludes: &[],
    },
    RouteRule {
        route: FetchRoute::InventoryPeriod,
        requires: &["total_sold_period"],
        excludes: &[],
    },
    RouteRule {
        route: FetchRoute::InventoryLegacy30d,
        requires: &["total_sold_30d"],
        excludes: &[],
    },
    RouteRule {
        route: FetchRoute::RepeatCustomers,
        requires: &["orders_count > 1"],
        excludes: &[],
    },
];

impl FetchRoute {
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::ProductPerformance => FetchRoute::ProductPerformance,
            RequestKind::TopProducts => FetchRoute::TopProducts,
            // the explainer renders the 30-day shape; see DESIGN.md
            RequestKind::InventoryProjection => FetchRoute::InventoryLegacy30d,
            RequestKind::RepeatCustomers => FetchRoute::RepeatCustomers,
        }
    }

    pub fn from_query_text(text: &str) -> Option<Self> {
        TEXT_ROUTES
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.route)
    }

    pub fn resolve(query: &Query) -> Option<Self> {
        match query.kind() {
            Some(kind) => Some(Self::for_kind(kind)),
            None => Self::from_query_text(query.text()),
        }
    }

    pub fn sample_data(self) -> RawData {
        match self {
            FetchRoute::ProductPerformance => RawData::ProductPerformance(ProductPerformance {
                product_title: "Product X (Mocked)".to_string(),
                total_sold: 45,
                period_days: 30,
            }),
            FetchRoute::TopProducts => RawData::TopProducts {
                items: [
                    ("Classic Latte Mug", 120),
                    ("Retro Coffee Beans 1kg", 95),
                    ("Biscotti Pack", 60),
                    ("Espresso Shot Glass", 42),
                    ("Reusable Straw Set", 30),
                ]
                .into_iter()
                .map(|(title, total_sold)| ProductSales {
                    product_title: title.to_string(),
                    total_sold,
                })
                .collect(),
                period_days: 7,
            },
            FetchRoute::InventoryPeriod => RawData::SalesPeriod {
                items: catalog()
                    .zip([150, 120, 90])
                    .map(|((product_id, title), total_sold_period)| PeriodSales {
                        product_id,
                        product_title: title.to_string(),
                        total_sold_period,
                    })
                    .collect(),
                period_days: 30,
            },
            FetchRoute::InventoryLegacy30d => RawData::Sales30d {
                items: catalog()
                    .zip([300, 240, 90])
                    .map(|((product_id, title), total_sold_30d)| Sales30d {
                        product_id,
                        product_title: title.to_string(),
                        total_sold_30d,
                    })
                    .collect(),
                period_days: 30,
            },
            FetchRoute::RepeatCustomers => RawData::RepeatCustomers {
                items: [(201, 4), (202, 3), (203, 2)]
                    .into_iter()
                    .map(|(customer_id, orders_count)| RepeatCustomer {
                        customer_id,
                        orders_count,
                    })
                    .collect(),
                period_days: 90,
            },
        }
    }
}

fn catalog() -> impl Iterator<Item = (u64, &'static str)> {
    [
        (101, "Classic Latte Mug"),
        (102, "Retro Coffee Beans 1kg"),
        (103, "Biscotti Pack"),
    ]
    .into_iter()
}

/// Deterministic stand-in for the store analytics backend. A real
/// implementation would execute the query remotely.
#[derive(Debug, Clone, Default)]
pub struct StubAnalytics;

impl StubAnalytics {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalyticsSource for StubAnalytics {
    async fn fetch(&self, query: &Query, store_id: &str) -> Result<RawData> {
        let route = FetchRoute::resolve(query);
        tracing::debug!("Stub fetch for store {}: route {:?}", store_id, route);

        Ok(route.map(FetchRoute::sample_data).unwrap_or(RawData::Empty))
    }
}

/// Adds a per-attempt timeout and bounded retries to any source.
pub struct ResilientSource<S: AnalyticsSource> {
    inner: S,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl<S: AnalyticsSource> ResilientSource<S> {
    pub fn new(inner: S, timeout: Duration, retry_attempts: u32) -> Self {
        Self {
            inner,
            timeout,
            retry_attempts,
            retry_delay: Duration::from_millis(50),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn is_retryable(err: &AgentError) -> bool {
        matches!(
            err,
            AgentError::FetchTimeout { .. } | AgentError::FetchError { .. }
        )
    }
}

#[async_trait]
impl<S: AnalyticsSource> AnalyticsSource for ResilientSource<S> {
    async fn fetch(&self, query: &Query, store_id: &str) -> Result<RawData> {
        let max_attempts = self.retry_attempts.saturating_add(1);
        let timeout_ms = self.timeout.as_millis() as u64;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match tokio::time::timeout(self.timeout, self.inner.fetch(query, store_id))
                .await
            {
                Ok(Ok(data)) => return Ok(data),
                Ok(Err(err)) => err,
                Err(_) => AgentError::FetchTimeout {
                    attempts: attempt,
                    timeout_ms,
                },
            };

            if !Self::is_retryable(&err) {
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::error!("Fetch failed after {} attempt(s): {}", attempt, err);
                return Err(err);
            }

            tracing::warn!(
                "Fetch attempt {}/{} failed: {}, retrying in {:?}",
                attempt,
                max_attempts,
                err,
                self.retry_delay
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}
