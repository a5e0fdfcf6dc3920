use crate::domain::model::{
    Confidence, DebugInfo, ExplainerSettings, Explanation, Intent, IntentKind, ProductPerformance,
    ProductSales, RawData, RepeatCustomer, Sales30d,
};
use serde::Serialize;
use serde_json::json;

pub const FALLBACK_ANSWER: &str = "Sorry — I couldn't find enough data to answer that. \
     Try a more specific question like 'top 5 products last 7 days' or \
     'how much to reorder for next 7 days'.";

const MAX_CUSTOMER_IDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderRecommendation {
    pub product_title: String,
    pub avg_daily: f64,
    pub needed_for_lead_time: f64,
    pub recommend_reorder_qty: u64,
}

/// Reorder quantity for one product: the average daily rate over the data
/// window, projected over the lead time, plus safety stock. The reported
/// `avg_daily` is rounded to cents; the projection uses the exact rate.
pub fn recommend_reorder(
    product_title: &str,
    total_sold: u64,
    period_days: u32,
    settings: &ExplainerSettings,
) -> ReorderRecommendation {
    let avg_daily = total_sold as f64 / f64::from(period_days.max(1));
    let needed = avg_daily * f64::from(settings.lead_time_days);
    let reorder = (needed * (1.0 + settings.safety_stock_ratio)).round();

    ReorderRecommendation {
        product_title: product_title.to_string(),
        avg_daily: (avg_daily * 100.0).round() / 100.0,
        needed_for_lead_time: needed,
        recommend_reorder_qty: reorder.max(0.0) as u64,
    }
}

/// Turns fetched data into an answer. Pure: identical inputs produce
/// identical explanations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Explainer {
    settings: ExplainerSettings,
}

impl Explainer {
    pub fn new(settings: ExplainerSettings) -> Self {
        Self { settings }
    }

    pub fn explain(&self, intent: &Intent, raw: &RawData, question: &str) -> Explanation {
        tracing::debug!(
            "Explaining {:?} with {} data for: {}",
            intent.intent,
            raw.key(),
            question
        );

        match (intent.intent, raw) {
            (IntentKind::Sales, RawData::TopProducts { items, period_days }) => {
                top_products(items, *period_days)
            }
            (IntentKind::Sales, RawData::ProductPerformance(record)) => {
                product_performance(record)
            }
            (IntentKind::Inventory, RawData::Sales30d { items, period_days }) => {
                self.inventory(intent, items, *period_days)
            }
            (IntentKind::Customers, RawData::RepeatCustomers { items, period_days }) => {
                repeat_customers(items, *period_days)
            }
            _ => fallback(raw),
        }
    }

    fn inventory(&self, intent: &Intent, items: &[Sales30d], period_days: u32) -> Explanation {
        let recommendations: Vec<ReorderRecommendation> = items
            .iter()
            .map(|p| {
                recommend_reorder(&p.product_title, p.total_sold_30d, period_days, &self.settings)
            })
            .collect();

        let lines: Vec<String> = recommendations
            .iter()
            .map(|r| {
                format!(
                    // `{:?}` keeps the shortest form with a trailing ".0", e.g. "10.0", "8.33"
                    "{}: avg {:?} /day → reorder {} units",
                    r.product_title, r.avg_daily, r.recommend_reorder_qty
                )
            })
            .collect();

        let answer = format!(
            "Inventory recommendation (next {} days with {}% safety):\n{}",
            self.settings.lead_time_days,
            (self.settings.safety_stock_ratio * 100.0).round(),
            lines.join("\n")
        );

        let mut debug = DebugInfo::new();
        debug.insert(
            "method".to_string(),
            json!(format!(
                "avg{}d*{} +{}%",
                period_days,
                self.settings.lead_time_days,
                (self.settings.safety_stock_ratio * 100.0).round()
            )),
        );
        debug.insert("recommendations".to_string(), json!(recommendations));
        if let Some(assumption) = &intent.assumption {
            debug.insert("assumption".to_string(), json!(assumption));
        }

        Explanation {
            answer,
            confidence: Confidence::Medium,
            debug,
        }
    }
}

fn top_products(items: &[ProductSales], period_days: u32) -> Explanation {
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} — {} units", i + 1, p.product_title, p.total_sold))
        .collect();

    Explanation {
        answer: format!(
            "Top selling products in the last {} days:\n{}",
            period_days,
            lines.join("\n")
        ),
        confidence: Confidence::High,
        debug: period_debug(period_days),
    }
}

fn product_performance(record: &ProductPerformance) -> Explanation {
    Explanation {
        answer: format!(
            "{} sold {} units in the last {} days.",
            record.product_title, record.total_sold, record.period_days
        ),
        confidence: Confidence::High,
        debug: period_debug(record.period_days),
    }
}

fn repeat_customers(items: &[RepeatCustomer], period_days: u32) -> Explanation {
    let ids: Vec<String> = items
        .iter()
        .take(MAX_CUSTOMER_IDS)
        .map(|c| c.customer_id.to_string())
        .collect();

    Explanation {
        answer: format!(
            "Found {} customers with repeat orders in the last {} days. Example IDs: {}",
            items.len(),
            period_days,
            ids.join(", ")
        ),
        confidence: Confidence::High,
        debug: period_debug(period_days),
    }
}

fn fallback(raw: &RawData) -> Explanation {
    let mut debug = DebugInfo::new();
    if !raw.is_empty() {
        // data arrived in a shape this intent has no rendering for
        debug.insert("unsupported_shape".to_string(), json!(raw.key()));
    }

    Explanation {
        answer: FALLBACK_ANSWER.to_string(),
        confidence: Confidence::Low,
        debug,
    }
}

fn period_debug(period_days: u32) -> DebugInfo {
    let mut debug = DebugInfo::new();
    debug.insert("period_days".to_string(), json!(period_days));
    debug
}
