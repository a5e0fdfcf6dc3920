use crate::domain::model::{
    EntitySet, Intent, IntentDetail, IntentKind, DEFAULT_PERIOD_DAYS,
};
use regex::Regex;
use std::num::NonZeroU32;
use std::sync::OnceLock;

/// Phrase → period length, checked in order when no explicit "N days" is given.
pub const PERIOD_PHRASES: &[(&[&str], u32)] = &[
    (&["next month", "last month"], 30),
    (&["next week", "last week"], 7),
    (&["last 3 months", "90 days"], 90),
];

/// A product name ends at the earliest of these.
pub const PRODUCT_STOP_PHRASES: &[&str] =
    &[" will", " last", " in", " likely", " go", " do", "?"];

pub const BASED_ON_PAST_SALES: &str = "based_on_past_sales";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    InventoryProjection,
    /// Product performance when a product was extracted, top products otherwise.
    Sales,
    RepeatCustomers,
    Forecast,
}

pub struct IntentRule {
    pub keywords: &'static [&'static str],
    pub outcome: RuleOutcome,
}

/// Evaluated top to bottom; the first rule with a matching keyword wins.
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        keywords: &[
            "inventory",
            "stock",
            "out of stock",
            "reorder",
            "reorder level",
            "need next",
        ],
        outcome: RuleOutcome::InventoryProjection,
    },
    IntentRule {
        keywords: &[
            "sell",
            "top selling",
            "best sellers",
            "top 5",
            "sales",
            "how many units",
        ],
        outcome: RuleOutcome::Sales,
    },
    IntentRule {
        keywords: &[
            "customer",
            "repeat",
            "repeat orders",
            "returning customers",
            "loyal",
        ],
        outcome: RuleOutcome::RepeatCustomers,
    },
    IntentRule {
        keywords: &["next month", "future", "forecast", "predict"],
        outcome: RuleOutcome::Forecast,
    },
];

fn days_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(\d+)\s*days?").expect("Invalid regex"))
}

fn product_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"product\s+([a-z0-9\s]+)").expect("Invalid regex"))
}

/// Keyword heuristic classifier. Pure: the same text always yields the same
/// intent.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    default_period_days: NonZeroU32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            default_period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

impl Classifier {
    pub fn with_default_period(default_period_days: NonZeroU32) -> Self {
        Self {
            default_period_days,
        }
    }

    pub fn classify(&self, question: &str) -> Intent {
        let q = question.to_lowercase();

        let entities = EntitySet {
            product: extract_product(&q),
            period_days: self.extract_period(&q),
        };

        let Some(rule) = INTENT_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| q.contains(k)))
        else {
            tracing::debug!("No intent rule matched, falling back to unknown");
            return Intent::unknown(entities);
        };

        tracing::debug!("Intent rule matched: {:?}", rule.outcome);

        match rule.outcome {
            RuleOutcome::InventoryProjection => Intent {
                intent: IntentKind::Inventory,
                detail: IntentDetail::InventoryProjection,
                entities,
                assumption: None,
            },
            RuleOutcome::Sales => {
                let detail = if entities.product.is_some() {
                    IntentDetail::ProductPerformance
                } else {
                    IntentDetail::TopProducts
                };
                Intent {
                    intent: IntentKind::Sales,
                    detail,
                    entities,
                    assumption: None,
                }
            }
            RuleOutcome::RepeatCustomers => Intent {
                intent: IntentKind::Customers,
                detail: IntentDetail::RepeatCustomers,
                entities,
                assumption: None,
            },
            RuleOutcome::Forecast => Intent {
                intent: IntentKind::Inventory,
                detail: IntentDetail::InventoryProjection,
                entities,
                assumption: Some(BASED_ON_PAST_SALES.to_string()),
            },
        }
    }

    fn extract_period(&self, q: &str) -> NonZeroU32 {
        // 明確的 "N days" 優先；0 或溢位則忽略
        if let Some(days) = days_regex()
            .captures_iter(q)
            .find_map(|caps| caps[1].parse::<u32>().ok().and_then(NonZeroU32::new))
        {
            return days;
        }

        PERIOD_PHRASES
            .iter()
            .find(|(phrases, _)| phrases.iter().any(|p| q.contains(p)))
            .and_then(|(_, days)| NonZeroU32::new(*days))
            .unwrap_or(self.default_period_days)
    }
}

/// Classifies with the default 30-day period.
pub fn classify(question: &str) -> Intent {
    Classifier::default().classify(question)
}

fn extract_product(q: &str) -> Option<String> {
    let caps = product_regex().captures(q)?;
    let raw = caps.get(1)?.as_str();

    let end = PRODUCT_STOP_PHRASES
        .iter()
        .filter_map(|stop| raw.find(stop))
        .min()
        .unwrap_or(raw.len());

    let name = raw[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_days_win() {
        let intent = classify("What were my sales in the last 45 days?");
        assert_eq!(intent.entities.period_days.get(), 45);

        // explicit number beats a phrase appearing earlier
        let intent = classify("last month vs the last 12 days, how many units sold?");
        assert_eq!(intent.entities.period_days.get(), 12);

        let intent = classify("stock needed for 1 day");
        assert_eq!(intent.entities.period_days.get(), 1);
    }

    #[test]
    fn test_period_phrases() {
        assert_eq!(classify("sales last week").entities.period_days.get(), 7);
        assert_eq!(classify("sales next month").entities.period_days.get(), 30);
        assert_eq!(classify("sales over the last 3 months").entities.period_days.get(), 90);
        assert_eq!(classify("top sellers").entities.period_days.get(), 30);
    }

    #[test]
    fn test_zero_days_keeps_period_positive() {
        let intent = classify("sales in the last 0 days");
        assert_eq!(intent.entities.period_days.get(), 30);

        let intent = classify("reorder for 99999999999 days after last week");
        assert_eq!(intent.entities.period_days.get(), 7);
    }

    #[test]
    fn test_first_usable_day_count_wins() {
        let intent = classify("sales 0 days vs last 12 days");
        assert_eq!(intent.entities.period_days.get(), 12);

        let intent = classify("sales 99999999999 days or 45 days, last week");
        assert_eq!(intent.entities.period_days.get(), 45);
    }

    #[test]
    fn test_configured_default_period() {
        let classifier = Classifier::with_default_period(NonZeroU32::new(14).unwrap());
        assert_eq!(classifier.classify("best sellers").entities.period_days.get(), 14);
        assert_eq!(classifier.classify("best sellers last week").entities.period_days.get(), 7);
    }

    #[test]
    fn test_product_extraction_stops_at_stop_phrase() {
        let intent = classify("How many units of Product Blue Shirt will I sell next month?");
        assert_eq!(intent.entities.product.as_deref(), Some("blue shirt"));

        let intent = classify("sales for product classic mug in march");
        assert_eq!(intent.entities.product.as_deref(), Some("classic mug"));

        let intent = classify("What are the top selling products this week?");
        assert_eq!(intent.entities.product, None);
    }

    #[test]
    fn test_blank_product_capture_is_none() {
        let intent = classify("sales of product  ?");
        assert_eq!(intent.entities.product, None);
        assert_eq!(intent.detail, IntentDetail::TopProducts);
    }

    #[test]
    fn test_inventory_keywords() {
        for q in [
            "Which products are low in stock?",
            "How much should I reorder for next 7 days?",
            "Show inventory levels",
            "What sales do I need to restock? stock please",
        ] {
            let intent = classify(q);
            assert_eq!(intent.intent, IntentKind::Inventory, "question: {}", q);
            assert_eq!(intent.detail, IntentDetail::InventoryProjection);
            assert_eq!(intent.assumption, None);
        }
    }

    #[test]
    fn test_sales_top_products() {
        for q in ["top 5 products last 7 days", "Who are my best sellers?"] {
            let intent = classify(q);
            assert_eq!(intent.intent, IntentKind::Sales, "question: {}", q);
            assert_eq!(intent.detail, IntentDetail::TopProducts);
        }
    }

    #[test]
    fn test_sales_product_performance() {
        let intent = classify("How many units of product retro beans sold last week?");
        assert_eq!(intent.intent, IntentKind::Sales);
        assert_eq!(intent.detail, IntentDetail::ProductPerformance);
        assert_eq!(intent.entities.product.as_deref(), Some("retro beans sold"));
        assert_eq!(intent.entities.period_days.get(), 7);
    }

    #[test]
    fn test_customers() {
        let intent = classify("Which customers placed repeat orders in the last 90 days?");
        assert_eq!(intent.intent, IntentKind::Customers);
        assert_eq!(intent.detail, IntentDetail::RepeatCustomers);
        assert_eq!(intent.entities.period_days.get(), 90);
    }

    #[test]
    fn test_forecast_adds_assumption() {
        let intent = classify("Can you predict demand for next month?");
        assert_eq!(intent.intent, IntentKind::Inventory);
        assert_eq!(intent.detail, IntentDetail::InventoryProjection);
        assert_eq!(intent.assumption.as_deref(), Some(BASED_ON_PAST_SALES));
    }

    #[test]
    fn test_unknown() {
        let intent = classify("What's the weather like?");
        assert_eq!(intent.intent, IntentKind::Unknown);
        assert_eq!(intent.detail, IntentDetail::Unknown);
        assert_eq!(intent.entities.period_days.get(), 30);
    }

    #[test]
    fn test_rule_order_inventory_beats_sales() {
        // both "stock" and "sales" appear; the inventory rule is listed first
        let intent = classify("sales vs stock for next week");
        assert_eq!(intent.intent, IntentKind::Inventory);
        assert_eq!(INTENT_RULES[0].outcome, RuleOutcome::InventoryProjection);
        assert_eq!(INTENT_RULES[3].outcome, RuleOutcome::Forecast);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let q = "How many units of Product X will I sell next month?";
        assert_eq!(classify(q), classify(q));
    }
}
