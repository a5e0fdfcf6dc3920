use crate::domain::model::{Intent, Query, QueryParam, RequestKind};
use regex::Regex;
use std::sync::OnceLock;

pub const SINCE_PARAM: &str = "since";
pub const PRODUCT_PARAM: &str = "product";

const PRODUCT_PERFORMANCE_QUERY: &str = "SELECT product_title, SUM(quantity) AS total_sold \
     FROM orders \
     WHERE created_at >= :since AND product_title LIKE :product \
     GROUP BY product_title";

const TOP_PRODUCTS_QUERY: &str = "SELECT product_title, SUM(quantity) AS total_sold \
     FROM orders \
     WHERE created_at >= :since \
     GROUP BY product_title \
     ORDER BY total_sold DESC \
     LIMIT 5";

const INVENTORY_QUERY: &str = "SELECT product_id, product_title, SUM(quantity) AS total_sold_period \
     FROM orders \
     WHERE created_at >= :since ";

const INVENTORY_PRODUCT_FILTER: &str = "AND product_title LIKE :product ";

const INVENTORY_GROUP_BY: &str = "GROUP BY product_id, product_title";

const REPEAT_CUSTOMERS_QUERY: &str = "SELECT customer_id, COUNT(order_id) AS orders_count \
     FROM orders \
     WHERE created_at >= :since \
     GROUP BY customer_id \
     HAVING orders_count > 1";

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"))
}

/// Builds the query for an intent. Entities are bound as parameters; the
/// query text only ever contains one of the fixed templates.
pub fn generate(intent: &Intent, question: &str) -> Query {
    let Some(kind) = intent.request_kind() else {
        tracing::debug!(
            "No query template for intent {:?}/{:?}: {}",
            intent.intent,
            intent.detail,
            question
        );
        return Query::fallback();
    };

    let since = QueryParam::RelativeDays(intent.entities.period_days);
    let product = intent
        .entities
        .product
        .as_deref()
        .map(|name| QueryParam::Pattern(format!("%{}%", name)));

    let query = match (kind, product) {
        (RequestKind::ProductPerformance, Some(product)) => {
            Query::new(kind, PRODUCT_PERFORMANCE_QUERY)
                .bind(SINCE_PARAM, since)
                .bind(PRODUCT_PARAM, product)
        }
        (RequestKind::ProductPerformance, None) => return Query::fallback(),
        (RequestKind::TopProducts, _) => {
            Query::new(kind, TOP_PRODUCTS_QUERY).bind(SINCE_PARAM, since)
        }
        (RequestKind::InventoryProjection, Some(product)) => Query::new(
            kind,
            format!("{INVENTORY_QUERY}{INVENTORY_PRODUCT_FILTER}{INVENTORY_GROUP_BY}"),
        )
        .bind(SINCE_PARAM, since)
        .bind(PRODUCT_PARAM, product),
        (RequestKind::InventoryProjection, None) => {
            Query::new(kind, format!("{INVENTORY_QUERY}{INVENTORY_GROUP_BY}"))
                .bind(SINCE_PARAM, since)
        }
        (RequestKind::RepeatCustomers, _) => {
            Query::new(kind, REPEAT_CUSTOMERS_QUERY).bind(SINCE_PARAM, since)
        }
    };

    tracing::debug!("Generated {} query: {}", kind, query.text());
    query
}

/// Placeholder names referenced by `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    placeholder_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Display form of a query with bound values substituted. Only meant for
/// logs and debug output; unbound placeholders are left as they are.
pub fn render(query: &Query) -> String {
    placeholder_regex()
        .replace_all(query.text(), |caps: &regex::Captures| {
            match query.param(&caps[1]) {
                Some(param) => param.render(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::classify;
    use crate::domain::model::{EntitySet, IntentDetail, IntentKind, FALLBACK_QUERY};
    use std::num::NonZeroU32;

    #[test]
    fn test_top_products_query() {
        let q = "What are the top selling products this week?";
        let query = generate(&classify(q), q);

        assert_eq!(query.kind(), Some(RequestKind::TopProducts));
        assert!(query.text().contains("ORDER BY total_sold DESC"));
        assert!(query.text().contains("LIMIT 5"));
        assert!(query.text().contains("SUM(quantity) AS total_sold"));
        assert_eq!(
            query.param(SINCE_PARAM),
            Some(&QueryParam::RelativeDays(NonZeroU32::new(30).unwrap()))
        );
        assert_eq!(query.param(PRODUCT_PARAM), None);
    }

    #[test]
    fn test_product_performance_binds_product() {
        let q = "How many units of product blue shirt sold in the last 14 days?";
        let query = generate(&classify(q), q);

        assert_eq!(query.kind(), Some(RequestKind::ProductPerformance));
        assert!(query.text().contains("LIKE :product"));
        assert!(!query.text().contains("LIMIT"));
        assert!(!query.text().contains("blue shirt"));
        assert_eq!(
            query.param(PRODUCT_PARAM),
            Some(&QueryParam::Pattern("%blue shirt sold%".to_string()))
        );
        assert_eq!(
            render(&query),
            "SELECT product_title, SUM(quantity) AS total_sold FROM orders \
             WHERE created_at >= -14d AND product_title LIKE '%blue shirt sold%' \
             GROUP BY product_title"
        );
    }

    #[test]
    fn test_inventory_query_with_and_without_product() {
        let q = "How much should I reorder for next 7 days?";
        let query = generate(&classify(q), q);
        assert_eq!(query.kind(), Some(RequestKind::InventoryProjection));
        assert!(query.text().contains("total_sold_period"));
        assert!(query.text().ends_with("GROUP BY product_id, product_title"));
        assert!(!query.text().contains("LIKE"));
        assert_eq!(render(&query).matches("-7d").count(), 1);

        let q = "stock needed for product latte mug in 10 days";
        let query = generate(&classify(q), q);
        assert!(query.text().contains("AND product_title LIKE :product GROUP BY"));
        assert_eq!(
            query.param(PRODUCT_PARAM),
            Some(&QueryParam::Pattern("%latte mug%".to_string()))
        );
    }

    #[test]
    fn test_repeat_customers_query() {
        let q = "Which customers are loyal?";
        let query = generate(&classify(q), q);
        assert_eq!(query.kind(), Some(RequestKind::RepeatCustomers));
        assert!(query.text().contains("HAVING orders_count > 1"));
    }

    #[test]
    fn test_unknown_intent_yields_fallback() {
        let q = "tell me a joke";
        let query = generate(&classify(q), q);
        assert!(query.is_fallback());
        assert_eq!(query.text(), FALLBACK_QUERY);

        // product performance without a product has no template
        let intent = Intent {
            intent: IntentKind::Sales,
            detail: IntentDetail::ProductPerformance,
            entities: EntitySet::default(),
            assumption: None,
        };
        assert!(generate(&intent, "").is_fallback());
    }

    #[test]
    fn test_hostile_product_name_stays_in_params() {
        let intent = Intent {
            intent: IntentKind::Sales,
            detail: IntentDetail::ProductPerformance,
            entities: EntitySet {
                product: Some("x'; drop table orders; --".to_string()),
                ..EntitySet::default()
            },
            assumption: None,
        };
        let query = generate(&intent, "");
        assert!(!query.text().to_uppercase().contains("DROP"));
        assert!(render(&query).contains("'%x''; drop table orders; --%'"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("WHERE a >= :since AND b LIKE :product"),
            vec!["since", "product"]
        );
        assert!(placeholders("SELECT 1 FROM orders").is_empty());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let q = "top 5 products last 7 days";
        let intent = classify(q);
        assert_eq!(generate(&intent, q), generate(&intent, q));
    }
}
