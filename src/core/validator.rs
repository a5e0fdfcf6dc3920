use crate::core::generator::placeholders;
use crate::domain::model::{Query, ValidationFailure};
use regex::Regex;
use std::sync::OnceLock;

pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DELETE", "DROP", "UPDATE", "INSERT", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
];

fn forbidden_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        let pattern = format!(r"\b({})\b", FORBIDDEN_KEYWORDS.join("|"));
        Regex::new(&pattern).expect("Invalid regex")
    })
}

/// Safety and shape checks run on every query before it is fetched.
pub fn validate(query: &Query) -> Result<(), ValidationFailure> {
    let upper = query.text().trim().to_uppercase();

    if !upper.starts_with("SELECT") {
        return Err(ValidationFailure::MissingSelect);
    }

    if !upper.contains(" FROM ") {
        return Err(ValidationFailure::MissingFrom);
    }

    if let Some(found) = forbidden_regex().find(&upper) {
        return Err(ValidationFailure::ForbiddenKeyword {
            keyword: found.as_str().to_string(),
        });
    }

    let open = upper.matches('(').count();
    let close = upper.matches(')').count();
    if open != close {
        return Err(ValidationFailure::UnbalancedParentheses { open, close });
    }

    // hand-written queries carry no bindings, so a ':' in them is literal text
    if query.kind().is_none() {
        return Ok(());
    }

    if let Some(name) = placeholders(query.text())
        .into_iter()
        .find(|name| query.param(name).is_none())
    {
        return Err(ValidationFailure::UnboundParameter {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Boolean form of [`validate`]; failures are reported through the log.
pub fn is_valid(query: &Query) -> bool {
    match validate(query) {
        Ok(()) => true,
        Err(failure) => {
            tracing::warn!("Query validation failed: {}", failure);
            false
        }
    }
}
