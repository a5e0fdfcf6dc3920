use crate::core::classifier::Classifier;
use crate::core::explainer::Explainer;
use crate::core::fetcher::{FetchRoute, ResilientSource};
use crate::core::generator;
use crate::core::validator;
use crate::domain::model::{AskRequest, AskResponse, Explanation, Query, RawData};
use crate::domain::ports::{AnalyticsSource, SettingsProvider};
use crate::utils::error::{AgentError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde_json::json;

impl Validate for AskRequest {
    fn validate(&self) -> Result<()> {
        for (field, value) in [("store_id", &self.store_id), ("question", &self.question)] {
            validate_non_empty_string(field, value).map_err(|_| AgentError::InvalidRequest {
                field: field.to_string(),
                reason: "is required and cannot be blank".to_string(),
            })?;
        }
        Ok(())
    }
}

/// Runs a question through classify → generate → validate → fetch → explain.
pub struct AskPipeline<S: AnalyticsSource> {
    classifier: Classifier,
    explainer: Explainer,
    source: S,
}

impl<S: AnalyticsSource> AskPipeline<S> {
    pub fn new(source: S) -> Self {
        Self::with_stages(Classifier::default(), Explainer::default(), source)
    }

    pub fn with_stages(classifier: Classifier, explainer: Explainer, source: S) -> Self {
        Self {
            classifier,
            explainer,
            source,
        }
    }

    /// Builds a pipeline whose source is wrapped with the configured timeout
    /// and retry policy.
    pub fn from_settings<P: SettingsProvider>(
        source: S,
        settings: &P,
    ) -> AskPipeline<ResilientSource<S>> {
        AskPipeline::with_stages(
            Classifier::with_default_period(settings.default_period_days()),
            Explainer::new(settings.explainer_settings()),
            ResilientSource::new(source, settings.fetch_timeout(), settings.retry_attempts()),
        )
    }

    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        request.validate()?;

        tracing::info!("Answering question for store {}", request.store_id);

        // 1. 意圖分類
        let intent = self.classifier.classify(&request.question);
        tracing::debug!(
            "Classified as {:?}/{:?} ({} days)",
            intent.intent,
            intent.detail,
            intent.entities.period_days
        );

        // 2. 產生查詢並驗證
        let query = generator::generate(&intent, &request.question);

        let raw = if query.is_fallback() {
            tracing::info!("No query template for this question, skipping fetch");
            RawData::Empty
        } else {
            if let Err(reason) = validator::validate(&query) {
                tracing::warn!("Rejected generated query ({}): {}", reason, query.text());
                return Err(AgentError::InvalidQuery { reason });
            }

            // 3. 取得資料
            let raw = self.source.fetch(&query, &request.store_id).await?;
            tracing::debug!("Fetched {} data", raw.key());
            raw
        };

        // 4. 產生說明
        let explanation = self.explainer.explain(&intent, &raw, &request.question);
        tracing::info!("Answered with {} confidence", explanation.confidence);

        let Explanation {
            answer,
            confidence,
            mut debug,
        } = explanation;

        debug.insert("query".to_string(), json!(query.text()));
        debug.insert("query_params".to_string(), serde_json::to_value(query.params())?);
        debug.insert("query_rendered".to_string(), json!(generator::render(&query)));
        debug.insert("intent".to_string(), serde_json::to_value(&intent)?);
        debug.insert(
            "request_kind".to_string(),
            json!(query.kind().map(|k| k.as_str())),
        );
        debug.insert("data_key".to_string(), json!(raw.key()));
        debug.insert("data_period_days".to_string(), json!(raw.period_days()));

        Ok(AskResponse {
            answer,
            confidence,
            debug,
        })
    }

    /// Validates and fetches a hand-written query, bypassing classification.
    pub async fn run_query(&self, query_text: &str, store_id: &str) -> Result<RawData> {
        let query = Query::raw(query_text);
        validator::validate(&query).map_err(|reason| AgentError::InvalidQuery { reason })?;

        tracing::debug!("Raw query routed to {:?}", FetchRoute::resolve(&query));
        self.source.fetch(&query, store_id).await
    }
}
