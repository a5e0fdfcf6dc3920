use crate::domain::model::{ExplainerSettings, Query, RawData};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::num::NonZeroU32;
use std::time::Duration;

/// Where aggregated analytics come from. Implementations must be idempotent
/// so callers can retry a fetch.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn fetch(&self, query: &Query, store_id: &str) -> Result<RawData>;
}

pub trait SettingsProvider: Send + Sync {
    fn default_period_days(&self) -> NonZeroU32;
    fn explainer_settings(&self) -> ExplainerSettings;
    fn fetch_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
}
