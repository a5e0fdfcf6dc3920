pub mod config;
pub mod core;
pub mod domain;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};
pub use crate::config::AppConfig;

pub use crate::core::classifier::{classify, Classifier};
pub use crate::core::explainer::Explainer;
pub use crate::core::fetcher::{FetchRoute, ResilientSource, StubAnalytics};
pub use crate::core::generator::generate;
pub use crate::core::pipeline::AskPipeline;
pub use crate::core::validator::{is_valid, validate};
pub use crate::domain::model::{
    AskRequest, AskResponse, Confidence, EntitySet, Explanation, Intent, IntentDetail, IntentKind,
    Query, QueryParam, RawData, RequestKind, ValidationFailure,
};
pub use crate::domain::ports::{AnalyticsSource, SettingsProvider};
pub use crate::utils::error::{AgentError, Result};
