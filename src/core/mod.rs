pub mod classifier;
pub mod explainer;
pub mod fetcher;
pub mod generator;
pub mod pipeline;
pub mod validator;

pub use crate::domain::model::{AskRequest, AskResponse, Explanation, Intent, Query, RawData};
pub use crate::domain::ports::{AnalyticsSource, SettingsProvider};
pub use crate::utils::error::Result;
